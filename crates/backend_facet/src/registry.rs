//! The explicit facet registration table built at startup.
//!
//! Each facet type contributes a set of named methods through a
//! [`FacetBuilder`]. Resolution looks a `(facet, method)` pair up in the
//! table and hands back a [`FacetHandle`] the dispatcher can invoke.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::args::FacetArgs;
use crate::context::FacetContext;
use crate::fault::FacetFault;

/// Type-erased method body: binds positional values, runs, encodes the result.
pub type MethodFn = Arc<
    dyn Fn(FacetContext, Vec<Value>) -> BoxFuture<'static, Result<Value, FacetFault>>
        + Send
        + Sync,
>;

/// Errors raised while building the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two facets share a name.
    #[error("facet '{0}' is already registered")]
    DuplicateFacet(String),

    /// One facet declares the same method name twice.
    #[error("facet '{facet}' declares method '{method}' twice")]
    DuplicateMethod { facet: String, method: String },
}

/// One registered method.
#[derive(Clone)]
pub struct MethodEntry {
    arity: usize,
    requires_login: bool,
    body: MethodFn,
}

impl std::fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodEntry")
            .field("arity", &self.arity)
            .field("requires_login", &self.requires_login)
            .finish_non_exhaustive()
    }
}

/// A server-side type exposing callable methods.
///
/// ```rust,ignore
/// struct Greeter;
///
/// impl Facet for Greeter {
///     const NAME: &'static str = "Greeter";
///
///     fn methods(builder: FacetBuilder) -> FacetBuilder {
///         builder.method("Hello", |_ctx, (name,): (String,)| async move {
///             Ok(format!("hello {name}"))
///         })
///     }
/// }
/// ```
pub trait Facet {
    /// The facet type name callers address.
    const NAME: &'static str;

    /// Declare the facet's methods.
    fn methods(builder: FacetBuilder) -> FacetBuilder;
}

/// Collects the methods of one facet.
#[derive(Debug)]
pub struct FacetBuilder {
    name: String,
    methods: HashMap<String, MethodEntry>,
    duplicates: Vec<String>,
}

impl FacetBuilder {
    /// Start a facet named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Add a method callable without a logged-in player.
    #[must_use]
    pub fn method<A, F, Fut, R>(self, name: &str, body: F) -> Self
    where
        A: FacetArgs,
        F: Fn(FacetContext, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.insert(name, false, body)
    }

    /// Add a method that requires a logged-in player. Logged-out calls are
    /// rejected before the body runs.
    #[must_use]
    pub fn authenticated_method<A, F, Fut, R>(self, name: &str, body: F) -> Self
    where
        A: FacetArgs,
        F: Fn(FacetContext, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.insert(name, true, body)
    }

    fn insert<A, F, Fut, R>(mut self, name: &str, requires_login: bool, body: F) -> Self
    where
        A: FacetArgs,
        F: Fn(FacetContext, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let body = Arc::new(body);
        let erased: MethodFn = Arc::new(move |ctx: FacetContext, values: Vec<Value>| {
            let body = Arc::clone(&body);
            async move {
                let args = A::from_values(values)?;
                let result = body(ctx, args)
                    .await
                    .map_err(|err| FacetFault::from_method_error(&err))?;
                serde_json::to_value(result)
                    .map_err(|e| FacetFault::execution(format!("result encoding failed: {e}")))
            }
            .boxed()
        });

        let entry = MethodEntry {
            arity: A::ARITY,
            requires_login,
            body: erased,
        };
        if self.methods.insert(name.to_string(), entry).is_some() {
            self.duplicates.push(name.to_string());
        }
        self
    }
}

/// A resolved `(facet, method)` target.
#[derive(Debug, Clone)]
pub struct FacetHandle {
    facet: Arc<str>,
    method: Arc<str>,
    entry: MethodEntry,
}

impl FacetHandle {
    /// The facet type name.
    #[must_use]
    pub fn facet(&self) -> &str {
        &self.facet
    }

    /// The method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Number of positional parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.entry.arity
    }

    /// Whether the method requires a logged-in player.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.entry.requires_login
    }

    pub(crate) fn body(&self) -> &MethodFn {
        &self.entry.body
    }
}

/// Registry of every facet the backend serves.
#[derive(Debug, Default)]
pub struct FacetRegistry {
    /// Methods keyed by facet name, then method name.
    facets: HashMap<String, HashMap<String, MethodEntry>>,
}

impl FacetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            facets: HashMap::new(),
        }
    }

    /// Register a facet type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the facet name is taken or the facet
    /// declares a method twice.
    pub fn register_facet<F: Facet>(&mut self) -> Result<(), RegistryError> {
        self.register(F::methods(FacetBuilder::new(F::NAME)))
    }

    /// Register a facet from a builder.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the facet name is taken or the facet
    /// declares a method twice.
    pub fn register(&mut self, builder: FacetBuilder) -> Result<(), RegistryError> {
        if let Some(method) = builder.duplicates.into_iter().next() {
            return Err(RegistryError::DuplicateMethod {
                facet: builder.name,
                method,
            });
        }
        if self.facets.contains_key(&builder.name) {
            return Err(RegistryError::DuplicateFacet(builder.name));
        }
        self.facets.insert(builder.name, builder.methods);
        Ok(())
    }

    /// Resolve a `(facet, method)` pair.
    ///
    /// # Errors
    ///
    /// Returns a `FacetNotFound` fault for an unknown facet, or a
    /// `MethodNotFound` fault for an unknown method on a known facet.
    pub fn resolve(&self, facet: &str, method: &str) -> Result<FacetHandle, FacetFault> {
        let methods = self
            .facets
            .get(facet)
            .ok_or_else(|| FacetFault::facet_not_found(facet))?;
        let entry = methods
            .get(method)
            .ok_or_else(|| FacetFault::method_not_found(facet, method))?;
        Ok(FacetHandle {
            facet: Arc::from(facet),
            method: Arc::from(method),
            entry: entry.clone(),
        })
    }

    /// Returns `true` if a facet with this name is registered.
    #[must_use]
    pub fn contains(&self, facet: &str) -> bool {
        self.facets.contains_key(facet)
    }

    /// Returns the number of registered facets.
    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    /// Returns the total number of methods across all facets.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.facets.values().map(HashMap::len).sum()
    }
}
