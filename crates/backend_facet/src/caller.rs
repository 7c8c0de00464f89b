//! Client-facing facet calls.
//!
//! [`FacetClient`] is what game code talks to. It turns a typed call into a
//! [`CallRequest`], hands it to a [`FacetCaller`] strategy and decodes the
//! reply. The strategies (network and in-process) live in other crates and
//! are interchangeable behind the trait.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use backend_auth::SessionId;

use crate::args::CallArgs;
use crate::envelope::{CallRequest, CallResponse};
use crate::fault::FacetFault;
use crate::registry::Facet;

/// A way of getting a request to a dispatcher and its response back.
///
/// Implementations perform exactly one round trip per call and never retry.
#[async_trait]
pub trait FacetCaller: Send + Sync {
    /// Deliver `request` and await its response.
    ///
    /// # Errors
    ///
    /// Returns a `Transport` fault if the request could not be delivered or
    /// the response could not be read. Faults raised by the call itself
    /// arrive inside the [`CallResponse`].
    async fn send(&self, request: CallRequest) -> Result<CallResponse, FacetFault>;
}

/// The server side of a call: turns a request into a response.
#[async_trait]
pub trait CallHandler: Send + Sync {
    /// Resolve the session, dispatch, and build the response.
    async fn handle(&self, request: CallRequest) -> CallResponse;
}

/// The session id a client carries between calls.
#[derive(Debug, Default)]
pub struct SessionIdStore {
    current: Mutex<Option<SessionId>>,
}

impl SessionIdStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The id to send with the next call.
    #[must_use]
    pub fn get(&self) -> Option<SessionId> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remember the id the server answered with.
    pub fn set(&self, id: SessionId) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    /// Forget the id; the next call starts a fresh session.
    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Typed facet calls over any [`FacetCaller`].
#[derive(Clone)]
pub struct FacetClient {
    caller: Arc<dyn FacetCaller>,
    session_ids: Arc<SessionIdStore>,
}

impl std::fmt::Debug for FacetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetClient")
            .field("session_id", &self.session_ids.get())
            .finish_non_exhaustive()
    }
}

impl FacetClient {
    /// Create a client with no session yet.
    #[must_use]
    pub fn new(caller: Arc<dyn FacetCaller>) -> Self {
        Self {
            caller,
            session_ids: Arc::new(SessionIdStore::new()),
        }
    }

    /// The session id the next call will carry.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_ids.get()
    }

    /// Adopt a session the server already knows, so the next call runs in it.
    pub fn use_session(&self, id: SessionId) {
        self.session_ids.set(id);
    }

    /// Drop the current session id.
    pub fn reset_session(&self) {
        self.session_ids.clear();
    }

    /// Call `facet.method(args...)` and decode the result as `T`.
    ///
    /// # Errors
    ///
    /// Returns the call's fault unchanged. A result that does not decode as
    /// `T` is a `Transport` fault.
    pub async fn call<T: DeserializeOwned>(
        &self,
        facet: &str,
        method: &str,
        args: impl CallArgs,
    ) -> Result<T, FacetFault> {
        let values = args
            .into_values()
            .map_err(|e| FacetFault::argument(format!("argument encoding failed: {e}")))?;
        let value = self.call_value(facet, method, values).await?;
        serde_json::from_value(value).map_err(|e| {
            FacetFault::transport(format!("{facet}.{method} returned an unexpected value: {e}"))
        })
    }

    /// Call with pre-encoded arguments and return the raw result.
    ///
    /// # Errors
    ///
    /// Returns the call's fault unchanged.
    pub async fn call_value(
        &self,
        facet: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, FacetFault> {
        let request = CallRequest::new(facet, method, args).with_session(self.session_ids.get());
        debug!(facet, method, "sending facet call");
        let response = self.caller.send(request).await?;
        if let Some(id) = response.session_id {
            self.session_ids.set(id);
        }
        response.outcome.into_result()
    }

    /// Calls addressed to facet type `F`.
    #[must_use]
    pub fn on<F: Facet>(&self) -> FacetRef<'_> {
        FacetRef {
            client: self,
            facet: F::NAME,
        }
    }
}

/// A [`FacetClient`] bound to one facet name.
#[derive(Debug, Clone, Copy)]
pub struct FacetRef<'a> {
    client: &'a FacetClient,
    facet: &'static str,
}

impl FacetRef<'_> {
    /// See [`FacetClient::call`].
    ///
    /// # Errors
    ///
    /// Returns the call's fault unchanged.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        args: impl CallArgs,
    ) -> Result<T, FacetFault> {
        self.client.call(self.facet, method, args).await
    }
}
