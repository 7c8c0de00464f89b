//! Validation and execution of resolved facet calls.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::args::check_arity;
use crate::context::FacetContext;
use crate::envelope::CallOutcome;
use crate::fault::FacetFault;
use crate::registry::{FacetHandle, FacetRegistry};

/// Executes facet calls against a shared registry.
///
/// Validation runs in a fixed order: resolution, arity, login requirement.
/// A call that fails any check never reaches the method body, so routing
/// and argument errors have no side effects.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<FacetRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over a finished registry.
    #[must_use]
    pub fn new(registry: Arc<FacetRegistry>) -> Self {
        Self { registry }
    }

    /// The registry calls are resolved against.
    #[must_use]
    pub fn registry(&self) -> &FacetRegistry {
        &self.registry
    }

    /// Resolve and invoke in one step.
    pub async fn dispatch(
        &self,
        facet: &str,
        method: &str,
        args: Vec<Value>,
        ctx: FacetContext,
    ) -> CallOutcome {
        let result = match self.registry.resolve(facet, method) {
            Ok(handle) => self.invoke(&handle, args, ctx).await,
            Err(fault) => Err(fault),
        };
        match &result {
            Ok(_) => debug!(facet, method, "facet call succeeded"),
            Err(fault) => warn!(
                facet,
                method,
                category = %fault.category,
                detail = %fault.message,
                "facet call faulted"
            ),
        }
        CallOutcome::from(result)
    }

    /// Invoke a resolved method.
    ///
    /// # Errors
    ///
    /// - `Argument` if the argument count or types don't match.
    /// - `Authorization` if the method requires login and the session has
    ///   no principal.
    /// - `Execution` if the body fails or panics, unless it raised a fault
    ///   of its own.
    pub async fn invoke(
        &self,
        handle: &FacetHandle,
        args: Vec<Value>,
        ctx: FacetContext,
    ) -> Result<Value, FacetFault> {
        check_arity(handle.arity(), args.len())?;

        if handle.requires_login() && !ctx.session().is_logged_in().await {
            return Err(FacetFault::authorization(format!(
                "{}.{} requires a logged-in player",
                handle.facet(),
                handle.method()
            )));
        }

        let body = handle.body()(ctx, args);
        match AssertUnwindSafe(body).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "method panicked".to_string());
                Err(FacetFault::execution(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use backend_auth::{Authenticator, Session, SessionId, ThrottlePolicy};
    use backend_entity::{MemoryStore, Principal};
    use serde_json::json;

    use super::*;
    use crate::fault::FaultCategory;
    use crate::registry::FacetBuilder;

    fn dispatcher(side_effects: &Arc<AtomicUsize>) -> Dispatcher {
        let adds = Arc::clone(side_effects);
        let secrets = Arc::clone(side_effects);
        let builder = FacetBuilder::new("Counter")
            .method("Add", move |_ctx, (a, b): (i64, i64)| {
                adds.fetch_add(1, Ordering::SeqCst);
                async move { Ok(a + b) }
            })
            .authenticated_method("Secret", move |_ctx, ()| {
                secrets.fetch_add(1, Ordering::SeqCst);
                async move { Ok("hidden") }
            })
            .method("Fail", |_ctx, ()| async move {
                Err::<(), _>(anyhow::anyhow!("out of stock"))
            })
            .method("Panic", |_ctx, ()| async move {
                let armed = true;
                if armed {
                    panic!("exploded");
                }
                Ok(())
            });
        let mut registry = FacetRegistry::new();
        registry.register(builder).unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    fn context() -> FacetContext {
        let store = Arc::new(MemoryStore::new());
        let auth = Authenticator::new(store.clone(), ThrottlePolicy::default());
        FacetContext::new(Arc::new(Session::new(SessionId::generate())), auth, store)
    }

    async fn run(facet: &str, method: &str, args: Vec<Value>) -> Result<Value, FacetFault> {
        dispatcher(&Arc::new(AtomicUsize::new(0)))
            .dispatch(facet, method, args, context())
            .await
            .into_result()
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        assert_eq!(run("Counter", "Add", vec![json!(2), json!(3)]).await.unwrap(), json!(5));
    }

    #[tokio::test]
    async fn test_routing_faults_have_no_side_effects() {
        let side_effects = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher(&side_effects);
        let cases = [
            ("Missing", "Add", vec![], FaultCategory::FacetNotFound),
            ("Counter", "Subtract", vec![], FaultCategory::MethodNotFound),
            ("Counter", "Add", vec![json!(1)], FaultCategory::Argument),
            (
                "Counter",
                "Add",
                vec![json!(1), json!("two")],
                FaultCategory::Argument,
            ),
        ];
        for (facet, method, args, expected) in cases {
            let err = dispatcher
                .dispatch(facet, method, args, context())
                .await
                .into_result()
                .unwrap_err();
            assert_eq!(err.category, expected, "{facet}.{method}");
        }
        assert_eq!(side_effects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_login_checked_before_execution() {
        let side_effects = Arc::new(AtomicUsize::new(0));
        let err = dispatcher(&side_effects)
            .dispatch("Counter", "Secret", vec![], context())
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(err.category, FaultCategory::Authorization);
        assert_eq!(side_effects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_logged_in_call_runs() {
        let store = Arc::new(MemoryStore::new());
        let auth = Authenticator::new(store.clone(), ThrottlePolicy::default());
        let session = Arc::new(Session::new(SessionId::generate()));
        auth.login_as(&session, Principal::new("p1")).await;
        let ctx = FacetContext::new(session, auth, store);

        let side_effects = Arc::new(AtomicUsize::new(0));
        let value = dispatcher(&side_effects)
            .dispatch("Counter", "Secret", vec![], ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(value, json!("hidden"));
        assert_eq!(side_effects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_body_error_becomes_execution_fault() {
        let err = run("Counter", "Fail", vec![]).await.unwrap_err();
        assert_eq!(err.category, FaultCategory::Execution);
        assert_eq!(err.message, "out of stock");
    }

    #[tokio::test]
    async fn test_panic_becomes_execution_fault() {
        let err = run("Counter", "Panic", vec![]).await.unwrap_err();
        assert_eq!(err.category, FaultCategory::Execution);
        assert_eq!(err.message, "exploded");
    }
}
