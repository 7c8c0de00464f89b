//! Answers facet calls arriving over NATS.
//!
//! The server joins a queue group on the facet call subject, decodes each
//! request, hands it to a [`CallHandler`] and publishes the encoded response
//! to the request's reply subject. Each request runs on its own task so a
//! slow facet method does not hold up unrelated callers.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use backend_facet::{CallHandler, CallOutcome, CallRequest, CallResponse, FacetFault};

use crate::codec::{decode, encode};
use crate::connection::NatsConnection;
use crate::error::NetError;
use crate::subjects;

/// Turn one encoded request into one encoded response.
///
/// A payload that does not decode as a [`CallRequest`] is answered with a
/// `Transport` fault rather than dropped, so the caller is not left waiting
/// for its timeout.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if the response cannot be encoded.
pub async fn respond(handler: &dyn CallHandler, payload: &[u8]) -> Result<Vec<u8>, NetError> {
    let response = match decode::<CallRequest>(payload) {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            warn!(%e, "malformed facet call");
            CallResponse {
                outcome: CallOutcome::Fault(FacetFault::transport(format!(
                    "malformed request: {e}"
                ))),
                session_id: None,
            }
        }
    };
    encode(&response)
}

/// Serves facet calls for one subject prefix.
pub struct FacetServer {
    conn: NatsConnection,
    prefix: String,
    handler: Arc<dyn CallHandler>,
}

impl std::fmt::Debug for FacetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetServer")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl FacetServer {
    /// Create a server that answers calls under `prefix`.
    #[must_use]
    pub fn new(conn: NatsConnection, prefix: impl Into<String>, handler: Arc<dyn CallHandler>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            handler,
        }
    }

    /// The subject this server listens on.
    #[must_use]
    pub fn subject(&self) -> String {
        subjects::facet_call(&self.prefix)
    }

    /// Run until the subscription closes.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Subscribe`] if the subscription cannot be created.
    pub async fn run(self) -> Result<(), NetError> {
        let subject = self.subject();
        let queue = subjects::queue_group(&self.prefix);
        let mut sub = self.conn.queue_subscribe(&subject, &queue).await?;
        info!(subject, queue, "facet server ready, listening for calls");

        while let Some(msg) = sub.next().await {
            let Some(reply_to) = msg.reply.clone() else {
                warn!(subject = %msg.subject, "facet call without reply subject, ignoring");
                continue;
            };

            let handler = Arc::clone(&self.handler);
            let conn = self.conn.clone();
            tokio::spawn(async move {
                debug!(bytes = msg.payload.len(), "received facet call");
                let bytes = match respond(handler.as_ref(), &msg.payload).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!(%e, "failed to encode facet response");
                        return;
                    }
                };
                if let Err(e) = conn.client().publish(reply_to, bytes.into()).await {
                    error!(%e, "failed to publish reply");
                }
            });
        }

        info!(subject, "facet server subscription closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use backend_auth::SessionId;
    use backend_facet::FaultCategory;
    use serde_json::json;

    use super::*;

    struct Upper;

    #[async_trait]
    impl CallHandler for Upper {
        async fn handle(&self, request: CallRequest) -> CallResponse {
            let text = request.args[0].as_str().unwrap_or_default().to_uppercase();
            CallResponse {
                outcome: CallOutcome::Success(json!(text)),
                session_id: Some(SessionId::from_raw("s-1")),
            }
        }
    }

    #[tokio::test]
    async fn test_respond_runs_handler() {
        let request = CallRequest::new("Text", "Upper", vec![json!("abc")]);
        let bytes = respond(&Upper, &encode(&request).unwrap()).await.unwrap();
        let response: CallResponse = decode(&bytes).unwrap();
        assert_eq!(response.outcome, CallOutcome::Success(json!("ABC")));
        assert_eq!(response.session_id, Some(SessionId::from_raw("s-1")));
    }

    #[tokio::test]
    async fn test_malformed_request_gets_transport_fault() {
        let bytes = respond(&Upper, b"\xc1 not msgpack").await.unwrap();
        let response: CallResponse = decode(&bytes).unwrap();
        let fault = response.outcome.into_result().unwrap_err();
        assert_eq!(fault.category, FaultCategory::Transport);
        assert!(response.session_id.is_none());
    }
}
