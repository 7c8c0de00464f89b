//! Byte transports the network caller can send envelopes over.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use backend_facet::CallHandler;

use crate::connection::NatsConnection;
use crate::error::NetError;
use crate::server;

/// Delivers one encoded request and returns the encoded reply.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single round trip.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be delivered or no reply
    /// arrives.
    async fn round_trip(&self, payload: Vec<u8>) -> Result<Vec<u8>, NetError>;
}

/// NATS request/reply on the facet call subject.
#[derive(Debug, Clone)]
pub struct NatsTransport {
    conn: NatsConnection,
    subject: String,
    timeout: Duration,
}

impl NatsTransport {
    /// Create a transport sending to `subject`, waiting at most `timeout`.
    #[must_use]
    pub fn new(conn: NatsConnection, subject: impl Into<String>, timeout: Duration) -> Self {
        Self {
            conn,
            subject: subject.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn round_trip(&self, payload: Vec<u8>) -> Result<Vec<u8>, NetError> {
        self.conn
            .request_bytes(&self.subject, payload, self.timeout)
            .await
    }
}

/// Hands encoded requests straight to a server-side handler through the
/// same decode/encode path the NATS server uses. Lets the network caller
/// run without a broker.
#[derive(Clone)]
pub struct Loopback {
    handler: Arc<dyn CallHandler>,
}

impl std::fmt::Debug for Loopback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loopback").finish_non_exhaustive()
    }
}

impl Loopback {
    /// Wrap a handler.
    #[must_use]
    pub fn new(handler: Arc<dyn CallHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl Transport for Loopback {
    async fn round_trip(&self, payload: Vec<u8>) -> Result<Vec<u8>, NetError> {
        server::respond(self.handler.as_ref(), &payload).await
    }
}
