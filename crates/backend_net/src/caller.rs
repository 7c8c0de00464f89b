//! The network caller strategy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use backend_facet::{CallRequest, CallResponse, FacetCaller, FacetFault};

use crate::codec::{decode, encode};
use crate::connection::NatsConnection;
use crate::error::NetError;
use crate::subjects;
use crate::transport::{NatsTransport, Transport};

/// Serialises each request, sends it over a [`Transport`] and decodes the
/// reply. Any failure on the way is a `Transport` fault.
#[derive(Clone)]
pub struct NetworkCaller {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for NetworkCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkCaller").finish_non_exhaustive()
    }
}

impl NetworkCaller {
    /// Create a caller over any transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Create a caller sending NATS requests to the facet call subject of
    /// `prefix`.
    #[must_use]
    pub fn over_nats(conn: NatsConnection, prefix: &str, timeout: Duration) -> Self {
        Self::new(Arc::new(NatsTransport::new(
            conn,
            subjects::facet_call(prefix),
            timeout,
        )))
    }

    async fn exchange(&self, request: &CallRequest) -> Result<CallResponse, NetError> {
        let payload = encode(request)?;
        let reply = self.transport.round_trip(payload).await?;
        decode(&reply)
    }
}

#[async_trait]
impl FacetCaller for NetworkCaller {
    async fn send(&self, request: CallRequest) -> Result<CallResponse, FacetFault> {
        self.exchange(&request).await.map_err(|e| {
            warn!(facet = %request.facet, method = %request.method, %e, "facet call transport failure");
            FacetFault::from(e)
        })
    }
}
