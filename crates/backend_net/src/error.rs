//! Network-layer error types.

use std::time::Duration;

use backend_facet::FacetFault;

/// Errors that can occur during network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a message to MessagePack.
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a message from MessagePack.
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// NATS subscription error.
    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// NATS request/reply error (no responders, broker-side timeout).
    #[error("NATS request error: {0}")]
    Request(#[from] async_nats::RequestError),

    /// No reply arrived within the configured call timeout.
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

impl From<NetError> for FacetFault {
    fn from(err: NetError) -> Self {
        Self::transport(err.to_string())
    }
}
