//! NATS connection management.
//!
//! A thin wrapper around `async-nats` covering what the facet server and the
//! network caller need: connecting, request/reply with a deadline, and
//! queue-group subscriptions.

use std::time::Duration;

use tracing::info;

use crate::error::NetError;

/// Default NATS server URL.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable `BackendConfig` reads the NATS URL from.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// A wrapper around an `async-nats` client with backend-specific helpers.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    /// The underlying NATS client.
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect to NATS at the specified URL.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        info!(url, "connecting to NATS");
        let client = async_nats::connect(url).await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Returns a reference to the underlying `async-nats` client.
    #[must_use]
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }

    /// Send an already-encoded request and wait for the raw reply payload.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Timeout`] if no reply arrives within `timeout`,
    /// or [`NetError::Request`] if NATS rejects the request (for example
    /// when nobody is subscribed).
    pub async fn request_bytes(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, NetError> {
        let request = self.client.request(subject.to_string(), payload.into());
        let reply = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| NetError::Timeout(timeout))??;
        Ok(reply.payload.to_vec())
    }

    /// Subscribe to a subject as a member of a queue group. NATS delivers
    /// each message to one member of the group.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Subscribe`] if the subscription fails.
    pub async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
    ) -> Result<async_nats::Subscriber, NetError> {
        let sub = self
            .client
            .queue_subscribe(subject.to_string(), queue_group.to_string())
            .await?;
        Ok(sub)
    }
}
