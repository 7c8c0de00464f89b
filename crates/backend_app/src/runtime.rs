//! Serving runtime: connects an [`Application`] or a client to NATS.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use backend_facet::FacetClient;
use backend_net::{FacetServer, NatsConnection, NetError, NetworkCaller};

use crate::application::Application;
use crate::config::BackendConfig;

/// Serve `app` over NATS until the subscription closes.
///
/// Idle sessions are swept in the background while serving.
///
/// # Errors
///
/// Returns [`NetError`] if connecting or subscribing fails.
pub async fn serve(app: Arc<Application>) -> Result<(), NetError> {
    let config = app.config().clone();
    let conn = NatsConnection::connect_to(&config.nats_url).await?;
    let sweeper = tokio::spawn(sweep_idle_sessions(Arc::clone(&app)));
    info!(prefix = %config.subject_prefix, "serving facets");
    let result = FacetServer::new(conn, config.subject_prefix, app).run().await;
    sweeper.abort();
    result
}

/// Evict idle sessions every half idle timeout, at most once a second.
async fn sweep_idle_sessions(app: Arc<Application>) {
    let period = (app.sessions().idle_timeout() / 2).max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        app.sessions().evict_idle();
    }
}

/// Connect a [`FacetClient`] that calls a served application over NATS.
///
/// # Errors
///
/// Returns [`NetError::Connect`] if NATS is unreachable.
pub async fn connect_client(config: &BackendConfig) -> Result<FacetClient, NetError> {
    let conn = NatsConnection::connect_to(&config.nats_url).await?;
    let caller = NetworkCaller::over_nats(conn, &config.subject_prefix, config.call_timeout);
    Ok(FacetClient::new(Arc::new(caller)))
}
