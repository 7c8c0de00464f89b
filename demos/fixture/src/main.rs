//! Fixture server hosting the example facets over NATS.
//!
//! Configuration comes from the environment (see `BackendConfig`) and can
//! be overridden on the command line. Entities live in memory for the
//! lifetime of the process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use backend_app::{Application, BackendConfig, runtime};
use backend_entity::MemoryStore;

#[derive(Parser)]
#[command(name = "fixture_server", about = "Serve the fixture facets over NATS")]
struct Args {
    /// NATS server URL (overrides NATS_URL)
    #[arg(short, long)]
    nats_url: Option<String>,

    /// Subject prefix (overrides BACKEND_SUBJECT_PREFIX)
    #[arg(short, long)]
    prefix: Option<String>,

    /// Consecutive failed logins before an email is locked out
    #[arg(long)]
    max_failed_logins: Option<u32>,

    /// Lockout duration in seconds
    #[arg(long)]
    lockout_secs: Option<u64>,

    /// Seconds a logged-in session may stay idle before it is forgotten
    #[arg(long)]
    session_idle_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fixture=info".parse()?)
                .add_directive("backend_app=info".parse()?)
                .add_directive("backend_auth=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let mut config = BackendConfig::from_env()?;
    if let Some(url) = args.nats_url {
        config = config.with_nats_url(url);
    }
    if let Some(prefix) = args.prefix {
        config = config.with_subject_prefix(prefix);
    }
    if let Some(max) = args.max_failed_logins {
        config.throttle.max_failed_attempts = max;
    }
    if let Some(secs) = args.lockout_secs {
        config.throttle.lockout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.session_idle_secs {
        config = config.with_session_idle_timeout(Duration::from_secs(secs));
    }

    let app = fixture::register_facets(Application::builder(
        config,
        Arc::new(MemoryStore::new()),
    ))?
    .build();

    info!(
        url = %app.config().nats_url,
        prefix = %app.config().subject_prefix,
        "fixture server starting"
    );
    runtime::serve(Arc::new(app)).await?;

    info!("fixture server shut down");
    Ok(())
}
