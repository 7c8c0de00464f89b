//! # backend_testing
//!
//! Backend test bootstrap.
//!
//! [`TestBackend`] builds a fresh [`Application`] over an empty
//! [`MemoryStore`] and hands out [`FacetClient`]s that reach it in-process.
//! The default client starts without a session id. Tests can log a player
//! in without credentials with [`TestBackend::acting_as`].
//!
//! ```rust,ignore
//! let backend = TestBackend::start(|app| app.facet::<EmailLoginFacet>()).await?;
//! let ok: bool = backend.client().call("EmailLoginFacet", "Login", ("a@b.com", "pw")).await?;
//! ```

use std::sync::{Arc, Once};

use tracing::debug;
use tracing_subscriber::EnvFilter;

use backend_app::{Application, ApplicationBuilder, BackendConfig, DirectCaller};
use backend_auth::{AuthError, Credentials, Session, SessionId};
use backend_entity::{EntityStore, MemoryStore, Principal};
use backend_facet::{FacetClient, RegistryError};
use backend_net::{Loopback, NetworkCaller};

static TRACING: Once = Once::new();

/// Install a test-friendly subscriber once per process. Honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A freshly bootstrapped backend for one test.
#[derive(Debug)]
pub struct TestBackend {
    app: Arc<Application>,
    store: Arc<MemoryStore>,
    client: FacetClient,
}

impl TestBackend {
    /// Boot with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns the registry error if `register` fails.
    pub async fn start<F>(register: F) -> anyhow::Result<Self>
    where
        F: FnOnce(ApplicationBuilder) -> Result<ApplicationBuilder, RegistryError>,
    {
        Self::start_with(BackendConfig::default(), register).await
    }

    /// Boot with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns the registry error if `register` fails, or the store error if
    /// the store cannot be cleared.
    pub async fn start_with<F>(config: BackendConfig, register: F) -> anyhow::Result<Self>
    where
        F: FnOnce(ApplicationBuilder) -> Result<ApplicationBuilder, RegistryError>,
    {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let app = Arc::new(register(Application::builder(config, store.clone()))?.build());
        store.clear().await?;
        let client = FacetClient::new(Arc::new(DirectCaller::new(Arc::clone(&app))));
        debug!("test backend started");
        Ok(Self { app, store, client })
    }

    /// The application under test.
    #[must_use]
    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }

    /// The backing store, for inspecting records and counters.
    #[must_use]
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// The default in-process client.
    #[must_use]
    pub fn client(&self) -> &FacetClient {
        &self.client
    }

    /// A new in-process client with its own (initially absent) session.
    #[must_use]
    pub fn direct_client(&self) -> FacetClient {
        FacetClient::new(Arc::new(DirectCaller::new(Arc::clone(&self.app))))
    }

    /// A new client using the network strategy over a broker-free loopback.
    /// Requests and responses go through the real codec and serve path.
    #[must_use]
    pub fn network_client(&self) -> FacetClient {
        let handler: Arc<Application> = Arc::clone(&self.app);
        let loopback = Loopback::new(handler);
        FacetClient::new(Arc::new(NetworkCaller::new(Arc::new(loopback))))
    }

    /// Log `principal` into the default client's session without
    /// credentials, creating the session if the client has none yet.
    pub async fn acting_as(&self, principal: Principal) {
        self.log_in(&self.client, principal).await;
    }

    /// Log `principal` into `client`'s session without credentials.
    pub async fn log_in(&self, client: &FacetClient, principal: Principal) {
        let session = self.app.sessions().resolve(client.session_id().as_ref());
        self.app.authenticator().login_as(&session, principal).await;
        client.use_session(session.id().clone());
    }

    /// Register a player directly, outside any client session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the credentials are malformed or the email
    /// is taken.
    pub async fn register_player(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let scratch = Session::new(SessionId::generate());
        self.app
            .authenticator()
            .register(&scratch, &Credentials::new(email, password))
            .await
    }
}
