//! The backend application object.
//!
//! An [`Application`] is built once at startup with an explicit facet
//! registration table and passed to whatever serves calls: the NATS
//! [`FacetServer`](backend_net::FacetServer) or an in-process
//! [`DirectCaller`](crate::DirectCaller). There is no global state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, info, info_span};

use backend_auth::{Authenticator, Session, SessionId};
use backend_entity::EntityStore;
use backend_facet::{
    CallHandler, CallRequest, CallResponse, Dispatcher, Facet, FacetBuilder, FacetContext,
    FacetRegistry, RegistryError,
};

use crate::config::BackendConfig;
use crate::sessions::SessionRepository;

/// Collects facets and collaborators for an [`Application`].
pub struct ApplicationBuilder {
    config: BackendConfig,
    store: Arc<dyn EntityStore>,
    registry: FacetRegistry,
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ApplicationBuilder {
    /// Register a facet type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the facet is already registered or
    /// declares a method twice.
    pub fn facet<F: Facet>(mut self) -> Result<Self, RegistryError> {
        self.registry.register_facet::<F>()?;
        Ok(self)
    }

    /// Register a facet built by hand.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on a name clash.
    pub fn facet_builder(mut self, builder: FacetBuilder) -> Result<Self, RegistryError> {
        self.registry.register(builder)?;
        Ok(self)
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Application {
        let authenticator = Authenticator::new(Arc::clone(&self.store), self.config.throttle);
        info!(
            facets = self.registry.facet_count(),
            methods = self.registry.method_count(),
            "backend application built"
        );
        Application {
            dispatcher: Dispatcher::new(Arc::new(self.registry)),
            authenticator,
            store: self.store,
            sessions: SessionRepository::new(self.config.session_idle_timeout),
            config: self.config,
        }
    }
}

/// Registry, store, authenticator and live sessions of one backend.
pub struct Application {
    dispatcher: Dispatcher,
    authenticator: Authenticator,
    store: Arc<dyn EntityStore>,
    sessions: SessionRepository,
    config: BackendConfig,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("facets", &self.dispatcher.registry().facet_count())
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Start building an application over `store`.
    #[must_use]
    pub fn builder(config: BackendConfig, store: Arc<dyn EntityStore>) -> ApplicationBuilder {
        ApplicationBuilder {
            config,
            store,
            registry: FacetRegistry::new(),
        }
    }

    /// The configuration the application was built with.
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// The dispatcher (and through it, the registry).
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The entity store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// The authenticator shared by every session.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Stored sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionRepository {
        &self.sessions
    }

    /// Build the per-call context for `session`.
    #[must_use]
    pub fn context(&self, session: Arc<Session>) -> FacetContext {
        FacetContext::new(session, self.authenticator.clone(), Arc::clone(&self.store))
    }
}

#[async_trait]
impl CallHandler for Application {
    /// Run one call in the caller's session.
    ///
    /// An unknown or missing session id gets a fresh logged-out session that
    /// is only stored if the call leaves it logged in. The response carries
    /// the session id only while the server holds that session, so routing
    /// and argument faults never leave server-side state behind.
    async fn handle(&self, request: CallRequest) -> CallResponse {
        let stored = request
            .session_id
            .as_ref()
            .and_then(|id| self.sessions.get(id));
        let known = stored.is_some();
        let session = stored.unwrap_or_else(|| Arc::new(Session::new(SessionId::generate())));
        let span = info_span!(
            "facet_call",
            facet = %request.facet,
            method = %request.method,
            session = %session.id()
        );
        let ctx = self.context(Arc::clone(&session));
        let outcome = self
            .dispatcher
            .dispatch(&request.facet, &request.method, request.args, ctx)
            .instrument(span)
            .await;

        let keep = known || session.is_logged_in().await;
        if keep && !known {
            self.sessions.insert(Arc::clone(&session));
        }
        CallResponse {
            outcome,
            session_id: keep.then(|| session.id().clone()),
        }
    }
}
