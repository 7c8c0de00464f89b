//! Per-call execution context provided to facet methods.
//!
//! A [`FacetContext`] gives a method read access to the calling session,
//! the session-changing auth operations, and entity access scoped to the
//! logged-in player. It cannot swap the session for another one.

use std::collections::BTreeSet;
use std::sync::Arc;

use backend_auth::{AuthError, Authenticator, Credentials, Session};
use backend_entity::{
    Entity, EntityContext, EntityId, EntityRecord, EntityScope, EntityStore, Principal,
};

use crate::fault::FacetFault;

/// Context handed to each facet method invocation.
#[derive(Clone)]
pub struct FacetContext {
    session: Arc<Session>,
    authenticator: Authenticator,
    store: Arc<dyn EntityStore>,
}

impl std::fmt::Debug for FacetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetContext")
            .field("session", &self.session.id())
            .finish_non_exhaustive()
    }
}

impl FacetContext {
    /// Create a context for one call.
    #[must_use]
    pub fn new(
        session: Arc<Session>,
        authenticator: Authenticator,
        store: Arc<dyn EntityStore>,
    ) -> Self {
        Self {
            session,
            authenticator,
            store,
        }
    }

    /// The calling session (read-only).
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Login, logout and registration on the calling session.
    #[must_use]
    pub fn auth(&self) -> SessionAuth<'_> {
        SessionAuth {
            authenticator: &self.authenticator,
            session: &self.session,
        }
    }

    /// The logged-in principal, if any.
    pub async fn principal(&self) -> Option<Principal> {
        self.session.principal().await
    }

    /// The logged-in principal.
    ///
    /// # Errors
    ///
    /// Returns an authorization fault if nobody is logged in.
    pub async fn require_principal(&self) -> Result<Principal, FacetFault> {
        self.principal()
            .await
            .ok_or_else(|| FacetFault::authorization("a logged-in player is required"))
    }

    /// Entity reads scoped to the logged-in player. Logged out, the scope is
    /// empty and every read comes back empty.
    pub async fn entities(&self) -> EntityContext {
        let principal = self.principal().await;
        EntityContext::new(self.store.clone(), principal.iter())
    }

    /// Store a new entity owned by the logged-in player.
    ///
    /// # Errors
    ///
    /// Returns an authorization fault if nobody is logged in, or the store
    /// error if the write fails.
    pub async fn create<T: Entity>(&self, entity: &T) -> anyhow::Result<EntityId> {
        let owner = self.require_principal().await?;
        let id = EntityId::generate();
        let record =
            EntityRecord::from_entity(id.clone(), BTreeSet::from([owner.id().clone()]), entity)?;
        self.store.insert(record).await?;
        Ok(id)
    }

    /// Replace an entity the logged-in player owns.
    ///
    /// # Errors
    ///
    /// Returns an authorization fault if the entity is not in the player's
    /// scope (including when it does not exist), or the store error.
    pub async fn update<T: Entity>(&self, id: &EntityId, entity: &T) -> anyhow::Result<()> {
        let existing = self.owned_record(id).await?;
        let record = EntityRecord::from_entity(id.clone(), existing.owners, entity)?;
        self.store.update(record).await?;
        Ok(())
    }

    /// Delete an entity the logged-in player owns.
    ///
    /// # Errors
    ///
    /// Returns an authorization fault if the entity is not in the player's
    /// scope, or the store error.
    pub async fn delete(&self, id: &EntityId) -> anyhow::Result<()> {
        self.owned_record(id).await?;
        self.store.delete(id).await?;
        Ok(())
    }

    async fn owned_record(&self, id: &EntityId) -> anyhow::Result<EntityRecord> {
        let owner = self.require_principal().await?;
        let scope = EntityScope::new([&owner]);
        match self.store.get(id).await? {
            Some(record) if scope.admits(&record) => Ok(record),
            _ => Err(FacetFault::authorization(format!("{id} is not accessible")).into()),
        }
    }
}

/// Auth operations bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct SessionAuth<'a> {
    authenticator: &'a Authenticator,
    session: &'a Session,
}

impl SessionAuth<'_> {
    /// See [`Authenticator::login`].
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError`].
    pub async fn login(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        self.authenticator.login(self.session, credentials).await
    }

    /// See [`Authenticator::logout`].
    pub async fn logout(&self) {
        self.authenticator.logout(self.session).await;
    }

    /// See [`Authenticator::register`].
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError`].
    pub async fn register(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        self.authenticator.register(self.session, credentials).await
    }

    /// Returns `true` if a player is logged in.
    pub async fn is_logged_in(&self) -> bool {
        self.session.is_logged_in().await
    }

    /// Look up a registered player by email.
    ///
    /// # Errors
    ///
    /// Propagates [`AuthError`].
    pub async fn principal_for_email(&self, email: &str) -> Result<Option<Principal>, AuthError> {
        self.authenticator.principal_for_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use backend_auth::{SessionId, ThrottlePolicy};
    use backend_entity::MemoryStore;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::fault::FaultCategory;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Deck {
        cards: u32,
    }

    impl Entity for Deck {
        fn type_name() -> &'static str {
            "Deck"
        }
    }

    fn context(store: Arc<MemoryStore>) -> FacetContext {
        let auth = Authenticator::new(store.clone(), ThrottlePolicy::default());
        FacetContext::new(Arc::new(Session::new(SessionId::generate())), auth, store)
    }

    fn category(err: &anyhow::Error) -> FaultCategory {
        FacetFault::from_method_error(err).category
    }

    #[tokio::test]
    async fn test_logged_out_context_sees_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context(store);
        assert!(ctx.principal().await.is_none());
        assert!(ctx.entities().await.scope().is_empty());
        let err = ctx.require_principal().await.unwrap_err();
        assert_eq!(err.category, FaultCategory::Authorization);
    }

    #[tokio::test]
    async fn test_create_requires_login_and_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context(store.clone());
        let err = ctx.create(&Deck { cards: 40 }).await.unwrap_err();
        assert_eq!(category(&err), FaultCategory::Authorization);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_create_update_delete_owned_entity() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context(store.clone());
        ctx.auth()
            .authenticator
            .login_as(ctx.session(), Principal::new("p1"))
            .await;

        let id = ctx.create(&Deck { cards: 40 }).await.unwrap();
        ctx.update(&id, &Deck { cards: 60 }).await.unwrap();
        let deck = ctx.entities().await.request::<Deck>().await.unwrap().unwrap();
        assert_eq!(deck.cards, 60);

        ctx.delete(&id).await.unwrap();
        assert!(ctx.entities().await.request::<Deck>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cannot_touch_foreign_entity() {
        let store = Arc::new(MemoryStore::new());
        let owner_ctx = context(store.clone());
        owner_ctx
            .authenticator
            .login_as(owner_ctx.session(), Principal::new("owner"))
            .await;
        let id = owner_ctx.create(&Deck { cards: 1 }).await.unwrap();

        let intruder = context(store.clone());
        intruder
            .authenticator
            .login_as(intruder.session(), Principal::new("intruder"))
            .await;
        let writes_before = store.write_count();
        let err = intruder.update(&id, &Deck { cards: 99 }).await.unwrap_err();
        assert_eq!(category(&err), FaultCategory::Authorization);
        let err = intruder.delete(&id).await.unwrap_err();
        assert_eq!(category(&err), FaultCategory::Authorization);
        assert_eq!(store.write_count(), writes_before);
    }

    #[tokio::test]
    async fn test_entities_are_scoped_to_the_session_principal() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context(store);
        ctx.authenticator
            .login_as(ctx.session(), Principal::new("p1"))
            .await;
        let entities = ctx.entities().await;
        assert_eq!(entities.scope().len(), 1);
        assert!(entities.scope().contains(Principal::new("p1").id()));
    }
}
