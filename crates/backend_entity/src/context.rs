//! Scoped entity access.
//!
//! An [`EntityContext`] pairs a store with an [`EntityScope`]. Every lookup it
//! issues is translated into a scoped [`EntityQuery`], so code holding a
//! context can only ever see records owned by a principal in the scope. The
//! context has no mutable state; concurrent requests on one context are
//! independent.

use std::sync::Arc;

use tracing::debug;

use crate::entity::{Entity, EntityId, Persisted};
use crate::error::StoreError;
use crate::principal::Principal;
use crate::query::EntityQuery;
use crate::scope::EntityScope;
use crate::store::EntityStore;

/// Read access to the entities of a fixed set of principals.
#[derive(Clone)]
pub struct EntityContext {
    store: Arc<dyn EntityStore>,
    scope: EntityScope,
}

impl std::fmt::Debug for EntityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityContext")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl EntityContext {
    /// Create a context over the given principals.
    #[must_use]
    pub fn new<'a>(
        store: Arc<dyn EntityStore>,
        principals: impl IntoIterator<Item = &'a Principal>,
    ) -> Self {
        Self::with_scope(store, EntityScope::new(principals))
    }

    /// Create a context from an already built scope.
    #[must_use]
    pub fn with_scope(store: Arc<dyn EntityStore>, scope: EntityScope) -> Self {
        Self { store, scope }
    }

    /// Returns the scope this context is restricted to.
    #[must_use]
    pub fn scope(&self) -> &EntityScope {
        &self.scope
    }

    /// The base query for `T` under this context's scope. The `request*`
    /// methods add their limit or filter to it, see
    /// [`EntityContext::request_where`].
    fn query<T: Entity>(&self) -> EntityQuery {
        EntityQuery::scoped::<T>(self.scope.clone())
    }

    /// All entities of type `T` associated with any principal in scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails or a record does not decode.
    pub async fn request_all<T: Entity>(&self) -> Result<Vec<Persisted<T>>, StoreError> {
        self.run(self.query::<T>()).await
    }

    /// The first entity of type `T` in scope, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails or the record does not decode.
    pub async fn request<T: Entity>(&self) -> Result<Option<Persisted<T>>, StoreError> {
        let mut found = self.run(self.query::<T>().limit(1)).await?;
        Ok(found.pop())
    }

    /// Entities of type `T` in scope whose attribute equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails or a record does not decode.
    pub async fn request_where<T: Entity>(
        &self,
        attribute: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<Vec<Persisted<T>>, StoreError> {
        self.run(self.query::<T>().filter_eq(attribute, value)).await
    }

    /// Fetch one entity by id, provided it is in scope.
    ///
    /// Records outside the scope are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails or the record does not decode.
    pub async fn find<T: Entity>(&self, id: &EntityId) -> Result<Option<Persisted<T>>, StoreError> {
        match self.store.get(id).await? {
            Some(record) if record.entity_type == T::type_name() && self.scope.admits(&record) => {
                Ok(Some(Persisted::from_record(record)?))
            }
            _ => Ok(None),
        }
    }

    async fn run<T: Entity>(&self, query: EntityQuery) -> Result<Vec<Persisted<T>>, StoreError> {
        if self.scope.is_empty() {
            debug!(entity_type = T::type_name(), "empty scope, skipping query");
            return Ok(Vec::new());
        }
        let records = self.store.query(&query).await?;
        records.into_iter().map(Persisted::from_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::entity::EntityRecord;
    use crate::principal::PrincipalId;
    use crate::store::MemoryStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Trophy {
        name: String,
    }

    impl Entity for Trophy {
        fn type_name() -> &'static str {
            "Trophy"
        }
    }

    async fn seed(store: &MemoryStore, owner: &str, name: &str) -> EntityId {
        let record = EntityRecord::from_entity(
            EntityId::generate(),
            BTreeSet::from([PrincipalId::new(owner)]),
            &Trophy {
                name: name.to_string(),
            },
        )
        .unwrap();
        let id = record.id.clone();
        store.insert(record).await.unwrap();
        id
    }

    async fn fixture() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "alice", "gold").await;
        seed(&store, "bob", "silver").await;
        seed(&store, "alice", "bronze").await;
        seed(&store, "carol", "tin").await;
        store
    }

    #[tokio::test]
    async fn test_request_all_is_scoped() {
        let store = fixture().await;
        let alice = Principal::new("alice");
        let ctx = EntityContext::new(store, [&alice]);
        let names: Vec<_> = ctx
            .request_all::<Trophy>()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.entity.name)
            .collect();
        assert_eq!(names, vec!["gold", "bronze"]);
    }

    #[tokio::test]
    async fn test_duplicate_principals_do_not_duplicate_results() {
        let store = fixture().await;
        let alice = Principal::new("alice");
        let bob = Principal::new("bob");
        let ctx = EntityContext::new(store, [&alice, &bob, &alice]);
        assert_eq!(ctx.request_all::<Trophy>().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_context_yields_nothing() {
        let store = fixture().await;
        let ctx = EntityContext::new(store.clone(), []);
        assert!(ctx.request_all::<Trophy>().await.unwrap().is_empty());
        assert!(ctx.request::<Trophy>().await.unwrap().is_none());
        assert_eq!(store.records_scanned(), 0);
    }

    #[tokio::test]
    async fn test_request_returns_first_match_only() {
        let store = fixture().await;
        let alice = Principal::new("alice");
        let ctx = EntityContext::new(store.clone(), [&alice]);
        let first = ctx.request::<Trophy>().await.unwrap().unwrap();
        assert_eq!(first.name, "gold");
        assert_eq!(store.records_scanned(), 1);
    }

    #[tokio::test]
    async fn test_request_none_when_no_match() {
        let store = fixture().await;
        let dave = Principal::new("dave");
        let ctx = EntityContext::new(store, [&dave]);
        assert!(ctx.request::<Trophy>().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_request_where_filters_within_scope() {
        let store = fixture().await;
        let alice = Principal::new("alice");
        let bob = Principal::new("bob");
        let ctx = EntityContext::new(store, [&alice, &bob]);
        let silver = ctx.request_where::<Trophy>("name", "silver").await.unwrap();
        assert_eq!(silver.len(), 1);
        let tin = ctx.request_where::<Trophy>("name", "tin").await.unwrap();
        assert!(tin.is_empty());
    }

    #[tokio::test]
    async fn test_find_hides_foreign_records() {
        let store = Arc::new(MemoryStore::new());
        let mine = seed(&store, "alice", "gold").await;
        let theirs = seed(&store, "bob", "silver").await;
        let alice = Principal::new("alice");
        let ctx = EntityContext::new(store, [&alice]);
        assert!(ctx.find::<Trophy>(&mine).await.unwrap().is_some());
        assert!(ctx.find::<Trophy>(&theirs).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let store = fixture().await;
        let alice = Principal::new("alice");
        let ctx = EntityContext::new(store, [&alice]);
        let (all, first) = tokio::join!(ctx.request_all::<Trophy>(), ctx.request::<Trophy>());
        assert_eq!(all.unwrap().len(), 2);
        assert_eq!(first.unwrap().unwrap().name, "gold");
    }
}
