//! The entity store gateway.
//!
//! [`EntityStore`] is the only contract the backend has with persistence.
//! Implementations are expected to synchronise internally; every call is a
//! point-in-time read or a single-record write.
//!
//! [`MemoryStore`] is the in-process implementation used by the test
//! bootstrap and the fixture server.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::entity::{EntityId, EntityRecord};
use crate::error::StoreError;
use crate::query::EntityQuery;

/// Query and single-record operations over persisted entities.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Return every record matching `query`, in storage order, stopping at
    /// the query's limit.
    async fn query(&self, query: &EntityQuery) -> Result<Vec<EntityRecord>, StoreError>;

    /// Fetch a record by id.
    async fn get(&self, id: &EntityId) -> Result<Option<EntityRecord>, StoreError>;

    /// Insert a new record. Fails if the id is taken.
    async fn insert(&self, record: EntityRecord) -> Result<(), StoreError>;

    /// Replace an existing record. Fails if the id is unknown.
    async fn update(&self, record: EntityRecord) -> Result<(), StoreError>;

    /// Delete a record. Returns `true` if it existed.
    async fn delete(&self, id: &EntityId) -> Result<bool, StoreError>;

    /// Remove every record.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// An in-memory [`EntityStore`] that keeps records in insertion order.
///
/// It also counts examined records and writes so tests can assert on early
/// termination and on the absence of side effects.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<EntityRecord>>,
    scanned: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records examined by queries so far.
    #[must_use]
    pub fn records_scanned(&self) -> u64 {
        self.scanned.load(Ordering::Relaxed)
    }

    /// Number of successful insert/update/delete calls so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<EntityRecord>, StoreError> {
        if query.is_vacuous() {
            return Ok(Vec::new());
        }

        let records = self.records.read().await;
        let limit = query.result_limit().unwrap_or(usize::MAX);
        let mut matched = Vec::new();
        let mut scanned = 0u64;

        for record in records.iter() {
            scanned += 1;
            if query.matches(record) {
                matched.push(record.clone());
                if matched.len() >= limit {
                    break;
                }
            }
        }

        self.scanned.fetch_add(scanned, Ordering::Relaxed);
        debug!(
            entity_type = query.entity_type(),
            scanned,
            matched = matched.len(),
            "memory store query"
        );
        Ok(matched)
    }

    async fn get(&self, id: &EntityId) -> Result<Option<EntityRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| &r.id == id).cloned())
    }

    async fn insert(&self, record: EntityRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        records.push(record);
        self.record_write();
        Ok(())
    }

    async fn update(&self, record: EntityRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| StoreError::NotFound(record.id.clone()))?;
        *slot = record;
        self.record_write();
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let Some(pos) = records.iter().position(|r| &r.id == id) else {
            return Ok(false);
        };
        records.remove(pos);
        self.record_write();
        Ok(true)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::entity::Entity;
    use crate::principal::PrincipalId;
    use crate::scope::EntityScope;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    impl Entity for Note {
        fn type_name() -> &'static str {
            "Note"
        }
    }

    fn note(owner: &str, text: &str) -> EntityRecord {
        EntityRecord::from_entity(
            EntityId::generate(),
            BTreeSet::from([PrincipalId::new(owner)]),
            &Note {
                text: text.to_string(),
            },
        )
        .unwrap()
    }

    fn scope_of(id: &str) -> EntityScope {
        EntityScope::from_ids([PrincipalId::new(id)])
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let record = note("a", "hello");
        let id = record.id.clone();
        store.insert(record.clone()).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), Some(record));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() {
        let store = MemoryStore::new();
        let record = note("a", "hello");
        store.insert(record.clone()).await.unwrap();
        assert!(matches!(
            store.insert(record).await,
            Err(StoreError::DuplicateId(_))
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update(note("a", "x")).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_record() {
        let store = MemoryStore::new();
        let mut record = note("a", "draft");
        store.insert(record.clone()).await.unwrap();
        record
            .attributes
            .insert("text".to_string(), serde_json::json!("final"));
        store.update(record.clone()).await.unwrap();
        let stored = store.get(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.attributes["text"], serde_json::json!("final"));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let record = note("a", "bye");
        let id = record.id.clone();
        store.insert(record).await.unwrap();
        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_query_respects_scope_and_order() {
        let store = MemoryStore::new();
        store.insert(note("a", "first")).await.unwrap();
        store.insert(note("b", "other")).await.unwrap();
        store.insert(note("a", "second")).await.unwrap();

        let found = store
            .query(&EntityQuery::scoped::<Note>(scope_of("a")))
            .await
            .unwrap();
        let texts: Vec<_> = found
            .iter()
            .map(|r| r.attributes["text"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_limit_stops_scanning() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.insert(note("a", &i.to_string())).await.unwrap();
        }
        let found = store
            .query(&EntityQuery::scoped::<Note>(scope_of("a")).limit(1))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(store.records_scanned(), 1);
    }

    #[tokio::test]
    async fn test_vacuous_query_touches_nothing() {
        let store = MemoryStore::new();
        store.insert(note("a", "x")).await.unwrap();
        let found = store
            .query(&EntityQuery::scoped::<Note>(EntityScope::empty()))
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(store.records_scanned(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = MemoryStore::new();
        store.insert(note("a", "x")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }
}
