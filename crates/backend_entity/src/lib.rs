//! # backend_entity
//!
//! Persistence-facing primitives for the game backend.
//!
//! This crate provides:
//!
//! - [`Principal`] / [`PrincipalId`]: authenticated actor identity.
//! - [`Entity`] and [`EntityRecord`]: typed entities and their stored form.
//! - [`EntityScope`]: the deduplicated principal set a query is limited to.
//! - [`EntityQuery`]: declarative entity lookups with a mandatory scope.
//! - [`EntityStore`]: the store gateway, with [`MemoryStore`] in-process.
//! - [`EntityContext`]: scoped reads over a store.

pub mod context;
pub mod entity;
pub mod error;
pub mod principal;
pub mod query;
pub mod scope;
pub mod store;

pub use context::EntityContext;
pub use entity::{Entity, EntityId, EntityRecord, Persisted};
pub use error::StoreError;
pub use principal::{Principal, PrincipalId};
pub use query::{AttributeFilter, EntityQuery, QueryScope};
pub use scope::EntityScope;
pub use store::{EntityStore, MemoryStore};
