//! Entity store error types.

use crate::entity::EntityId;

/// Errors that can occur while reading or writing entities.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with the given id exists.
    #[error("{0} not found")]
    NotFound(EntityId),

    /// A record with the given id already exists.
    #[error("{0} already exists")]
    DuplicateId(EntityId),

    /// A record of one entity type was decoded as another.
    #[error("expected entity type '{expected}', found '{found}'")]
    TypeMismatch {
        /// The requested type name.
        expected: String,
        /// The stored type name.
        found: String,
    },

    /// A typed entity did not serialise to an attribute map.
    #[error("entity type '{0}' does not serialise to an attribute map")]
    NotAnObject(String),

    /// Attribute (de)serialisation failed.
    #[error("attribute serialisation error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store reported a failure.
    #[error("store backend error: {0}")]
    Backend(String),
}
