//! Entity identity, the [`Entity`] trait and stored entity records.
//!
//! An [`EntityRecord`] is what the store persists: an id, a type name, the set
//! of principals the record belongs to, and a JSON attribute map. Game code
//! works with typed entities instead; any serde type that serialises to a map
//! can implement [`Entity`] and be converted to and from a record.

use std::collections::BTreeSet;
use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::principal::PrincipalId;

/// A unique entity identifier.
///
/// Identifiers are random UUIDs allocated by whoever creates the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier string.
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// The contract every typed entity satisfies.
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use backend_entity::Entity;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Inventory {
///     gold: u32,
/// }
///
/// impl Entity for Inventory {
///     fn type_name() -> &'static str { "Inventory" }
/// }
/// ```
pub trait Entity: Send + Sync + 'static + Serialize + DeserializeOwned {
    /// The stored type name. Queries for this entity type match on it.
    fn type_name() -> &'static str;
}

/// A persisted entity as the store sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// The record's identifier.
    pub id: EntityId,
    /// The entity type name (see [`Entity::type_name`]).
    pub entity_type: String,
    /// Principals this record is associated with.
    pub owners: BTreeSet<PrincipalId>,
    /// Attribute values keyed by attribute name.
    pub attributes: Map<String, Value>,
}

impl EntityRecord {
    /// Build a record from a typed entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotAnObject`] if the entity does not serialise
    /// to a map, or [`StoreError::Serialization`] if serialisation fails.
    pub fn from_entity<T: Entity>(
        id: EntityId,
        owners: BTreeSet<PrincipalId>,
        entity: &T,
    ) -> Result<Self, StoreError> {
        match serde_json::to_value(entity)? {
            Value::Object(attributes) => Ok(Self {
                id,
                entity_type: T::type_name().to_string(),
                owners,
                attributes,
            }),
            _ => Err(StoreError::NotAnObject(T::type_name().to_string())),
        }
    }

    /// Decode the attribute map into a typed entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TypeMismatch`] if the record holds another entity
    /// type, or [`StoreError::Serialization`] if the attributes don't fit `T`.
    pub fn to_entity<T: Entity>(&self) -> Result<T, StoreError> {
        if self.entity_type != T::type_name() {
            return Err(StoreError::TypeMismatch {
                expected: T::type_name().to_string(),
                found: self.entity_type.clone(),
            });
        }
        Ok(serde_json::from_value(Value::Object(self.attributes.clone()))?)
    }

    /// Returns `true` if `principal` is one of the record's owners.
    #[must_use]
    pub fn is_owned_by(&self, principal: &PrincipalId) -> bool {
        self.owners.contains(principal)
    }
}

/// A typed entity together with its store metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Persisted<T> {
    /// The record's identifier.
    pub id: EntityId,
    /// Principals the record is associated with.
    pub owners: BTreeSet<PrincipalId>,
    /// The decoded entity.
    pub entity: T,
}

impl<T: Entity> Persisted<T> {
    /// Decode a stored record.
    ///
    /// # Errors
    ///
    /// See [`EntityRecord::to_entity`].
    pub fn from_record(record: EntityRecord) -> Result<Self, StoreError> {
        let entity = record.to_entity()?;
        Ok(Self {
            id: record.id,
            owners: record.owners,
            entity,
        })
    }

    /// Unwrap the decoded entity.
    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Persisted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Wallet {
        gold: u32,
        label: String,
    }

    impl Entity for Wallet {
        fn type_name() -> &'static str {
            "Wallet"
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Banner(String);

    impl Entity for Banner {
        fn type_name() -> &'static str {
            "Banner"
        }
    }

    fn owners(ids: &[&str]) -> BTreeSet<PrincipalId> {
        ids.iter().map(|id| PrincipalId::new(*id)).collect()
    }

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn test_record_keeps_type_and_attributes() {
        let wallet = Wallet {
            gold: 12,
            label: "main".to_string(),
        };
        let record = EntityRecord::from_entity(EntityId::from_raw("w1"), owners(&["p1"]), &wallet)
            .unwrap();
        assert_eq!(record.entity_type, "Wallet");
        assert_eq!(record.attributes["gold"], serde_json::json!(12));
        assert!(record.is_owned_by(&PrincipalId::new("p1")));
        assert!(!record.is_owned_by(&PrincipalId::new("p2")));
        assert_eq!(record.to_entity::<Wallet>().unwrap(), wallet);
    }

    #[test]
    fn test_non_map_entity_is_rejected() {
        let result = EntityRecord::from_entity(
            EntityId::generate(),
            BTreeSet::new(),
            &Banner("hi".to_string()),
        );
        assert!(matches!(result, Err(StoreError::NotAnObject(name)) if name == "Banner"));
    }

    #[test]
    fn test_decoding_other_type_fails() {
        let record = EntityRecord {
            id: EntityId::generate(),
            entity_type: "Other".to_string(),
            owners: BTreeSet::new(),
            attributes: Map::new(),
        };
        assert!(matches!(
            record.to_entity::<Wallet>(),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_persisted_derefs_to_entity() {
        let record = EntityRecord::from_entity(
            EntityId::from_raw("w2"),
            owners(&["p1"]),
            &Wallet {
                gold: 3,
                label: "spare".to_string(),
            },
        )
        .unwrap();
        let persisted = Persisted::<Wallet>::from_record(record).unwrap();
        assert_eq!(persisted.gold, 3);
        assert_eq!(persisted.id.as_str(), "w2");
    }
}
