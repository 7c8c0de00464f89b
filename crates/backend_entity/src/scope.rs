//! Entity scopes.
//!
//! An [`EntityScope`] is the set of principals an entity query is restricted
//! to. It is built once from a list of principals and never changes; duplicate
//! principals collapse into one entry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::EntityRecord;
use crate::principal::{Principal, PrincipalId};

/// An immutable, deduplicated set of principal identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityScope {
    principals: BTreeSet<PrincipalId>,
}

impl EntityScope {
    /// Build a scope from an ordered collection of principals.
    #[must_use]
    pub fn new<'a>(principals: impl IntoIterator<Item = &'a Principal>) -> Self {
        Self::from_ids(principals.into_iter().map(|p| p.id().clone()))
    }

    /// Build a scope from principal identifiers.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = PrincipalId>) -> Self {
        Self {
            principals: ids.into_iter().collect(),
        }
    }

    /// The scope that admits nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if the principal is part of this scope.
    #[must_use]
    pub fn contains(&self, id: &PrincipalId) -> bool {
        self.principals.contains(id)
    }

    /// Returns `true` if at least one owner of `record` is in this scope.
    #[must_use]
    pub fn admits(&self, record: &EntityRecord) -> bool {
        record.owners.iter().any(|owner| self.contains(owner))
    }

    /// Returns `true` if the scope has no principals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    /// Returns the number of distinct principals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// Iterate over the principal identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &PrincipalId> {
        self.principals.iter()
    }
}
