//! Principal identity.
//!
//! A [`Principal`] is an authenticated actor (a player). It carries nothing
//! but its stable [`PrincipalId`]; the access token that proves the identity
//! lives with the session that logged it in.

use serde::{Deserialize, Serialize};

/// A stable, unique principal identifier.
///
/// Player principals use the id of their player record in the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Wrap a raw identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    id: PrincipalId,
}

impl Principal {
    /// Create a principal with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<PrincipalId>) -> Self {
        Self { id: id.into() }
    }

    /// Returns the principal's identifier.
    #[must_use]
    pub fn id(&self) -> &PrincipalId {
        &self.id
    }
}
