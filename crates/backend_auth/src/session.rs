//! Session state.
//!
//! A [`Session`] holds at most one logged-in principal together with its
//! access token. Both live in a single `Option`, so a principal without a
//! token (or the reverse) cannot be represented. Reads are concurrent; writes
//! go through [`crate::Authenticator`], which holds the session's write gate
//! for the whole login/logout/register operation so writers never interleave.

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, RwLock};

use backend_entity::Principal;

/// Identifies one session across calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Allocate a fresh random session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing session id string.
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque token proving a principal's login.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Issue a fresh random token.
    #[must_use]
    pub fn issue() -> Self {
        Self(format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Wrap an existing token string.
    #[must_use]
    pub fn from_raw(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// A logged-in principal and the token it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The logged-in principal.
    pub principal: Principal,
    /// The token issued at login.
    pub token: AccessToken,
}

/// One session: who (if anyone) is logged in.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: RwLock<Option<Authenticated>>,
    write_gate: Mutex<()>,
}

impl Session {
    /// Create a logged-out session.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: RwLock::new(None),
            write_gate: Mutex::new(()),
        }
    }

    /// Returns this session's id.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns `true` if a principal is logged in.
    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Returns the logged-in principal, if any.
    pub async fn principal(&self) -> Option<Principal> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|auth| auth.principal.clone())
    }

    /// Returns the current access token, if any.
    pub async fn access_token(&self) -> Option<AccessToken> {
        self.state.read().await.as_ref().map(|auth| auth.token.clone())
    }

    /// Returns a consistent copy of principal and token.
    pub async fn snapshot(&self) -> Option<Authenticated> {
        self.state.read().await.clone()
    }

    /// Serialise writers. Held by the authenticator across a whole operation.
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    pub(crate) async fn set(&self, _gate: &MutexGuard<'_, ()>, auth: Authenticated) {
        *self.state.write().await = Some(auth);
    }

    pub(crate) async fn clear(&self, _gate: &MutexGuard<'_, ()>) {
        *self.state.write().await = None;
    }
}
