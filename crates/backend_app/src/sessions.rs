//! Server-side session repository.
//!
//! Callers identify their session by the id returned in responses. Only
//! sessions worth remembering are stored: the application adds one when a
//! call leaves it logged in. A call without an id, or with an id the server
//! does not know (for example after a restart or expiry), runs in a fresh
//! logged-out session that is dropped afterwards unless it logged in.
//!
//! Sessions idle for longer than the configured timeout are treated as
//! unknown and removed, lazily on lookup and in bulk by [`evict_idle`].
//!
//! [`evict_idle`]: SessionRepository::evict_idle

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use backend_auth::{Session, SessionId};

/// Default idle time after which a stored session is forgotten.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
struct Tracked {
    session: Arc<Session>,
    last_seen: Instant,
}

impl Tracked {
    fn is_idle(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Stored sessions, keyed by id.
#[derive(Debug)]
pub struct SessionRepository {
    sessions: DashMap<SessionId, Tracked>,
    idle_timeout: Duration,
}

impl Default for SessionRepository {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE_TIMEOUT)
    }
}

impl SessionRepository {
    /// Create an empty repository that forgets sessions idle for longer
    /// than `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    /// The configured idle timeout.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Return the stored session for `id`, creating and storing a fresh one
    /// if `id` is absent, unknown or expired.
    pub fn resolve(&self, id: Option<&SessionId>) -> Arc<Session> {
        if let Some(session) = id.and_then(|id| self.get(id)) {
            return session;
        }
        let session = Arc::new(Session::new(SessionId::generate()));
        self.insert(Arc::clone(&session));
        session
    }

    /// Look up a live session and mark it as used.
    ///
    /// An expired session is removed and reported as unknown.
    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        {
            let mut entry = self.sessions.get_mut(id)?;
            if !entry.is_idle(self.idle_timeout) {
                entry.last_seen = Instant::now();
                return Some(Arc::clone(&entry.session));
            }
        }
        let timeout = self.idle_timeout;
        if self
            .sessions
            .remove_if(id, |_, tracked| tracked.is_idle(timeout))
            .is_some()
        {
            debug!(session = %id, "session expired");
        }
        None
    }

    /// Store `session`. An already stored session with the same id is kept.
    pub fn insert(&self, session: Arc<Session>) {
        self.sessions
            .entry(session.id().clone())
            .or_insert_with(|| {
                debug!(session = %session.id(), "session stored");
                Tracked {
                    session: Arc::clone(&session),
                    last_seen: Instant::now(),
                }
            });
    }

    /// Forget every session idle for longer than the timeout. Returns how
    /// many were removed.
    pub fn evict_idle(&self) -> usize {
        let before = self.sessions.len();
        let timeout = self.idle_timeout;
        self.sessions.retain(|_, tracked| !tracked.is_idle(timeout));
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.sessions.len(), "idle sessions evicted");
        }
        evicted
    }

    /// Forget a session. Returns `true` if it existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Forget every session.
    pub fn clear(&self) {
        self.sessions.clear();
    }

    /// Returns the number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
