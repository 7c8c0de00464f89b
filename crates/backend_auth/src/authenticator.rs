//! Player login, logout and registration.
//!
//! Players are stored as [`Player`] entities owned by themselves; the player
//! record's id doubles as the principal id. Every operation that changes a
//! session holds that session's write gate for its full duration, so the
//! principal/token pair is always replaced atomically and a failed login
//! leaves the session exactly as it was.
//!
//! Registration is additionally serialised across all sessions, so the
//! duplicate-email check and the insert cannot interleave with another
//! registration for the same email. Argon2 work runs on the blocking pool.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use backend_entity::{Entity, EntityId, EntityQuery, EntityRecord, EntityStore, Principal, PrincipalId};

use crate::credentials::{Credentials, PasswordHash, normalize_email};
use crate::error::AuthError;
use crate::session::{AccessToken, Authenticated, Session};
use crate::throttle::{LoginThrottle, ThrottlePolicy};

/// A registered player account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Normalised email address.
    pub email: String,
    /// Encoded [`PasswordHash`].
    pub password_hash: String,
}

impl Entity for Player {
    fn type_name() -> &'static str {
        "Player"
    }
}

/// Performs authentication against the entity store.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn EntityStore>,
    throttle: Arc<LoginThrottle>,
    registration: Arc<Mutex<()>>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Create an authenticator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, policy: ThrottlePolicy) -> Self {
        Self {
            store,
            throttle: Arc::new(LoginThrottle::new(policy)),
            registration: Arc::new(Mutex::new(())),
        }
    }

    /// Verify credentials and log the matching player into `session`.
    ///
    /// On success any previously logged-in principal is replaced. On failure
    /// the session is left untouched.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Malformed`] for malformed credentials.
    /// - [`AuthError::LockedOut`] while the email is throttled.
    /// - [`AuthError::InvalidCredentials`] if no player matches.
    /// - [`AuthError::Hashing`] if the password check cannot run.
    /// - [`AuthError::Store`] if the store fails.
    pub async fn login(
        &self,
        session: &Session,
        credentials: &Credentials,
    ) -> Result<Principal, AuthError> {
        credentials.validate()?;
        let email = credentials.normalized_email();

        if let Some(remaining) = self.throttle.lockout_remaining(&email) {
            warn!(email, session = %session.id(), "login rejected, email locked out");
            return Err(AuthError::LockedOut {
                email,
                retry_after_secs: remaining.as_secs().max(1),
            });
        }

        let gate = session.lock_writes().await;

        let Some(record) = self.find_player(&email).await? else {
            self.note_failure(&email, session);
            return Err(AuthError::InvalidCredentials);
        };
        let player: Player = record.to_entity()?;
        let hash = PasswordHash::parse(&player.password_hash)
            .ok_or_else(|| AuthError::CorruptHash(record.id.as_str().to_string()))?;
        if !verify_password(hash, &credentials.password).await? {
            self.note_failure(&email, session);
            return Err(AuthError::InvalidCredentials);
        }

        self.throttle.reset(&email);
        let principal = Principal::new(record.id.as_str());
        session
            .set(
                &gate,
                Authenticated {
                    principal: principal.clone(),
                    token: AccessToken::issue(),
                },
            )
            .await;
        info!(principal = %principal.id(), session = %session.id(), "player logged in");
        Ok(principal)
    }

    /// Log out whoever is logged into `session`. Always succeeds.
    pub async fn logout(&self, session: &Session) {
        let gate = session.lock_writes().await;
        if let Some(previous) = session.principal().await {
            info!(principal = %previous.id(), session = %session.id(), "player logged out");
        }
        session.clear(&gate).await;
    }

    /// Create a new player account. Does not log anyone in.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Malformed`] for malformed credentials.
    /// - [`AuthError::EmailTaken`] if the email is registered already.
    /// - [`AuthError::Hashing`] if the password cannot be hashed.
    /// - [`AuthError::Store`] if the store fails.
    pub async fn register(
        &self,
        session: &Session,
        credentials: &Credentials,
    ) -> Result<Principal, AuthError> {
        credentials.validate()?;
        let email = credentials.normalized_email();
        let password_hash = hash_password(credentials.password.clone()).await?;

        // Holding the gate keeps registration ordered with logins on this
        // session; the session state itself is not touched.
        let _gate = session.lock_writes().await;
        let _registering = self.registration.lock().await;

        if self.find_player(&email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let id = EntityId::generate();
        let principal = Principal::new(id.as_str());
        let player = Player {
            email: email.clone(),
            password_hash: password_hash.encode(),
        };
        let record = EntityRecord::from_entity(id, BTreeSet::from([principal.id().clone()]), &player)?;
        self.store.insert(record).await?;

        info!(principal = %principal.id(), "player registered");
        Ok(principal)
    }

    /// Log `principal` into `session` without checking credentials.
    ///
    /// Used by the test bootstrap to act as a player.
    pub async fn login_as(&self, session: &Session, principal: Principal) {
        let gate = session.lock_writes().await;
        info!(principal = %principal.id(), session = %session.id(), "acting as player");
        session
            .set(
                &gate,
                Authenticated {
                    principal,
                    token: AccessToken::issue(),
                },
            )
            .await;
    }

    /// Look up the principal registered under `email`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the store fails.
    pub async fn principal_for_email(&self, email: &str) -> Result<Option<Principal>, AuthError> {
        let record = self.find_player(&normalize_email(email)).await?;
        Ok(record.map(|r| Principal::new(PrincipalId::new(r.id.as_str()))))
    }

    async fn find_player(&self, email: &str) -> Result<Option<EntityRecord>, AuthError> {
        let query = EntityQuery::unrestricted::<Player>()
            .filter_eq("email", email)
            .limit(1);
        Ok(self.store.query(&query).await?.pop())
    }

    fn note_failure(&self, email: &str, session: &Session) {
        let locked = self.throttle.record_failure(email);
        warn!(email, session = %session.id(), locked, "login failed");
    }
}

async fn hash_password(password: String) -> Result<PasswordHash, AuthError> {
    tokio::task::spawn_blocking(move || PasswordHash::generate(&password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
}

async fn verify_password(hash: PasswordHash, password: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash.verify(&password))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))
}
