//! Authentication error types.

use backend_entity::StoreError;

/// Errors that can occur during login, logout or registration.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The email/password pair does not match a registered player.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Too many failed attempts for this email; retry after the lockout.
    #[error("too many failed login attempts for '{email}', retry in {retry_after_secs}s")]
    LockedOut {
        /// The normalised email that is locked.
        email: String,
        /// Seconds until the lockout ends.
        retry_after_secs: u64,
    },

    /// Registration used an email that already belongs to a player.
    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    /// The credentials are malformed (bad email, empty password).
    #[error("malformed credentials: {0}")]
    Malformed(String),

    /// A stored password hash could not be parsed.
    #[error("corrupt password hash for player {0}")]
    CorruptHash(String),

    /// Hashing a password failed, or the hashing task was lost.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The entity store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
