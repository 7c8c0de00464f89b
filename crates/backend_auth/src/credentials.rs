//! Email/password credentials and password hashing.
//!
//! Passwords are never stored. A [`PasswordHash`] is an Argon2id hash with
//! default parameters and a random salt, kept in PHC string format so the
//! parameters travel with the hash.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

const ALGORITHM: &str = "argon2id";

/// An email/password pair as supplied by a player.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The player's email address.
    pub email: String,
    /// The plaintext password.
    pub password: String,
}

// Keep passwords out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The email trimmed and lower-cased, as used for storage and lookup.
    #[must_use]
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }

    /// Check the credentials are well formed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] if the email lacks an `@` or the
    /// password is empty.
    pub fn validate(&self) -> Result<(), AuthError> {
        let email = self.normalized_email();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(AuthError::Malformed(format!("invalid email '{email}'"))),
        }
        if self.password.is_empty() {
            return Err(AuthError::Malformed("empty password".to_string()));
        }
        Ok(())
    }
}

/// Trim and lower-case an email address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A stored password hash in PHC string format
/// (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    phc: String,
}

impl PasswordHash {
    /// Hash a password with Argon2id and a fresh random salt.
    ///
    /// This is CPU-bound; async callers should run it on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hashing`] if Argon2 rejects the input.
    pub fn generate(password: &str) -> Result<Self, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();
        Ok(Self { phc })
    }

    /// Parse a stored hash. Only Argon2id hashes are accepted.
    #[must_use]
    pub fn parse(encoded: &str) -> Option<Self> {
        let parsed = PhcString::new(encoded).ok()?;
        if parsed.algorithm.as_str() != ALGORITHM || parsed.hash.is_none() {
            return None;
        }
        Some(Self {
            phc: encoded.to_string(),
        })
    }

    /// The PHC string to store.
    #[must_use]
    pub fn encode(&self) -> String {
        self.phc.clone()
    }

    /// Returns `true` if `password` matches. The comparison is constant-time.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        PhcString::new(&self.phc)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}
