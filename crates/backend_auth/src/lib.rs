//! # backend_auth
//!
//! Session and authentication state for the game backend.
//!
//! This crate provides:
//!
//! - [`Session`]: at most one logged-in principal plus its [`AccessToken`].
//! - [`Authenticator`]: login, logout and registration against the entity
//!   store, with salted password hashes and [`LoginThrottle`] lockouts.
//! - [`Credentials`]: email/password input with normalisation and checks.
//! - [`AuthError`]: authentication error types.

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod session;
pub mod throttle;

pub use authenticator::{Authenticator, Player};
pub use credentials::{Credentials, PasswordHash};
pub use error::AuthError;
pub use session::{AccessToken, Authenticated, Session, SessionId};
pub use throttle::{LoginThrottle, ThrottlePolicy};
