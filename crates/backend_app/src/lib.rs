//! # backend_app
//!
//! The explicit backend application object and the ways of reaching it.
//!
//! - [`Application`]: facet registry, entity store, authenticator and
//!   session repository, built once at startup.
//! - [`BackendConfig`]: environment-driven configuration.
//! - [`DirectCaller`]: in-process caller strategy.
//! - [`runtime`]: serve an application over NATS, or connect a client to one.

pub mod application;
pub mod config;
pub mod direct;
pub mod error;
pub mod runtime;
pub mod sessions;

pub use application::{Application, ApplicationBuilder};
pub use config::BackendConfig;
pub use direct::DirectCaller;
pub use error::ConfigError;
pub use sessions::SessionRepository;
