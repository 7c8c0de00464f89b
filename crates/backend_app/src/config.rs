//! Backend configuration.
//!
//! Every setting has a default and can be overridden from the environment
//! or with a `with_*` builder method. Environment variables:
//!
//! | variable | default |
//! |---|---|
//! | `NATS_URL` | `nats://localhost:4222` |
//! | `BACKEND_SUBJECT_PREFIX` | `backend` |
//! | `BACKEND_CALL_TIMEOUT_MS` | `5000` |
//! | `BACKEND_MAX_FAILED_LOGINS` | `5` |
//! | `BACKEND_LOCKOUT_SECS` | `300` |
//! | `BACKEND_SESSION_IDLE_SECS` | `1800` |

use std::str::FromStr;
use std::time::Duration;

use backend_auth::ThrottlePolicy;
use backend_net::connection::{DEFAULT_NATS_URL, NATS_URL_ENV};
use backend_net::subjects::DEFAULT_PREFIX;

use crate::error::ConfigError;
use crate::sessions::DEFAULT_SESSION_IDLE_TIMEOUT;

// ── Environment variables ───────────────────────────────────────────────────

pub const SUBJECT_PREFIX_ENV: &str = "BACKEND_SUBJECT_PREFIX";
pub const CALL_TIMEOUT_ENV: &str = "BACKEND_CALL_TIMEOUT_MS";
pub const MAX_FAILED_LOGINS_ENV: &str = "BACKEND_MAX_FAILED_LOGINS";
pub const LOCKOUT_ENV: &str = "BACKEND_LOCKOUT_SECS";
pub const SESSION_IDLE_ENV: &str = "BACKEND_SESSION_IDLE_SECS";

// ── Config ──────────────────────────────────────────────────────────────────

/// Default wait for a facet call reply over the network.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a backend application and its callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// NATS server URL.
    pub nats_url: String,
    /// Root prefix for facet call subjects.
    pub subject_prefix: String,
    /// How long the network caller waits for a reply.
    pub call_timeout: Duration,
    /// Login lockout policy.
    pub throttle: ThrottlePolicy,
    /// How long a stored session may go unused before it is forgotten.
    pub session_idle_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            nats_url: DEFAULT_NATS_URL.to_string(),
            subject_prefix: DEFAULT_PREFIX.to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            throttle: ThrottlePolicy::default(),
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }
}

impl BackendConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(NATS_URL_ENV) {
            config.nats_url = url;
        }
        if let Some(prefix) = lookup(SUBJECT_PREFIX_ENV) {
            config.subject_prefix = prefix;
        }
        if let Some(ms) = parse::<u64>(&lookup, CALL_TIMEOUT_ENV)? {
            config.call_timeout = Duration::from_millis(ms);
        }
        if let Some(max) = parse::<u32>(&lookup, MAX_FAILED_LOGINS_ENV)? {
            config.throttle.max_failed_attempts = max;
        }
        if let Some(secs) = parse::<u64>(&lookup, LOCKOUT_ENV)? {
            config.throttle.lockout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&lookup, SESSION_IDLE_ENV)? {
            config.session_idle_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Override the NATS URL.
    #[must_use]
    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = url.into();
        self
    }

    /// Override the subject prefix.
    #[must_use]
    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = prefix.into();
        self
    }

    /// Override the call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Override the login throttle.
    #[must_use]
    pub fn with_throttle(mut self, throttle: ThrottlePolicy) -> Self {
        self.throttle = throttle;
        self
    }

    /// Override the session idle timeout.
    #[must_use]
    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout;
        self
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}
