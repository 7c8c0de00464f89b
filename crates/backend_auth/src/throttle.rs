//! Failed-login throttling.
//!
//! Consecutive failures are counted per normalised email. Once the count
//! reaches the policy limit the email is locked until the lockout elapses. A
//! successful login clears the entry.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Throttling limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    /// Consecutive failures that trigger a lockout. Zero disables throttling.
    pub max_failed_attempts: u32,
    /// How long a lockout lasts.
    pub lockout: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Failures {
    count: u32,
    locked_until: Option<Instant>,
}

/// Per-email failure tracking.
#[derive(Debug, Default)]
pub struct LoginThrottle {
    policy: ThrottlePolicy,
    failures: DashMap<String, Failures>,
}

impl LoginThrottle {
    /// Create a throttle with the given policy.
    #[must_use]
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            failures: DashMap::new(),
        }
    }

    /// Returns the remaining lockout for `email`, if it is locked.
    #[must_use]
    pub fn lockout_remaining(&self, email: &str) -> Option<Duration> {
        let now = Instant::now();
        let entry = self.failures.get(email)?;
        let until = entry.locked_until?;
        (until > now).then(|| until - now)
    }

    /// Record a failed attempt. Returns `true` if this failure started a
    /// lockout.
    pub fn record_failure(&self, email: &str) -> bool {
        if self.policy.max_failed_attempts == 0 {
            return false;
        }
        let now = Instant::now();
        let mut entry = self.failures.entry(email.to_string()).or_insert(Failures {
            count: 0,
            locked_until: None,
        });
        // An expired lockout starts a fresh window.
        if entry.locked_until.is_some_and(|until| until <= now) {
            entry.count = 0;
            entry.locked_until = None;
        }
        entry.count += 1;
        if entry.count >= self.policy.max_failed_attempts {
            entry.locked_until = Some(now + self.policy.lockout);
            return true;
        }
        false
    }

    /// Forget all failures for `email`.
    pub fn reset(&self, email: &str) {
        self.failures.remove(email);
    }
}
