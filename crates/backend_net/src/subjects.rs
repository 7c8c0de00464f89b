//! NATS subject hierarchy.
//!
//! All backend subjects live under a configurable prefix (default
//! `backend`) to namespace within a shared NATS cluster.

/// Default root prefix for backend subjects.
pub const DEFAULT_PREFIX: &str = "backend";

// ── Facet calls ─────────────────────────────────────────────────────────────

/// Build the request/reply subject facet calls are sent on.
///
/// `<prefix>.facet.call`
#[must_use]
pub fn facet_call(prefix: &str) -> String {
    format!("{prefix}.facet.call")
}

/// Build the queue group shared by all server instances of a prefix, so
/// each call is handled by exactly one of them.
///
/// `q.<prefix>.facet`
#[must_use]
pub fn queue_group(prefix: &str) -> String {
    format!("q.{prefix}.facet")
}
