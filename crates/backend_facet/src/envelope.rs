//! Call request and response envelopes.
//!
//! These are the only types that cross the caller/dispatcher boundary, for
//! both the network and the direct strategy. A response holds exactly one of
//! a success value or a fault.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use backend_auth::SessionId;

use crate::fault::FacetFault;

/// One facet call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// The facet type name.
    pub facet: String,
    /// The method name on that facet.
    pub method: String,
    /// Positional arguments.
    pub args: Vec<Value>,
    /// The caller's session, if it has one yet.
    pub session_id: Option<SessionId>,
}

impl CallRequest {
    /// Create a request without a session id.
    #[must_use]
    pub fn new(facet: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            facet: facet.into(),
            method: method.into(),
            args,
            session_id: None,
        }
    }

    /// Attach a session id.
    #[must_use]
    pub fn with_session(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// The result half of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// The method's return value.
    Success(Value),
    /// Why the call failed.
    Fault(FacetFault),
}

impl CallOutcome {
    /// Convert into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the carried fault.
    pub fn into_result(self) -> Result<Value, FacetFault> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Fault(fault) => Err(fault),
        }
    }
}

impl From<Result<Value, FacetFault>> for CallOutcome {
    fn from(result: Result<Value, FacetFault>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(fault) => Self::Fault(fault),
        }
    }
}

/// The reply to a [`CallRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    /// Success value or fault.
    pub outcome: CallOutcome,
    /// The session the call ran in; the caller sends it on its next call.
    pub session_id: Option<SessionId>,
}
