//! Structured call faults.
//!
//! Every failed facet call resolves to a [`FacetFault`]: a [`FaultCategory`]
//! the caller can branch on plus a human-readable message. Faults are
//! serialisable so the network strategy can carry them unchanged.

use serde::{Deserialize, Serialize};

use backend_auth::AuthError;

/// The category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultCategory {
    /// Bad credentials or a locked-out login.
    Authentication,
    /// The session lacks the privilege the method requires.
    Authorization,
    /// No facet with the requested name is registered.
    FacetNotFound,
    /// The facet exists but has no method with the requested name.
    MethodNotFound,
    /// Wrong number or types of arguments.
    Argument,
    /// The method body failed.
    Execution,
    /// The call never reached the dispatcher or its reply could not be read.
    Transport,
}

impl std::fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Authentication => "AuthenticationError",
            Self::Authorization => "AuthorizationError",
            Self::FacetNotFound => "FacetNotFoundError",
            Self::MethodNotFound => "MethodNotFoundError",
            Self::Argument => "ArgumentError",
            Self::Execution => "ExecutionError",
            Self::Transport => "TransportError",
        };
        f.write_str(name)
    }
}

/// A categorised call failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{category}: {message}")]
pub struct FacetFault {
    /// What kind of failure this is.
    pub category: FaultCategory,
    /// Details for logs and developers.
    pub message: String,
}

impl FacetFault {
    /// Create a fault.
    #[must_use]
    pub fn new(category: FaultCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// The facet type is not registered.
    #[must_use]
    pub fn facet_not_found(facet: &str) -> Self {
        Self::new(
            FaultCategory::FacetNotFound,
            format!("facet '{facet}' is not registered"),
        )
    }

    /// The facet has no such method.
    #[must_use]
    pub fn method_not_found(facet: &str, method: &str) -> Self {
        Self::new(
            FaultCategory::MethodNotFound,
            format!("facet '{facet}' has no method '{method}'"),
        )
    }

    /// Arity or type mismatch.
    #[must_use]
    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(FaultCategory::Argument, message)
    }

    /// Missing privilege.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(FaultCategory::Authorization, message)
    }

    /// Method body failure.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(FaultCategory::Execution, message)
    }

    /// Transport failure.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FaultCategory::Transport, message)
    }

    /// Convert an error raised by a method body.
    ///
    /// Faults raised deliberately keep their category, authentication
    /// failures become [`FaultCategory::Authentication`], and everything else
    /// is an [`FaultCategory::Execution`] fault.
    #[must_use]
    pub fn from_method_error(err: &anyhow::Error) -> Self {
        if let Some(fault) = err.downcast_ref::<FacetFault>() {
            return fault.clone();
        }
        if let Some(auth) = err.downcast_ref::<AuthError>()
            && matches!(
                auth,
                AuthError::InvalidCredentials | AuthError::LockedOut { .. }
            )
        {
            return Self::new(FaultCategory::Authentication, auth.to_string());
        }
        Self::execution(format!("{err:#}"))
    }
}
