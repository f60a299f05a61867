//! Unified error types for the Dockboard workspace.
//!
//! Every layer returns [`DockboardError`]. The HTTP boundary maps each
//! variant to a status code; only [`DockboardError::ExternalService`] is
//! ever recovered locally (during description resolution).

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DockboardError {
    /// A container (or image) is unknown to the runtime.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The request is well-formed but cannot be carried out as asked.
    #[error("{message}")]
    Validation {
        /// Human-readable reason.
        message: String,
    },

    /// The runtime could not be reached, timed out, or answered with
    /// output that could not be understood.
    #[error("container runtime unavailable: {message}")]
    RuntimeUnavailable {
        /// Description of the gateway failure.
        message: String,
    },

    /// The text-generation capability failed.
    #[error("description service error: {message}")]
    ExternalService {
        /// Description of the upstream failure.
        message: String,
    },

    /// Another lifecycle operation is already running for this container.
    #[error("container {id} is busy with another operation")]
    Busy {
        /// Canonical id of the contended container.
        id: String,
    },

    /// The container was removed during an update and could not be
    /// recreated. The old container is gone.
    #[error("container {name} was removed but could not be recreated: {message}")]
    RecreateFailed {
        /// Name of the lost container.
        name: String,
        /// Underlying failure.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },
}

impl DockboardError {
    /// Shorthand for a missing container.
    #[must_use]
    pub fn container_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "container",
            id: id.into(),
        }
    }

    /// Shorthand for a gateway failure.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::RuntimeUnavailable {
            message: message.into(),
        }
    }

    /// Returns whether repeating the same request could succeed.
    ///
    /// Post-removal recreate failures are never retryable: the container
    /// they refer to no longer exists.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RuntimeUnavailable { .. } | Self::ExternalService { .. } | Self::Busy { .. }
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DockboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recreate_failure_is_not_retryable() {
        let err = DockboardError::RecreateFailed {
            name: "web".into(),
            message: "port already allocated".into(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("web"));
    }

    #[test]
    fn pre_removal_runtime_failure_is_retryable() {
        assert!(DockboardError::runtime("pull timed out").is_retryable());
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = DockboardError::Validation {
            message: "Cannot update container without image tag".into(),
        };
        assert_eq!(err.to_string(), "Cannot update container without image tag");
    }
}
