//! Error types for the component container

use crate::specification::{Specification, TraceEntry};
use thiserror::Error;

/// Result type alias for container operations
pub type DiResult<T> = Result<T, DiError>;

/// Errors that can occur while requesting, registering or tearing down components
#[derive(Error, Debug)]
pub enum DiError {
    /// No provider for the specification anywhere up the container chain
    #[error("Component not available: {specification}")]
    NotAvailable { specification: Specification },

    /// A provider is already registered for the specification in this container
    #[error("Component {specification} is already registered in container '{container}'")]
    DuplicateRegistration {
        specification: Specification,
        container: String,
    },

    /// The security chain vetoed the request
    #[error("Permission denied: {requester} may not request {target} [{scope_id}]: {reason}")]
    PermissionDenied {
        requester: Specification,
        target: Specification,
        scope_id: String,
        reason: String,
    },

    /// The requested component is already being constructed further up the chain
    #[error("Circular dependency detected: {path}")]
    DependencyCycle {
        path: String,
        /// Every hop of the requester chain, outermost first, ending with the request
        chain: Vec<TraceEntry>,
    },

    #[error("Container '{container}' has not been started")]
    NotStarted { container: String },

    #[error("Container '{container}' is already started")]
    AlreadyStarted { container: String },

    #[error("Container '{container}' has already been stopped")]
    AlreadyStopped { container: String },

    /// Providers can only be added before the container starts
    #[error("Container '{container}' no longer accepts registrations")]
    RegistrationClosed { container: String },

    /// The provider or its factory failed to produce an instance
    #[error("Failed to create component {specification}: {reason}")]
    ComponentCreationFailed {
        specification: Specification,
        reason: String,
    },

    /// A typed request asked for the wrong concrete type
    #[error("Component {specification} is not a {expected}")]
    TypeMismatch {
        specification: Specification,
        expected: &'static str,
    },

    /// A component manager was used after its own node was released
    #[error("Requester {specification} has already been released")]
    RequesterReleased { specification: Specification },

    /// A component manager outlived the container that created it
    #[error("Container has been dropped")]
    ContainerDropped,

    /// Configuration error
    #[cfg(feature = "config")]
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DiError {
    /// Shorthand for factories reporting a construction failure
    pub fn creation_failed(specification: &Specification, reason: impl Into<String>) -> Self {
        DiError::ComponentCreationFailed {
            specification: specification.clone(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from the cycle detector
    pub fn is_cycle(&self) -> bool {
        matches!(self, DiError::DependencyCycle { .. })
    }
}
