//! Container lifecycle and component teardown

use std::fmt;

/// Lifecycle of a container. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Constructed; providers may still be added
    #[default]
    Created,
    /// Started; components can be requested
    Running,
    /// Stopped; every component has been released or disposed
    Stopped,
}

impl LifecycleState {
    pub fn is_running(self) -> bool {
        self == LifecycleState::Running
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Created => write!(f, "Created"),
            LifecycleState::Running => write!(f, "Running"),
            LifecycleState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Trait for components that hold resources to release on teardown
pub trait Disposable {
    /// Dispose of any resources held by the component
    fn dispose(&self);
}

/// Teardown callback used by the built-in providers
pub type Teardown<T> = std::sync::Arc<dyn Fn(&T) + Send + Sync>;
