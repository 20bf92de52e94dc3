//! Component lifecycle runtime
//!
//! This crate provides a component container that records, for every
//! request, which component asked for which. The resulting dependency graph
//! is used to:
//! - reject dependency cycles before a constructor recurses into itself
//! - track instances shared between several requesters
//! - release components newest-first, children before their requester
//! - force-dispose whatever is still held when the container stops
//!
//! Construction, caching and teardown of the instances themselves are left
//! to pluggable [`ComponentProvider`]s.

pub mod builder;
pub mod config;
pub mod container;
pub mod error;
pub mod graph;
pub mod handle;
pub mod lifecycle;
pub mod manager;
pub mod provider;
pub mod security;
pub mod specification;

mod shared;

pub use builder::{ContainerBuilder, Module};
pub use config::{ContainerConfig, CycleDetection};
pub use container::{
    Container, ContainerRef, ContainerStats, DependencyTree, LifecycleHook, ReleaseOutcome,
};
pub use error::{DiError, DiResult};
pub use handle::{Component, InstanceHandle, InstanceKey};
pub use lifecycle::{Disposable, LifecycleState};
pub use manager::ComponentManager;
pub use provider::{
    ComponentProvider, RefCountedProvider, Requester, SingletonProvider, TransientProvider,
};
pub use security::{AllowAll, DenyList, PermissionRequest, SecurityPolicy};
pub use specification::{Specification, TraceEntry, CONTAINER_SPECIFICATION, DEFAULT_SCOPE};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        Component, ComponentManager, ComponentProvider, Container, ContainerBuilder, DiError,
        DiResult, Module, ReleaseOutcome, Specification,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_container() {
        let mut builder = ContainerBuilder::new("app");
        builder.register_singleton("greeting", |_| Ok("Hello, DI!".to_string()));

        let container = builder.start().unwrap();
        let greeting = container.request_as::<String>("greeting", None).unwrap();
        assert_eq!(greeting.as_str(), "Hello, DI!");
    }
}
