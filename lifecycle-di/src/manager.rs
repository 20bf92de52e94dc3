//! Per-node component manager

use crate::container::{Container, ContainerInner, ReleaseOutcome};
use crate::error::{DiError, DiResult};
use crate::graph::NodeId;
use crate::handle::{Component, InstanceKey};
use crate::specification::Specification;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Context handed to a component while it is being constructed.
///
/// Everything requested through a manager is recorded as a dependency of the
/// manager's own node, so cycle detection sees the real call chain and the
/// dependencies are released together with the component.
#[derive(Clone)]
pub struct ComponentManager {
    container: Weak<ContainerInner>,
    node: NodeId,
    specification: Specification,
    scope_id: Arc<str>,
}

impl ComponentManager {
    pub(crate) fn new(
        container: Weak<ContainerInner>,
        node: NodeId,
        specification: Specification,
        scope_id: Arc<str>,
    ) -> Self {
        Self {
            container,
            node,
            specification,
            scope_id,
        }
    }

    /// Specification of the component this manager belongs to
    pub fn specification(&self) -> &Specification {
        &self.specification
    }

    /// Scope the component was requested under
    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    fn container(&self) -> DiResult<Container> {
        self.container
            .upgrade()
            .map(Container::from_inner)
            .ok_or(DiError::ContainerDropped)
    }

    /// Request a dependency on behalf of this component
    pub fn request(
        &self,
        specification: impl Into<Specification>,
        scope_id: Option<&str>,
    ) -> DiResult<Component> {
        self.container()?
            .request_from(self, &specification.into(), scope_id)
    }

    /// Request a dependency and downcast it to `T`
    pub fn request_as<T: Any + Send + Sync>(
        &self,
        specification: impl Into<Specification>,
        scope_id: Option<&str>,
    ) -> DiResult<Arc<T>> {
        let specification = specification.into();
        let component = self.request(specification.clone(), scope_id)?;
        Container::downcast(&specification, component)
    }

    /// Release a dependency previously requested through this manager
    pub fn release<T: ?Sized>(&self, instance: &Arc<T>) -> DiResult<ReleaseOutcome> {
        Ok(self
            .container()?
            .release_from(self, InstanceKey::of(instance)))
    }

    /// Force-dispose a dependency previously requested through this manager
    pub fn dispose<T: ?Sized>(&self, instance: &Arc<T>) -> DiResult<bool> {
        Ok(self
            .container()?
            .dispose_from(self.node, InstanceKey::of(instance)))
    }

    /// Whether a provider for `specification` is visible from this component's container
    pub fn has(&self, specification: &str) -> bool {
        self.container
            .upgrade()
            .map(|inner| Container::from_inner(inner).has_component(specification))
            .unwrap_or(false)
    }
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("node", &self.node)
            .field("specification", &self.specification)
            .field("scope_id", &self.scope_id)
            .finish()
    }
}
