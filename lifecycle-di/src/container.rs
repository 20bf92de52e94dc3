//! Core container implementation
//!
//! The container owns the provider registry, the shared-instance table and a
//! [`DependencyGraph`] rooted at the container's own node. Every request
//! creates a node under its requester, so the graph mirrors the actual call
//! tree; release and stop walk that graph to hand instances back to their
//! providers in reverse order of acquisition.
//!
//! Locks are never held across a provider call. A component under
//! construction may request further components through its
//! [`ComponentManager`], which re-enters the container on the same thread.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, trace, warn};

use crate::config::{ContainerConfig, CycleDetection};
use crate::error::{DiError, DiResult};
use crate::graph::{DependencyGraph, NodeId};
use crate::handle::{Component, InstanceHandle, InstanceKey};
use crate::lifecycle::LifecycleState;
use crate::manager::ComponentManager;
use crate::provider::{ComponentProvider, Requester};
use crate::security::{PermissionRequest, SecurityPolicy};
use crate::shared::{SharedEntry, SharedInstanceTable};
use crate::specification::{format_chain, Specification, TraceEntry};

/// Hook run after a container starts or stops
pub type LifecycleHook = Arc<dyn Fn(&Container) -> DiResult<()> + Send + Sync>;

/// Outcome of releasing a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The provider confirmed the instance is gone; its dependencies were released too
    Released,
    /// The provider still holds the instance (singleton or other holders)
    Retained,
    /// The instance was not requested through this requester
    Unknown,
}

/// Snapshot of container bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStats {
    /// Nodes in the dependency graph, including the container's root node
    pub live_nodes: usize,
    /// Entries in the shared-instance table
    pub shared_instances: usize,
    /// Locally registered providers, including the container's own
    pub providers: usize,
}

/// A component and everything it requested, in request order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
    pub specification: Specification,
    pub scope_id: String,
    pub dependencies: Vec<DependencyTree>,
}

/// Weak reference to a container, exposed as the `container` component
#[derive(Clone)]
pub struct ContainerRef {
    inner: Weak<ContainerInner>,
    name: String,
}

impl ContainerRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The container, if it is still alive
    pub fn container(&self) -> Option<Container> {
        self.inner.upgrade().map(Container::from_inner)
    }
}

impl fmt::Debug for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRef").field("name", &self.name).finish()
    }
}

/// Bootstrap provider exposing the container as a component.
///
/// Its instance is never released and disposing it does nothing: the
/// container's own lifecycle is driven by `start`/`stop` only.
struct ContainerProvider {
    handle: Arc<InstanceHandle>,
}

impl ComponentProvider for ContainerProvider {
    fn request(
        &self,
        _scope_id: &str,
        _requester: &Requester<'_>,
        _manager: &ComponentManager,
    ) -> DiResult<Arc<InstanceHandle>> {
        Ok(self.handle.clone())
    }

    fn release(&self, _handle: &InstanceHandle, _manager: &ComponentManager) -> bool {
        false
    }

    fn dispose(&self, _handle: &InstanceHandle, _manager: &ComponentManager) -> DiResult<()> {
        Ok(())
    }
}

/// Payload of a dependency node
pub(crate) struct NodeBinding {
    provider: Arc<dyn ComponentProvider>,
    specification: Specification,
    scope_id: Arc<str>,
    manager: ComponentManager,
    handle: Option<Arc<InstanceHandle>>,
}

impl NodeBinding {
    fn handle(&self) -> &Arc<InstanceHandle> {
        self.handle.as_ref().unwrap_or_else(|| {
            panic!(
                "instance handle of {}[{}] read before it was set",
                self.specification, self.scope_id
            )
        })
    }

    fn set_handle(&mut self, handle: Arc<InstanceHandle>) {
        assert!(
            self.handle.is_none(),
            "instance handle of {}[{}] already set",
            self.specification,
            self.scope_id
        );
        self.handle = Some(handle);
    }

    fn key(&self) -> Option<InstanceKey> {
        self.handle.as_ref().map(|handle| handle.key())
    }
}

struct ContainerState {
    lifecycle: LifecycleState,
    registry: FxHashMap<Specification, Arc<dyn ComponentProvider>>,
    table: SharedInstanceTable,
    graph: DependencyGraph<NodeBinding>,
    root: NodeId,
}

impl ContainerState {
    fn ensure_running(&self, container: &str) -> DiResult<()> {
        match self.lifecycle {
            LifecycleState::Running => Ok(()),
            LifecycleState::Created => Err(DiError::NotStarted {
                container: container.to_string(),
            }),
            LifecycleState::Stopped => Err(DiError::AlreadyStopped {
                container: container.to_string(),
            }),
        }
    }

    fn is_live(&self, node: NodeId) -> bool {
        self.graph.get(node).map_or(false, |entry| !entry.is_disposed())
    }

    /// Fail if `specification` already appears in the requester chain
    fn detect_cycle(
        &self,
        requester: NodeId,
        specification: &Specification,
        scope_id: &str,
        mode: CycleDetection,
    ) -> DiResult<()> {
        let mut chain = Vec::new();
        let mut cycle = false;
        for (id, node) in self.graph.source_chain(requester) {
            if id == self.root {
                break;
            }
            let binding = node.data();
            if binding.specification == *specification
                && (mode == CycleDetection::Strict || &*binding.scope_id == scope_id)
            {
                cycle = true;
            }
            chain.push(TraceEntry {
                specification: binding.specification.clone(),
                scope_id: binding.scope_id.to_string(),
            });
        }

        if !cycle {
            return Ok(());
        }
        chain.reverse();
        chain.push(TraceEntry {
            specification: specification.clone(),
            scope_id: scope_id.to_string(),
        });
        Err(DiError::DependencyCycle {
            path: format_chain(&chain),
            chain,
        })
    }

    /// Manager of `node`, or of the root if the node is gone
    fn manager_of(&self, node: NodeId) -> ComponentManager {
        self.graph
            .get(node)
            .unwrap_or_else(|| &self.graph[self.root])
            .data()
            .manager
            .clone()
    }

    /// Free `node` once nothing refers to it any more
    fn reclaim(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        let Some(entry) = self.graph.get(node) else {
            return;
        };
        if entry.is_linked() || entry.target().is_some() {
            return;
        }
        if let Some(key) = entry.data().key() {
            if self.table.owner(key) == Some(node) {
                return;
            }
        }
        self.graph.remove(node);
    }

    fn tree(&self, node: NodeId) -> DependencyTree {
        let binding = self.graph[node].data();
        DependencyTree {
            specification: binding.specification.clone(),
            scope_id: binding.scope_id.to_string(),
            dependencies: self
                .graph
                .children(node)
                .into_iter()
                .map(|child| self.tree(child))
                .collect(),
        }
    }
}

/// Everything needed to assemble a container
pub(crate) struct ContainerSettings {
    pub config: ContainerConfig,
    pub parent: Option<Container>,
    pub security: Option<Arc<dyn SecurityPolicy>>,
    pub on_start: Option<LifecycleHook>,
    pub on_stop: Option<LifecycleHook>,
}

impl ContainerSettings {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            parent: None,
            security: None,
            on_start: None,
            on_stop: None,
        }
    }
}

pub(crate) struct ContainerInner {
    config: ContainerConfig,
    parent: Option<Container>,
    security: Option<Arc<dyn SecurityPolicy>>,
    on_start: Option<LifecycleHook>,
    on_stop: Option<LifecycleHook>,
    root_manager: ComponentManager,
    /// Serializes start and stop
    lifecycle: Mutex<()>,
    state: RwLock<ContainerState>,
}

/// Thread-safe component container
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create an empty container with default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(ContainerConfig::named(name))
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self::from_settings(ContainerSettings::new(config))
    }

    /// Create a container builder
    pub fn builder(name: impl Into<String>) -> crate::builder::ContainerBuilder {
        crate::builder::ContainerBuilder::new(name)
    }

    /// Create an empty child container delegating lookups to this one
    pub fn new_child(&self, name: impl Into<String>) -> Container {
        let mut settings = ContainerSettings::new(ContainerConfig {
            name: name.into(),
            ..self.inner.config.clone()
        });
        settings.parent = Some(self.clone());
        Self::from_settings(settings)
    }

    pub(crate) fn from_settings(settings: ContainerSettings) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<ContainerInner>| {
            let specification = Specification::container();
            let scope_id: Arc<str> = Arc::from(settings.config.default_scope.as_str());
            let own_ref = ContainerRef {
                inner: weak.clone(),
                name: settings.config.name.clone(),
            };
            let handle = Arc::new(InstanceHandle::new(scope_id.clone(), Arc::new(own_ref)));
            let bootstrap: Arc<dyn ComponentProvider> = Arc::new(ContainerProvider {
                handle: handle.clone(),
            });

            let mut graph = DependencyGraph::new();
            let root = graph.insert_with(|id| NodeBinding {
                provider: bootstrap.clone(),
                specification: specification.clone(),
                scope_id: scope_id.clone(),
                manager: ComponentManager::new(
                    weak.clone(),
                    id,
                    specification.clone(),
                    scope_id.clone(),
                ),
                handle: Some(handle),
            });
            let root_manager = graph[root].data().manager.clone();

            let mut registry = FxHashMap::default();
            registry.insert(specification, bootstrap);

            ContainerInner {
                config: settings.config,
                parent: settings.parent,
                security: settings.security,
                on_start: settings.on_start,
                on_stop: settings.on_stop,
                root_manager,
                lifecycle: Mutex::new(()),
                state: RwLock::new(ContainerState {
                    lifecycle: LifecycleState::Created,
                    registry,
                    table: SharedInstanceTable::new(),
                    graph,
                    root,
                }),
            }
        });
        debug!("Created container '{}'", inner.config.name);
        Container { inner }
    }

    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Container { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.inner.state.read().lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle_state().is_running()
    }

    /// Register a provider. Only allowed before the container starts.
    pub fn add_provider(
        &self,
        specification: impl Into<Specification>,
        provider: Arc<dyn ComponentProvider>,
    ) -> DiResult<()> {
        let specification = specification.into();
        let mut state = self.inner.state.write();
        if state.lifecycle != LifecycleState::Created {
            return Err(DiError::RegistrationClosed {
                container: self.name().to_string(),
            });
        }
        if state.registry.contains_key(&specification) {
            return Err(DiError::DuplicateRegistration {
                specification,
                container: self.name().to_string(),
            });
        }
        debug!("Registered {} in container '{}'", specification, self.name());
        state.registry.insert(specification, provider);
        Ok(())
    }

    /// Whether a provider for `specification` is visible from this container
    pub fn has_component(&self, specification: &str) -> bool {
        self.inner.state.read().registry.contains_key(specification)
            || self
                .inner
                .parent
                .as_ref()
                .map_or(false, |parent| parent.has_component(specification))
    }

    /// Request a component directly from the container
    pub fn request_component(
        &self,
        specification: impl Into<Specification>,
        scope_id: Option<&str>,
    ) -> DiResult<Component> {
        self.request_from(&self.inner.root_manager, &specification.into(), scope_id)
    }

    /// Request a component and downcast it to `T`
    pub fn request_as<T: Any + Send + Sync>(
        &self,
        specification: impl Into<Specification>,
        scope_id: Option<&str>,
    ) -> DiResult<Arc<T>> {
        let specification = specification.into();
        let component = self.request_component(specification.clone(), scope_id)?;
        Self::downcast(&specification, component)
    }

    /// Release a component obtained from [`Container::request_component`]
    pub fn release_component<T: ?Sized>(&self, instance: &Arc<T>) -> ReleaseOutcome {
        self.release_from(&self.inner.root_manager, InstanceKey::of(instance))
    }

    /// Force-dispose a component obtained from [`Container::request_component`]
    /// together with everything it requested. Returns `false` for unknown instances.
    pub fn dispose_component<T: ?Sized>(&self, instance: &Arc<T>) -> bool {
        self.dispose_from(self.inner.root_manager.node(), InstanceKey::of(instance))
    }

    /// Open the container for requests, then run the `on_start` hook.
    ///
    /// Hooks run after the lifecycle lock is released, so they may call
    /// `stop()` themselves.
    pub fn start(&self) -> DiResult<()> {
        let guard = self.inner.lifecycle.lock();
        {
            let mut state = self.inner.state.write();
            match state.lifecycle {
                LifecycleState::Created => state.lifecycle = LifecycleState::Running,
                LifecycleState::Running => {
                    return Err(DiError::AlreadyStarted {
                        container: self.name().to_string(),
                    })
                }
                LifecycleState::Stopped => {
                    return Err(DiError::AlreadyStopped {
                        container: self.name().to_string(),
                    })
                }
            }
        }
        info!("Started container '{}'", self.name());
        drop(guard);

        match &self.inner.on_start {
            Some(hook) => hook(self),
            None => Ok(()),
        }
    }

    /// Release everything requested through this container, then force-dispose
    /// whatever is still held. The container is marked stopped before the walk
    /// starts, so a failed stop is never retried.
    pub fn stop(&self) -> DiResult<()> {
        let guard = self.inner.lifecycle.lock();
        let root = {
            let mut state = self.inner.state.write();
            match state.lifecycle {
                LifecycleState::Running => state.lifecycle = LifecycleState::Stopped,
                LifecycleState::Created => {
                    return Err(DiError::NotStarted {
                        container: self.name().to_string(),
                    })
                }
                LifecycleState::Stopped => {
                    return Err(DiError::AlreadyStopped {
                        container: self.name().to_string(),
                    })
                }
            }
            state.root
        };
        info!("Stopping container '{}'", self.name());

        self.release_targets(root);

        let mut swept = 0usize;
        loop {
            let next = {
                let mut state = self.inner.state.write();
                let entry = state.table.pop_newest();
                entry.map(|entry| {
                    let manager = state.manager_of(entry.owner);
                    (entry, manager)
                })
            };
            let Some((entry, manager)) = next else {
                break;
            };
            self.dispose_instance(&entry, &manager);
            self.dispose_node(entry.owner);
            self.inner.state.write().reclaim(entry.owner);
            swept += 1;
        }
        if swept > 0 {
            debug!(
                "Force-disposed {} retained instances in container '{}'",
                swept,
                self.name()
            );
        }
        info!("Stopped container '{}'", self.name());
        drop(guard);

        match &self.inner.on_stop {
            Some(hook) => hook(self),
            None => Ok(()),
        }
    }

    pub fn stats(&self) -> ContainerStats {
        let state = self.inner.state.read();
        ContainerStats {
            live_nodes: state.graph.len(),
            shared_instances: state.table.len(),
            providers: state.registry.len(),
        }
    }

    /// Everything currently requested directly from the container, with its dependencies
    pub fn dependency_tree(&self) -> Vec<DependencyTree> {
        let state = self.inner.state.read();
        state
            .graph
            .children(state.root)
            .into_iter()
            .map(|child| state.tree(child))
            .collect()
    }

    pub(crate) fn downcast<T: Any + Send + Sync>(
        specification: &Specification,
        component: Component,
    ) -> DiResult<Arc<T>> {
        component
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch {
                specification: specification.clone(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Provider for `specification` from this container or the nearest ancestor declaring it
    fn declaring_provider(
        &self,
        specification: &Specification,
    ) -> DiResult<Arc<dyn ComponentProvider>> {
        let mut current = Some(self);
        while let Some(container) = current {
            if let Some(provider) = container.inner.state.read().registry.get(specification) {
                trace!("{} declared by container '{}'", specification, container.name());
                return Ok(provider.clone());
            }
            current = container.inner.parent.as_ref();
        }
        Err(DiError::NotAvailable {
            specification: specification.clone(),
        })
    }

    /// Run the request through this container's policy and every ancestor's
    fn check_permission(&self, request: &PermissionRequest<'_>) -> DiResult<()> {
        let mut current = Some(self);
        while let Some(container) = current {
            if let Some(policy) = &container.inner.security {
                policy.check_permission(request)?;
            }
            current = container.inner.parent.as_ref();
        }
        Ok(())
    }

    pub(crate) fn request_from(
        &self,
        requester: &ComponentManager,
        specification: &Specification,
        scope_id: Option<&str>,
    ) -> DiResult<Component> {
        let scope_id: Arc<str> = Arc::from(scope_id.unwrap_or(self.inner.config.default_scope.as_str()));
        let requester_released = || DiError::RequesterReleased {
            specification: requester.specification().clone(),
        };

        {
            let state = self.inner.state.read();
            state.ensure_running(self.name())?;
            if !state.is_live(requester.node()) {
                return Err(requester_released());
            }
        }

        self.check_permission(&PermissionRequest {
            requester: requester.specification(),
            target: specification,
            scope_id: &scope_id,
        })?;
        let provider = self.declaring_provider(specification)?;

        let (node, manager) = {
            let mut state = self.inner.state.write();
            state.ensure_running(self.name())?;
            if !state.is_live(requester.node()) {
                return Err(requester_released());
            }
            if let Err(e) = state.detect_cycle(
                requester.node(),
                specification,
                &scope_id,
                self.inner.config.cycle_detection,
            ) {
                debug!("Rejected request for {}: {}", specification, e);
                return Err(e);
            }

            let weak = Arc::downgrade(&self.inner);
            let node = state.graph.insert_with(|id| NodeBinding {
                provider: provider.clone(),
                specification: specification.clone(),
                scope_id: scope_id.clone(),
                manager: ComponentManager::new(weak, id, specification.clone(), scope_id.clone()),
                handle: None,
            });
            state.graph.set_source(node, requester.node());
            let manager = state.graph[node].data().manager.clone();
            (node, manager)
        };

        let origin = Requester {
            specification: requester.specification(),
            scope_id: requester.scope_id(),
        };
        let handle = match provider.request(&scope_id, &origin, &manager) {
            Ok(handle) => handle,
            Err(e) => {
                debug!("Provider for {} [{}] failed: {}", specification, scope_id, e);
                self.unwind(node);
                return Err(e);
            }
        };

        let duplicate_subtree = {
            let mut state = self.inner.state.write();
            state.graph[node].data_mut().set_handle(handle.clone());
            // `stop()` may have swept the table while the provider was building.
            if let Err(e) = state.ensure_running(self.name()) {
                drop(state);
                debug!("Discarding {} [{}]: {}", specification, scope_id, e);
                if let Err(dispose_error) = provider.dispose(&handle, &manager) {
                    error!(
                        "Failed to dispose {} [{}]: {}",
                        specification, scope_id, dispose_error
                    );
                }
                self.unwind(node);
                return Err(e);
            }
            if !state.is_live(requester.node()) {
                drop(state);
                provider.release(&handle, &manager);
                self.unwind(node);
                return Err(requester_released());
            }
            state.graph.add_target(requester.node(), node);

            match state.table.owner(handle.key()) {
                None => {
                    state.table.register(handle.clone(), node, provider.clone());
                    false
                }
                Some(_) => state.graph[node].target().is_some(),
            }
        };

        if duplicate_subtree {
            warn!(
                "{} [{}] resolved to an already shared instance but requested its own dependencies; keeping the existing owner's",
                specification, scope_id
            );
            self.release_targets(node);
        }

        debug!(
            "Resolved {} [{}] for {}",
            specification,
            scope_id,
            requester.specification()
        );
        Ok(handle.instance().clone())
    }

    pub(crate) fn release_from(&self, requester: &ComponentManager, key: InstanceKey) -> ReleaseOutcome {
        let found = {
            let state = self.inner.state.read();
            state
                .graph
                .get(requester.node())
                .and_then(|entry| entry.target())
                .and_then(|head| {
                    state
                        .graph
                        .find_in_ring(head, |entry| entry.data().key() == Some(key))
                })
        };
        let Some(node) = found else {
            warn!(
                "Release of an instance never requested by {}",
                requester.specification()
            );
            return ReleaseOutcome::Unknown;
        };

        let released = self.release_node(node);
        {
            let mut state = self.inner.state.write();
            if state.graph.get(node).map_or(false, |entry| entry.is_linked()) {
                state.graph.remove_from_ring(node);
            }
            state.reclaim(node);
        }

        if released {
            ReleaseOutcome::Released
        } else {
            ReleaseOutcome::Retained
        }
    }

    pub(crate) fn dispose_from(&self, requester: NodeId, key: InstanceKey) -> bool {
        let found = {
            let state = self.inner.state.read();
            state
                .graph
                .get(requester)
                .and_then(|entry| entry.target())
                .and_then(|head| {
                    state
                        .graph
                        .find_in_ring(head, |entry| entry.data().key() == Some(key))
                })
        };
        let Some(node) = found else {
            warn!("Dispose of an unknown instance");
            return false;
        };

        self.dispose_node(node);
        let mut state = self.inner.state.write();
        if state.graph.get(node).map_or(false, |entry| entry.is_linked()) {
            state.graph.remove_from_ring(node);
        }
        state.reclaim(node);
        true
    }

    /// Hand `node`'s instance back to its provider. Returns whether it is now gone.
    fn release_node(&self, node: NodeId) -> bool {
        let (provider, handle, manager, specification) = {
            let state = self.inner.state.read();
            let Some(entry) = state.graph.get(node) else {
                return true;
            };
            if entry.is_disposed() {
                return true;
            }
            let binding = entry.data();
            (
                binding.provider.clone(),
                binding.handle().clone(),
                binding.manager.clone(),
                binding.specification.clone(),
            )
        };

        let released = provider.release(&handle, &manager);
        trace!(
            "Released {} [{}]: {}",
            specification,
            handle.scope_id(),
            if released { "gone" } else { "retained" }
        );
        if !released {
            return false;
        }

        let owner = {
            let mut state = self.inner.state.write();
            match state.table.remove(handle.key()) {
                Some(entry) => entry.owner,
                None => {
                    warn!(
                        "Double release of {} [{}]",
                        specification,
                        handle.scope_id()
                    );
                    node
                }
            }
        };
        self.release_targets(owner);
        if owner != node {
            self.inner.state.write().reclaim(owner);
        }
        true
    }

    /// Release every child of `parent`, newest first
    fn release_targets(&self, parent: NodeId) {
        let children = self.inner.state.read().graph.children_newest_first(parent);
        for child in children {
            self.release_node(child);
            let mut state = self.inner.state.write();
            if state.graph.get(child).map_or(false, |entry| entry.is_linked()) {
                state.graph.remove_from_ring(child);
            }
            state.reclaim(child);
        }
    }

    /// Tear down `node`'s instance and its whole subtree, whatever the providers' release counts
    fn dispose_node(&self, node: NodeId) {
        let (entry, manager) = {
            let mut guard = self.inner.state.write();
            let state = &mut *guard;
            if !state.graph.contains(node) || state.graph.mark_disposed(node) {
                return;
            }
            let binding = state.graph[node].data();
            let entry = binding.key().and_then(|key| state.table.remove(key));
            (entry, binding.manager.clone())
        };

        if let Some(entry) = entry {
            self.dispose_instance(&entry, &manager);
            if entry.owner != node {
                self.dispose_node(entry.owner);
                self.inner.state.write().reclaim(entry.owner);
            }
        }

        let children = self.inner.state.read().graph.children(node);
        for child in children {
            self.dispose_node(child);
            let mut state = self.inner.state.write();
            if state.graph.get(child).map_or(false, |entry| entry.is_linked()) {
                state.graph.remove_from_ring(child);
            }
            state.reclaim(child);
        }
    }

    fn dispose_instance(&self, entry: &SharedEntry, manager: &ComponentManager) {
        if let Err(e) = entry.provider.dispose(&entry.handle, manager) {
            error!(
                "Failed to dispose {} [{}]: {}",
                manager.specification(),
                entry.handle.scope_id(),
                e
            );
        }
    }

    /// Drop a node whose construction did not complete, releasing what it acquired
    fn unwind(&self, node: NodeId) {
        self.release_targets(node);
        let mut state = self.inner.state.write();
        if state.graph.contains(node) {
            state.graph.remove(node);
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name())
            .field("lifecycle", &self.lifecycle_state())
            .field("parent", &self.parent().map(|parent| parent.name()))
            .finish()
    }
}
