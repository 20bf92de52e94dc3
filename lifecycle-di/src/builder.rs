//! Container builder for fluent configuration

use std::any::Any;
use std::sync::Arc;

use crate::config::ContainerConfig;
use crate::container::{Container, ContainerSettings, LifecycleHook};
use crate::error::DiResult;
use crate::manager::ComponentManager;
use crate::provider::{ComponentProvider, RefCountedProvider, SingletonProvider, TransientProvider};
use crate::security::SecurityPolicy;
use crate::specification::Specification;

/// Builder for constructing a container
pub struct ContainerBuilder {
    settings: ContainerSettings,
    providers: Vec<(Specification, Arc<dyn ComponentProvider>)>,
}

impl ContainerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            settings: ContainerSettings::new(ContainerConfig::named(name)),
            providers: Vec::new(),
        }
    }

    /// Replace the configuration, including the container name
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.settings.config = config;
        self
    }

    /// Delegate unknown specifications and permission checks to `parent`
    pub fn parent(mut self, parent: &Container) -> Self {
        self.settings.parent = Some(parent.clone());
        self
    }

    pub fn security(mut self, policy: impl SecurityPolicy + 'static) -> Self {
        self.settings.security = Some(Arc::new(policy));
        self
    }

    /// Run `hook` right after the container starts
    pub fn on_start(mut self, hook: impl Fn(&Container) -> DiResult<()> + Send + Sync + 'static) -> Self {
        self.settings.on_start = Some(Arc::new(hook) as LifecycleHook);
        self
    }

    /// Run `hook` once the container has released and disposed its components
    pub fn on_stop(mut self, hook: impl Fn(&Container) -> DiResult<()> + Send + Sync + 'static) -> Self {
        self.settings.on_stop = Some(Arc::new(hook) as LifecycleHook);
        self
    }

    /// Register a provider
    pub fn register_provider(
        &mut self,
        specification: impl Into<Specification>,
        provider: Arc<dyn ComponentProvider>,
    ) -> &mut Self {
        self.providers.push((specification.into(), provider));
        self
    }

    /// Register a singleton component
    pub fn register_singleton<T, F>(&mut self, specification: impl Into<Specification>, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&ComponentManager) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register_provider(specification, Arc::new(SingletonProvider::new(factory)))
    }

    /// Register a transient component
    pub fn register_transient<T, F>(&mut self, specification: impl Into<Specification>, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&ComponentManager) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register_provider(specification, Arc::new(TransientProvider::new(factory)))
    }

    /// Register a shared component released with its last holder
    pub fn register_ref_counted<T, F>(&mut self, specification: impl Into<Specification>, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&ComponentManager) -> DiResult<T> + Send + Sync + 'static,
    {
        self.register_provider(specification, Arc::new(RefCountedProvider::new(factory)))
    }

    /// Add components from a module
    pub fn add_module<M: Module>(mut self, module: M) -> Self {
        module.configure(&mut self);
        self
    }

    /// Build the container. Fails on the first duplicate registration.
    pub fn build(self) -> DiResult<Container> {
        let container = Container::from_settings(self.settings);
        for (specification, provider) in self.providers {
            container.add_provider(specification, provider)?;
        }
        Ok(container)
    }

    /// Build and start the container
    pub fn start(self) -> DiResult<Container> {
        let container = self.build()?;
        container.start()?;
        Ok(container)
    }
}

/// Trait for component modules
pub trait Module {
    /// Register this module's components
    fn configure(&self, builder: &mut ContainerBuilder);
}

impl<F> Module for F
where
    F: Fn(&mut ContainerBuilder),
{
    fn configure(&self, builder: &mut ContainerBuilder) {
        self(builder)
    }
}
