//! Component provider interface and the built-in scoping strategies
//!
//! A provider decides how instances are constructed, cached and torn down.
//! The container only relies on the three calls of [`ComponentProvider`]:
//! `request` yields a handle, `release` reports whether the instance is now
//! gone from the provider's point of view, and `dispose` tears it down
//! unconditionally.

use crate::error::DiResult;
use crate::handle::InstanceHandle;
use crate::lifecycle::{Disposable, Teardown};
use crate::manager::ComponentManager;
use crate::specification::Specification;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::Arc;
use tracing::trace;

/// Factory building a component, with access to its own component manager
pub type ComponentFactory<T> = Arc<dyn Fn(&ComponentManager) -> DiResult<T> + Send + Sync>;

/// The component on whose behalf a request is made
#[derive(Debug, Clone, Copy)]
pub struct Requester<'a> {
    pub specification: &'a Specification,
    pub scope_id: &'a str,
}

/// Strategy that produces, releases and disposes instances for one specification
pub trait ComponentProvider: Send + Sync {
    /// Produce a handle for `scope_id`. May construct, hit a cache, or block.
    ///
    /// `manager` belongs to the node being created; dependencies requested
    /// through it become children of that node.
    fn request(
        &self,
        scope_id: &str,
        requester: &Requester<'_>,
        manager: &ComponentManager,
    ) -> DiResult<Arc<InstanceHandle>>;

    /// Give back one use of `handle`. Returns `true` once the instance is fully released.
    fn release(&self, handle: &InstanceHandle, manager: &ComponentManager) -> bool;

    /// Tear the instance down regardless of outstanding uses
    fn dispose(&self, handle: &InstanceHandle, manager: &ComponentManager) -> DiResult<()>;
}

/// Factory plus optional teardown shared by the built-in providers
struct Recipe<T> {
    factory: ComponentFactory<T>,
    teardown: Option<Teardown<T>>,
}

impl<T: Any + Send + Sync> Recipe<T> {
    fn new<F>(factory: F) -> Self
    where
        F: Fn(&ComponentManager) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            teardown: None,
        }
    }

    fn build(&self, scope_id: &str, manager: &ComponentManager) -> DiResult<Arc<InstanceHandle>> {
        let value = (self.factory)(manager)?;
        Ok(Arc::new(InstanceHandle::from_value(scope_id, value)))
    }

    fn tear_down(&self, handle: &InstanceHandle) {
        if let (Some(teardown), Some(value)) = (&self.teardown, handle.downcast_ref::<T>()) {
            teardown(value);
        }
    }
}

macro_rules! teardown_builders {
    ($provider:ident) => {
        impl<T: Any + Send + Sync> $provider<T> {
            /// Run `teardown` whenever an instance is released or disposed
            pub fn with_teardown(mut self, teardown: impl Fn(&T) + Send + Sync + 'static) -> Self {
                self.recipe.teardown = Some(Arc::new(teardown));
                self
            }
        }

        impl<T: Any + Send + Sync + Disposable> $provider<T> {
            /// Tear instances down through their [`Disposable`] implementation
            pub fn disposing(self) -> Self {
                self.with_teardown(|value: &T| value.dispose())
            }
        }
    };
}

/// One instance per scope id, kept until disposed.
///
/// `release` never reports the instance as released: the singleton outlives
/// its users and is only torn down by `dispose`.
pub struct SingletonProvider<T> {
    recipe: Recipe<T>,
    instances: Mutex<FxHashMap<String, Arc<InstanceHandle>>>,
}

impl<T: Any + Send + Sync> SingletonProvider<T> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&ComponentManager) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            recipe: Recipe::new(factory),
            instances: Mutex::new(FxHashMap::default()),
        }
    }
}

teardown_builders!(SingletonProvider);

impl<T: Any + Send + Sync> ComponentProvider for SingletonProvider<T> {
    fn request(
        &self,
        scope_id: &str,
        _requester: &Requester<'_>,
        manager: &ComponentManager,
    ) -> DiResult<Arc<InstanceHandle>> {
        if let Some(handle) = self.instances.lock().get(scope_id) {
            return Ok(handle.clone());
        }

        // Built outside the lock: construction may request other components.
        let built = self.recipe.build(scope_id, manager)?;
        let mut instances = self.instances.lock();
        match instances.get(scope_id) {
            Some(existing) => {
                let existing = existing.clone();
                drop(instances);
                trace!("Discarding concurrently built singleton for scope {}", scope_id);
                self.recipe.tear_down(&built);
                Ok(existing)
            }
            None => {
                instances.insert(scope_id.to_string(), built.clone());
                Ok(built)
            }
        }
    }

    fn release(&self, _handle: &InstanceHandle, _manager: &ComponentManager) -> bool {
        false
    }

    fn dispose(&self, handle: &InstanceHandle, _manager: &ComponentManager) -> DiResult<()> {
        let removed = {
            let mut instances = self.instances.lock();
            match instances.get(handle.scope_id()) {
                Some(cached) if cached.key() == handle.key() => instances.remove(handle.scope_id()),
                _ => None,
            }
        };
        if removed.is_some() {
            self.recipe.tear_down(handle);
        }
        Ok(())
    }
}

/// A fresh instance for every request; released instances are torn down at once
pub struct TransientProvider<T> {
    recipe: Recipe<T>,
}

impl<T: Any + Send + Sync> TransientProvider<T> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&ComponentManager) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            recipe: Recipe::new(factory),
        }
    }
}

teardown_builders!(TransientProvider);

impl<T: Any + Send + Sync> ComponentProvider for TransientProvider<T> {
    fn request(
        &self,
        scope_id: &str,
        _requester: &Requester<'_>,
        manager: &ComponentManager,
    ) -> DiResult<Arc<InstanceHandle>> {
        self.recipe.build(scope_id, manager)
    }

    fn release(&self, handle: &InstanceHandle, _manager: &ComponentManager) -> bool {
        self.recipe.tear_down(handle);
        true
    }

    fn dispose(&self, handle: &InstanceHandle, _manager: &ComponentManager) -> DiResult<()> {
        self.recipe.tear_down(handle);
        Ok(())
    }
}

/// One shared instance per scope id, torn down when its last holder releases it
pub struct RefCountedProvider<T> {
    recipe: Recipe<T>,
    instances: Mutex<FxHashMap<String, (Arc<InstanceHandle>, usize)>>,
}

impl<T: Any + Send + Sync> RefCountedProvider<T> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&ComponentManager) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            recipe: Recipe::new(factory),
            instances: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of outstanding holders of the instance for `scope_id`
    pub fn holders(&self, scope_id: &str) -> usize {
        self.instances
            .lock()
            .get(scope_id)
            .map_or(0, |(_, holders)| *holders)
    }
}

teardown_builders!(RefCountedProvider);

impl<T: Any + Send + Sync> ComponentProvider for RefCountedProvider<T> {
    fn request(
        &self,
        scope_id: &str,
        _requester: &Requester<'_>,
        manager: &ComponentManager,
    ) -> DiResult<Arc<InstanceHandle>> {
        if let Some((handle, holders)) = self.instances.lock().get_mut(scope_id) {
            *holders += 1;
            return Ok(handle.clone());
        }

        let built = self.recipe.build(scope_id, manager)?;
        let mut instances = self.instances.lock();
        if let Some((existing, holders)) = instances.get_mut(scope_id) {
            *holders += 1;
            let existing = existing.clone();
            drop(instances);
            self.recipe.tear_down(&built);
            return Ok(existing);
        }
        instances.insert(scope_id.to_string(), (built.clone(), 1));
        Ok(built)
    }

    fn release(&self, handle: &InstanceHandle, _manager: &ComponentManager) -> bool {
        let last = {
            let mut instances = self.instances.lock();
            match instances.get_mut(handle.scope_id()) {
                Some((cached, holders)) if cached.key() == handle.key() => {
                    *holders = holders.saturating_sub(1);
                    if *holders == 0 {
                        instances.remove(handle.scope_id());
                        true
                    } else {
                        return false;
                    }
                }
                // Not ours any more: nothing left to hold on to.
                _ => return true,
            }
        };
        if last {
            self.recipe.tear_down(handle);
        }
        last
    }

    fn dispose(&self, handle: &InstanceHandle, _manager: &ComponentManager) -> DiResult<()> {
        let removed = {
            let mut instances = self.instances.lock();
            match instances.get(handle.scope_id()) {
                Some((cached, _)) if cached.key() == handle.key() => instances.remove(handle.scope_id()),
                _ => None,
            }
        };
        if removed.is_some() {
            self.recipe.tear_down(handle);
        }
        Ok(())
    }
}
