//! Instance handles and instance identity

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A resolved component instance
pub type Component = Arc<dyn Any + Send + Sync>;

/// Identity of a component instance: the address of the value behind its `Arc`.
///
/// Two handles describe the same instance exactly when their keys are equal,
/// regardless of whether they were obtained as `Component` or `Arc<T>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey(usize);

impl InstanceKey {
    pub fn of<T: ?Sized>(instance: &Arc<T>) -> Self {
        InstanceKey(Arc::as_ptr(instance) as *const () as usize)
    }
}

/// Pairs a component instance with the scope it was produced for.
///
/// Handles are created by providers and never change afterwards; containers
/// hold them behind an `Arc` so that every node referencing a shared instance
/// points at the same handle.
pub struct InstanceHandle {
    scope_id: Arc<str>,
    instance: Component,
}

impl InstanceHandle {
    pub fn new(scope_id: impl Into<Arc<str>>, instance: Component) -> Self {
        Self {
            scope_id: scope_id.into(),
            instance,
        }
    }

    /// Wrap a concrete value
    pub fn from_value<T: Any + Send + Sync>(scope_id: impl Into<Arc<str>>, value: T) -> Self {
        Self::new(scope_id, Arc::new(value))
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn instance(&self) -> &Component {
        &self.instance
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey::of(&self.instance)
    }

    /// Whether this handle wraps exactly `instance`
    pub fn wraps<T: ?Sized>(&self, instance: &Arc<T>) -> bool {
        self.key() == InstanceKey::of(instance)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }
}

impl PartialEq for InstanceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for InstanceHandle {}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("scope_id", &self.scope_id)
            .field("key", &self.key())
            .finish()
    }
}
