//! Shared-instance table: which node owns each resolved instance

use crate::graph::NodeId;
use crate::handle::{InstanceHandle, InstanceKey};
use crate::provider::ComponentProvider;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ownership record for one instance
#[derive(Clone)]
pub(crate) struct SharedEntry {
    pub handle: Arc<InstanceHandle>,
    pub owner: NodeId,
    pub provider: Arc<dyn ComponentProvider>,
    seq: u64,
}

/// Maps each live instance to the node whose subtree holds its dependencies
#[derive(Default)]
pub(crate) struct SharedInstanceTable {
    entries: FxHashMap<InstanceKey, SharedEntry>,
    /// Registration order, for the newest-first sweep
    order: BTreeMap<u64, InstanceKey>,
    next_seq: u64,
}

impl SharedInstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Register `owner` for a handle seen for the first time
    pub fn register(
        &mut self,
        handle: Arc<InstanceHandle>,
        owner: NodeId,
        provider: Arc<dyn ComponentProvider>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let key = handle.key();
        self.order.insert(seq, key);
        let previous = self.entries.insert(
            key,
            SharedEntry {
                handle,
                owner,
                provider,
                seq,
            },
        );
        if let Some(previous) = previous {
            self.order.remove(&previous.seq);
        }
    }

    pub fn owner(&self, key: InstanceKey) -> Option<NodeId> {
        self.entries.get(&key).map(|entry| entry.owner)
    }

    pub fn remove(&mut self, key: InstanceKey) -> Option<SharedEntry> {
        let entry = self.entries.remove(&key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    /// Remove the most recently registered entry
    pub fn pop_newest(&mut self) -> Option<SharedEntry> {
        let (_, key) = self.order.pop_last()?;
        self.entries.remove(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use crate::provider::TransientProvider;

    #[test]
    fn test_pop_newest_follows_registration_order() {
        let mut graph = DependencyGraph::new();
        let owner = graph.insert(());
        let provider: Arc<dyn ComponentProvider> = Arc::new(TransientProvider::new(|_| Ok(0u8)));
        let handles: Vec<_> = (0..4u8)
            .map(|value| Arc::new(InstanceHandle::from_value("default", value)))
            .collect();

        let mut table = SharedInstanceTable::new();
        for handle in &handles {
            table.register(handle.clone(), owner, provider.clone());
        }
        assert!(table.remove(handles[2].key()).is_some());
        assert_eq!(table.len(), 3);

        let popped: Vec<u8> = std::iter::from_fn(|| table.pop_newest())
            .filter_map(|entry| entry.handle.downcast_ref::<u8>().copied())
            .collect();
        assert_eq!(popped, vec![3, 1, 0]);
        assert_eq!(table.len(), 0);
        assert!(table.pop_newest().is_none());
    }
}
