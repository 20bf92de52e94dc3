//! Dependency graph arena
//!
//! Every resolved component is a [`DependencyNode`] stored in a
//! [`DependencyGraph`]. A node knows the node that requested it (`source`) and
//! the head of the ring of nodes it requested itself (`target`). Siblings
//! sharing a source form a circular doubly-linked ring through `next` and
//! `previous`, in creation order when walked forward from the head.
//!
//! Links are [`NodeId`]s into the arena rather than pointers. Slots freed by
//! [`DependencyGraph::remove`] go onto a free list and are handed out again
//! with a bumped generation, so a stale id never aliases a live node.

use std::fmt;
use std::ops::{Index, IndexMut};
use tracing::trace;

/// Generational index of a node in a [`DependencyGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A node of the dependency graph carrying a payload `T`
#[derive(Debug)]
pub struct DependencyNode<T> {
    data: T,
    source: Option<NodeId>,
    target: Option<NodeId>,
    next: NodeId,
    previous: NodeId,
    linked: bool,
    disposed: bool,
}

impl<T> DependencyNode<T> {
    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// The node that requested this one; `None` for a root
    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    /// Head of this node's children ring
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn next(&self) -> NodeId {
        self.next
    }

    pub fn previous(&self) -> NodeId {
        self.previous
    }

    /// Whether the node currently sits in its source's children ring
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    node: Option<DependencyNode<T>>,
}

/// Arena of dependency nodes with a free list
#[derive(Debug)]
pub struct DependencyGraph<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> DependencyGraph<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocate a detached node whose payload is built from its own id.
    ///
    /// The new node has no source, no children, and a ring containing only itself.
    pub fn insert_with(&mut self, build: impl FnOnce(NodeId) -> T) -> NodeId {
        let id = match self.free.pop() {
            Some(index) => NodeId {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => {
                let index = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| panic!("dependency graph exceeded {} nodes", u32::MAX));
                self.slots.push(Slot {
                    generation: 0,
                    node: None,
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        };

        self.slots[id.index as usize].node = Some(DependencyNode {
            data: build(id),
            source: None,
            target: None,
            next: id,
            previous: id,
            linked: false,
            disposed: false,
        });
        self.len += 1;
        id
    }

    pub fn insert(&mut self, data: T) -> NodeId {
        self.insert_with(|_| data)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&DependencyNode<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DependencyNode<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Free a detached node and return its payload.
    ///
    /// The node must not be a member of its source's ring and must have no children.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let node = self.get(id)?;
        assert!(
            !node.linked && node.target.is_none(),
            "node {} removed while still part of the graph",
            id
        );

        let slot = &mut self.slots[id.index as usize];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        trace!("Freed dependency node {}", id);
        Some(node.data)
    }

    /// Record `source` as the requester of `node`. Must happen exactly once.
    pub fn set_source(&mut self, node: NodeId, source: NodeId) {
        assert!(self.contains(source), "source {} is not a live node", source);
        let entry = &mut self[node];
        assert!(entry.source.is_none(), "source of node {} already set", node);
        entry.source = Some(source);
    }

    /// Append `child` to the end of `parent`'s children ring.
    ///
    /// The child is spliced just before the current head, so walking forward
    /// from the head lists children in creation order.
    pub fn add_target(&mut self, parent: NodeId, child: NodeId) {
        assert_eq!(
            self[child].source,
            Some(parent),
            "node {} was not requested by {}",
            child,
            parent
        );
        assert!(!self[child].linked, "node {} is already linked", child);

        match self[parent].target {
            None => {
                let entry = &mut self[child];
                entry.next = child;
                entry.previous = child;
                self[parent].target = Some(child);
            }
            Some(head) => {
                let tail = self[head].previous;
                {
                    let entry = &mut self[child];
                    entry.next = head;
                    entry.previous = tail;
                }
                self[tail].next = child;
                self[head].previous = child;
            }
        }
        self[child].linked = true;
        trace!("Linked node {} under {}", child, parent);
    }

    /// Excise `node` from whatever ring it is in, repointing its source's head if needed.
    pub fn remove_from_ring(&mut self, node: NodeId) {
        let (next, previous, source) = {
            let entry = &self[node];
            (entry.next, entry.previous, entry.source)
        };

        if let Some(source) = source {
            if let Some(parent) = self.get_mut(source) {
                if parent.target == Some(node) {
                    parent.target = if next == node { None } else { Some(next) };
                }
            }
        }

        if next != node {
            self[previous].next = next;
            self[next].previous = previous;
        }

        let entry = &mut self[node];
        entry.next = node;
        entry.previous = node;
        entry.linked = false;
        trace!("Unlinked node {}", node);
    }

    /// Scan the ring forward from `start` for the first node matching `predicate`
    pub fn find_in_ring(
        &self,
        start: NodeId,
        mut predicate: impl FnMut(&DependencyNode<T>) -> bool,
    ) -> Option<NodeId> {
        let mut current = start;
        loop {
            let entry = self.get(current)?;
            if predicate(entry) {
                return Some(current);
            }
            current = entry.next;
            if current == start {
                return None;
            }
        }
    }

    /// Children of `parent` in creation order
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        if let Some(head) = self.get(parent).and_then(|entry| entry.target) {
            let mut current = head;
            loop {
                children.push(current);
                current = self[current].next;
                if current == head {
                    break;
                }
            }
        }
        children
    }

    /// Children of `parent` newest first: backward from the head's predecessor, ending with the head
    pub fn children_newest_first(&self, parent: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        if let Some(head) = self.get(parent).and_then(|entry| entry.target) {
            let mut current = self[head].previous;
            while current != head {
                children.push(current);
                current = self[current].previous;
            }
            children.push(head);
        }
        children
    }

    /// `node` followed by its source, its source's source, and so on
    pub fn source_chain(&self, node: NodeId) -> SourceChain<'_, T> {
        SourceChain {
            graph: self,
            current: Some(node),
        }
    }

    /// Mark a node disposed, returning whether it already was
    pub fn mark_disposed(&mut self, node: NodeId) -> bool {
        std::mem::replace(&mut self[node].disposed, true)
    }
}

impl<T> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<NodeId> for DependencyGraph<T> {
    type Output = DependencyNode<T>;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.get(id)
            .unwrap_or_else(|| panic!("stale dependency node {}", id))
    }
}

impl<T> IndexMut<NodeId> for DependencyGraph<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("stale dependency node {}", id))
    }
}

/// Iterator over a node's requester chain; stops at the root or at a freed node
pub struct SourceChain<'a, T> {
    graph: &'a DependencyGraph<T>,
    current: Option<NodeId>,
}

impl<'a, T> Iterator for SourceChain<'a, T> {
    type Item = (NodeId, &'a DependencyNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.graph.get(id)?;
        self.current = node.source;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_root() -> (DependencyGraph<&'static str>, NodeId) {
        let mut graph = DependencyGraph::new();
        let root = graph.insert("root");
        (graph, root)
    }

    fn request(graph: &mut DependencyGraph<&'static str>, parent: NodeId, name: &'static str) -> NodeId {
        let child = graph.insert(name);
        graph.set_source(child, parent);
        graph.add_target(parent, child);
        child
    }

    fn names(graph: &DependencyGraph<&'static str>, ids: &[NodeId]) -> Vec<&'static str> {
        ids.iter().map(|id| *graph[*id].data()).collect()
    }

    #[test]
    fn test_lone_node_rings_itself() {
        let (graph, root) = graph_with_root();
        assert_eq!(graph[root].next(), root);
        assert_eq!(graph[root].previous(), root);
        assert_eq!(graph[root].target(), None);
        assert!(graph.children(root).is_empty());
    }

    #[test]
    fn test_children_keep_creation_order() {
        let (mut graph, root) = graph_with_root();
        let a = request(&mut graph, root, "a");
        request(&mut graph, root, "b");
        request(&mut graph, root, "c");

        assert_eq!(graph[root].target(), Some(a));
        assert_eq!(names(&graph, &graph.children(root)), vec!["a", "b", "c"]);
        assert_eq!(
            names(&graph, &graph.children_newest_first(root)),
            vec!["c", "b", "a"]
        );
    }

    #[test]
    fn test_remove_head_repoints_target() {
        let (mut graph, root) = graph_with_root();
        let a = request(&mut graph, root, "a");
        let b = request(&mut graph, root, "b");

        graph.remove_from_ring(a);
        assert_eq!(graph[root].target(), Some(b));
        assert_eq!(names(&graph, &graph.children(root)), vec!["b"]);
        assert!(!graph[a].is_linked());
        assert_eq!(graph[a].next(), a);

        graph.remove_from_ring(b);
        assert_eq!(graph[root].target(), None);
    }

    #[test]
    fn test_remove_middle_keeps_ring_closed() {
        let (mut graph, root) = graph_with_root();
        let a = request(&mut graph, root, "a");
        let b = request(&mut graph, root, "b");
        let c = request(&mut graph, root, "c");

        graph.remove_from_ring(b);
        assert_eq!(graph[a].next(), c);
        assert_eq!(graph[c].previous(), a);
        assert_eq!(graph[c].next(), a);
        assert_eq!(names(&graph, &graph.children(root)), vec!["a", "c"]);
    }

    #[test]
    fn test_find_in_ring() {
        let (mut graph, root) = graph_with_root();
        let a = request(&mut graph, root, "a");
        let b = request(&mut graph, root, "b");

        assert_eq!(graph.find_in_ring(a, |n| *n.data() == "b"), Some(b));
        assert_eq!(graph.find_in_ring(b, |n| *n.data() == "a"), Some(a));
        assert_eq!(graph.find_in_ring(a, |n| *n.data() == "z"), None);
    }

    #[test]
    fn test_source_chain_walks_to_root() {
        let (mut graph, root) = graph_with_root();
        let a = request(&mut graph, root, "a");
        let b = request(&mut graph, a, "b");

        let chain: Vec<_> = graph.source_chain(b).map(|(_, n)| *n.data()).collect();
        assert_eq!(chain, vec!["b", "a", "root"]);
    }

    #[test]
    fn test_freed_slot_is_reused_with_new_generation() {
        let (mut graph, root) = graph_with_root();
        let a = request(&mut graph, root, "a");
        graph.remove_from_ring(a);
        assert_eq!(graph.remove(a), Some("a"));
        assert!(!graph.contains(a));

        let b = graph.insert("b");
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert!(graph.get(a).is_none());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    #[should_panic(expected = "already set")]
    fn test_source_is_set_once() {
        let (mut graph, root) = graph_with_root();
        let a = graph.insert("a");
        graph.set_source(a, root);
        graph.set_source(a, root);
    }

    #[test]
    #[should_panic(expected = "was not requested by")]
    fn test_add_target_requires_matching_source() {
        let (mut graph, root) = graph_with_root();
        let a = request(&mut graph, root, "a");
        let stray = graph.insert("stray");
        graph.set_source(stray, root);
        graph.add_target(a, stray);
    }

    #[test]
    fn test_mark_disposed_is_monotonic() {
        let (mut graph, root) = graph_with_root();
        assert!(!graph.mark_disposed(root));
        assert!(graph.mark_disposed(root));
        assert!(graph[root].is_disposed());
    }
}
