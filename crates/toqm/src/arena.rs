//! Indexed storage for the search tree.
//!
//! Nodes refer to their parent by id. A slot counts its live children, so a
//! popped node is freed as soon as no queued descendant can still need its
//! steps, and freeing cascades up the tree.

use rustc_hash::FxHashMap;

use crate::error::{MapperError, MapperResult};
use crate::node::{Node, NodeId, Step};

#[derive(Debug)]
struct Slot {
    node: Node,
    children: u32,
    popped: bool,
    pinned: bool,
}

#[derive(Debug)]
pub(crate) struct NodeArena {
    slots: FxHashMap<NodeId, Slot>,
    next_id: NodeId,
    retain_popped: bool,
}

impl NodeArena {
    pub(crate) fn new(retain_popped: bool) -> Self {
        Self {
            slots: FxHashMap::default(),
            next_id: 0,
            retain_popped,
        }
    }

    /// Hand out the next id in creation order.
    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of ids handed out.
    pub(crate) fn created(&self) -> u64 {
        self.next_id
    }

    /// Number of nodes currently stored.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn insert(&mut self, node: Node) {
        if let Some(parent) = node.parent().and_then(|p| self.slots.get_mut(&p)) {
            parent.children += 1;
        }
        self.slots.insert(
            node.id(),
            Slot {
                node,
                children: 0,
                popped: false,
                pinned: false,
            },
        );
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(&id).map(|slot| &slot.node)
    }

    pub(crate) fn mark_popped(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.popped = true;
        }
    }

    /// Keep a node (and so its ancestry) alive regardless of its children.
    pub(crate) fn pin(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.pinned = true;
        }
    }

    pub(crate) fn unpin(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.pinned = false;
        }
        self.release(id);
    }

    /// Remove a queued node that will never be popped.
    pub(crate) fn discard(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get(&id) {
            if slot.children == 0 && !slot.pinned {
                self.remove(id);
            }
        }
    }

    /// Free a popped node if nothing depends on it any more.
    pub(crate) fn release(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get(&id) else {
            return;
        };
        if slot.popped && slot.children == 0 && !slot.pinned && !self.retain_popped {
            self.remove(id);
        }
    }

    fn remove(&mut self, id: NodeId) {
        let mut next = Some(id);
        while let Some(id) = next.take() {
            let Some(slot) = self.slots.remove(&id) else {
                break;
            };
            let Some(parent_id) = slot.node.parent() else {
                break;
            };
            if let Some(parent) = self.slots.get_mut(&parent_id) {
                parent.children = parent.children.saturating_sub(1);
                if parent.popped
                    && parent.children == 0
                    && !parent.pinned
                    && !self.retain_popped
                {
                    next = Some(parent_id);
                }
            }
        }
    }

    /// Every step from the root down to `id`, in commit order.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::MissingAncestor`] if any node on the path has
    /// already been freed.
    pub(crate) fn history(&self, id: NodeId) -> MapperResult<Vec<Step>> {
        let mut chain = Vec::new();
        let mut next = Some(id);
        while let Some(current) = next {
            let node = self
                .get(current)
                .ok_or(MapperError::MissingAncestor { node: id, missing: current })?;
            chain.push(node);
            next = node.parent();
        }
        Ok(chain
            .iter()
            .rev()
            .flat_map(|node| node.steps().iter().copied())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::context::SearchContext;
    use crate::coupling::CouplingMap;
    use crate::gate::GateOp;
    use crate::latency::Latency1_2_6;
    use crate::node::{LayoutPhase, StepOp};

    fn tree(retain_popped: bool, f: impl FnOnce(&mut NodeArena, &SearchContext<'_>)) {
        let gates = [GateOp::two_qubit(0, "cx", 0, 1)];
        let map = CouplingMap::linear(4);
        let circuit = Circuit::new(&gates, 2, &map, &Latency1_2_6).unwrap();
        let usable = [0, 1, 2, 3];
        let ctx = SearchContext::new(&circuit, &map, &Latency1_2_6, &usable);
        let mut arena = NodeArena::new(retain_popped);
        f(&mut arena, &ctx);
    }

    fn add(arena: &mut NodeArena, node: &mut Node) -> NodeId {
        let id = arena.next_id();
        node.set_id(id);
        arena.insert(node.clone());
        id
    }

    #[test]
    fn test_release_cascades_to_popped_ancestors() {
        tree(false, |arena, ctx| {
            let mut root = Node::root(ctx, vec![0, 3], LayoutPhase::Closed);
            let root_id = add(arena, &mut root);
            let mut child = root.child();
            child.apply_swap(ctx, 0, 1);
            let child_id = add(arena, &mut child);

            arena.mark_popped(root_id);
            arena.release(root_id);
            assert_eq!(arena.len(), 2);

            arena.mark_popped(child_id);
            arena.release(child_id);
            assert_eq!(arena.len(), 0);
            assert_eq!(arena.created(), 2);
        });
    }

    #[test]
    fn test_retain_and_pin_keep_nodes() {
        tree(true, |arena, ctx| {
            let mut root = Node::root(ctx, vec![0, 3], LayoutPhase::Closed);
            let root_id = add(arena, &mut root);
            arena.mark_popped(root_id);
            arena.release(root_id);
            assert_eq!(arena.len(), 1);
        });
        tree(false, |arena, ctx| {
            let mut root = Node::root(ctx, vec![0, 3], LayoutPhase::Closed);
            let root_id = add(arena, &mut root);
            arena.mark_popped(root_id);
            arena.pin(root_id);
            arena.release(root_id);
            assert_eq!(arena.len(), 1);
            arena.unpin(root_id);
            assert_eq!(arena.len(), 0);
        });
    }

    #[test]
    fn test_history_walks_parents() {
        tree(false, |arena, ctx| {
            let mut root = Node::root(ctx, vec![0, 3], LayoutPhase::Closed);
            add(arena, &mut root);
            let mut child = root.child();
            child.apply_swap(ctx, 0, 1);
            add(arena, &mut child);
            let mut grandchild = child.child();
            grandchild.apply_swap(ctx, 2, 3);
            grandchild.flush(ctx);
            let id = add(arena, &mut grandchild);

            let history = arena.history(id).unwrap();
            assert_eq!(history.len(), 3);
            assert_eq!(history[0].op, StepOp::Swap);
            assert_eq!(history[0].physical_target, 1);
            assert_eq!(history[1].physical_target, 3);
            assert_eq!(history[2].op, StepOp::Gate(0));
            assert_eq!(history[2].cycle, 6);

            arena.discard(id);
            assert_eq!(arena.len(), 2);
        });
    }

    #[test]
    fn test_dropped_child_keeps_unpopped_parent() {
        tree(false, |arena, ctx| {
            let mut root = Node::root(ctx, vec![0, 3], LayoutPhase::Closed);
            let root_id = add(arena, &mut root);
            arena.mark_popped(root_id);

            // `child` is being expanded: its first successor is dropped
            // before the second one is stored.
            let mut child = root.child();
            child.apply_swap(ctx, 0, 1);
            let child_id = add(arena, &mut child);
            let mut first = child.child();
            first.apply_swap(ctx, 2, 3);
            let first_id = add(arena, &mut first);
            arena.discard(first_id);
            assert_eq!(arena.len(), 2);

            let mut second = child.child();
            second.apply_swap(ctx, 1, 2);
            let second_id = add(arena, &mut second);
            arena.mark_popped(child_id);
            arena.release(child_id);

            assert_eq!(arena.history(second_id).unwrap().len(), 2);
        });
    }

    #[test]
    fn test_history_reports_freed_ancestor() {
        tree(false, |arena, ctx| {
            let mut root = Node::root(ctx, vec![0, 3], LayoutPhase::Closed);
            let root_id = add(arena, &mut root);
            arena.mark_popped(root_id);
            let mut child = root.child();
            child.apply_swap(ctx, 0, 1);
            let child_id = add(arena, &mut child);

            // Freeing the only child cascades to the popped root.
            arena.discard(child_id);
            assert_eq!(arena.len(), 0);

            let mut orphan = child.child();
            orphan.apply_swap(ctx, 1, 2);
            let orphan_id = add(arena, &mut orphan);
            assert!(matches!(
                arena.history(orphan_id),
                Err(MapperError::MissingAncestor { missing, .. }) if missing == child_id
            ));
        });
    }
}
