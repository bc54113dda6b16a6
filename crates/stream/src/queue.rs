use std::cmp::Ordering;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::node::{NodeHandle, TerrainNode};

/// Generation order: visible before invisible, then shallower before deeper, then
/// nearer before farther.
pub fn compare_priority(lhs: &TerrainNode, rhs: &TerrainNode) -> Ordering {
    rhs.visible()
        .cmp(&lhs.visible())
        .then_with(|| lhs.depth().cmp(&rhs.depth()))
        .then_with(|| lhs.distance().total_cmp(&rhs.distance()))
}

/// Backlog of nodes awaiting a generator.
///
/// Holds strong handles. A queued node whose handle has become the only one left was
/// evicted or merged away while waiting and is discarded instead of dispatched.
#[derive(Debug, Default)]
pub struct PendingQueue {
    nodes: VecDeque<NodeHandle>,
    must_sort: bool,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeHandle) {
        self.nodes.push_back(node);
        self.must_sort = true;
    }

    /// Put a node back at the head, e.g. after a failed dispatch.
    pub(crate) fn push_front(&mut self, node: NodeHandle) {
        self.nodes.push_front(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn must_sort(&self) -> bool {
        self.must_sort
    }

    /// Re-sort by [`compare_priority`] if anything was pushed since the last sort.
    pub fn sort_if_needed(&mut self) {
        if !self.must_sort {
            return;
        }
        self.nodes
            .make_contiguous()
            .sort_by(|a, b| compare_priority(&a.borrow(), &b.borrow()));
        self.must_sort = false;
    }

    pub fn front(&self) -> Option<&NodeHandle> {
        self.nodes.front()
    }

    pub fn pop_front(&mut self) -> Option<NodeHandle> {
        self.nodes.pop_front()
    }

    /// Whether the queue holds the last strong reference to `node`.
    pub fn is_cancelled(node: &NodeHandle) -> bool {
        Rc::strong_count(node) == 1
    }

    /// Drop every queued node that nothing outside the queue still owns. Returns how
    /// many were dropped.
    pub fn discard_cancelled(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|node| !Self::is_cancelled(node));
        before - self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeHandle> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_id::NodeId;
    use glam::Vec3;
    use std::rc::Weak;
    use terrastream_common::Aabb;

    fn node(x: i16, depth: u8, visible: bool, distance: f32) -> NodeHandle {
        let mut id = NodeId::root(x, 0, 0);
        for _ in 0..depth {
            id = id.child(0);
        }
        let bounds = Aabb::from_origin_size(Vec3::ZERO, Vec3::ONE);
        let handle = TerrainNode::new(id, bounds, Weak::new()).into_handle();
        {
            let mut n = handle.borrow_mut();
            n.visible = visible;
            n.distance = distance;
        }
        handle
    }

    fn drain_ids(queue: &mut PendingQueue) -> Vec<NodeId> {
        std::iter::from_fn(|| queue.pop_front())
            .map(|n| n.borrow().id())
            .collect()
    }

    #[test]
    fn visible_first_then_shallow_then_near() {
        let far_visible_deep = node(1, 2, true, 10.0);
        let near_visible_deep = node(2, 2, true, 5.0);
        let visible_root = node(3, 0, true, 500.0);
        let invisible_root = node(4, 0, false, 1.0);
        let invisible_deep = node(5, 3, false, 0.5);

        let mut queue = PendingQueue::new();
        for n in [
            &invisible_deep,
            &far_visible_deep,
            &invisible_root,
            &near_visible_deep,
            &visible_root,
        ] {
            queue.push(Rc::clone(n));
        }
        assert!(queue.must_sort());
        queue.sort_if_needed();
        assert!(!queue.must_sort());

        let order = drain_ids(&mut queue);
        let expected: Vec<NodeId> = [
            &visible_root,
            &near_visible_deep,
            &far_visible_deep,
            &invisible_root,
            &invisible_deep,
        ]
        .iter()
        .map(|n| n.borrow().id())
        .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn unvisited_nodes_sort_last_within_their_class() {
        let measured = node(1, 1, false, 1000.0);
        let unmeasured = node(2, 1, false, f32::INFINITY);
        let mut queue = PendingQueue::new();
        queue.push(Rc::clone(&unmeasured));
        queue.push(Rc::clone(&measured));
        queue.sort_if_needed();
        assert_eq!(queue.front().unwrap().borrow().id(), measured.borrow().id());
    }

    #[test]
    fn sole_owner_means_cancelled() {
        let held = node(1, 0, true, 1.0);
        let mut queue = PendingQueue::new();
        queue.push(Rc::clone(&held));
        queue.push(node(2, 0, true, 1.0));
        queue.sort_if_needed();

        let first = queue.pop_front().unwrap();
        assert!(!PendingQueue::is_cancelled(&first));
        let second = queue.pop_front().unwrap();
        assert!(PendingQueue::is_cancelled(&second));
    }

    #[test]
    fn discard_cancelled_keeps_live_nodes_in_order() {
        let near = node(1, 0, true, 1.0);
        let far = node(2, 0, true, 9.0);
        let mut queue = PendingQueue::new();
        queue.push(node(3, 2, false, 0.5));
        queue.push(Rc::clone(&near));
        queue.push(node(4, 1, true, 3.0));
        queue.push(Rc::clone(&far));

        assert_eq!(queue.discard_cancelled(), 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.discard_cancelled(), 0);
        let ids = drain_ids(&mut queue);
        assert_eq!(ids, vec![near.borrow().id(), far.borrow().id()]);
    }
}
