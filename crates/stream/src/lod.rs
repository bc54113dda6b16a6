//! Split/merge decisions and crossfade alpha.
//!
//! All thresholds are multiples of a level's node width:
//!
//! ```text
//!   fade-out end   fade-out start   split   unsplit
//!       2.8             2.9          3.0      3.25
//! ```
//!
//! A leaf splits inside `split`; a split node merges only beyond `unsplit`. Children
//! fade in between `split` and `fade-out start`, then the parent fades out down to
//! `fade-out end`.

use std::rc::Rc;

use glam::Vec3;
use terrastream_common::Aabb;

use crate::config::DistanceMetric;
use crate::node::{NodeHandle, TerrainNode, WeakNode};
use crate::node_id::NodeId;
use crate::queue::PendingQueue;
use crate::stats::StreamStats;

pub const SPLIT_FACTOR: f32 = 3.0;
pub const UNSPLIT_FACTOR: f32 = 3.25;
pub const FADE_OUT_START_FACTOR: f32 = 2.9;
pub const FADE_OUT_END_FACTOR: f32 = 2.8;

/// Distance thresholds for one tree level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodBand {
    pub node_size: Vec3,
    pub split: f32,
    pub unsplit: f32,
    pub fade_out_start: f32,
    pub fade_out_end: f32,
}

impl LodBand {
    fn for_size(node_size: Vec3) -> Self {
        let w = node_size.x;
        Self {
            node_size,
            split: w * SPLIT_FACTOR,
            unsplit: w * UNSPLIT_FACTOR,
            fade_out_start: w * FADE_OUT_START_FACTOR,
            fade_out_end: w * FADE_OUT_END_FACTOR,
        }
    }

    /// Alpha of a split node at `distance`: 1 outside the fade-out band, 0 inside it.
    pub fn fade_out_alpha(&self, distance: f32) -> f32 {
        ((distance - self.fade_out_end) / (self.fade_out_start - self.fade_out_end)).clamp(0.0, 1.0)
    }

    /// Alpha of a child of a node on this level, keyed off the parent's distance.
    pub fn fade_in_alpha(&self, parent_distance: f32) -> f32 {
        ((self.split - parent_distance) / (self.split - self.fade_out_start)).clamp(0.0, 1.0)
    }
}

/// Per-level node sizes and thresholds, computed once.
#[derive(Debug, Clone)]
pub struct LodBands {
    root_size: Vec3,
    bands: Vec<LodBand>,
}

impl LodBands {
    pub fn new(root_size: Vec3, max_depth: u8) -> Self {
        let bands = (0..=max_depth)
            .map(|depth| LodBand::for_size(root_size / f32::from(1u16 << depth)))
            .collect();
        Self { root_size, bands }
    }

    pub fn max_depth(&self) -> u8 {
        (self.bands.len() - 1) as u8
    }

    pub fn root_size(&self) -> Vec3 {
        self.root_size
    }

    pub fn band(&self, depth: u8) -> &LodBand {
        &self.bands[usize::from(depth)]
    }

    pub fn node_size(&self, depth: u8) -> Vec3 {
        self.band(depth).node_size
    }

    /// World-space box of the node addressed by `id`.
    pub fn bounds_of(&self, id: NodeId) -> Aabb {
        let a = id.decode();
        let size = self.node_size(a.depth);
        let origin = Vec3::new(
            f32::from(a.base_x) * self.root_size.x,
            f32::from(a.base_y) * self.root_size.y,
            f32::from(a.base_z) * self.root_size.z,
        ) + Vec3::new(f32::from(a.sub_x), f32::from(a.sub_y), f32::from(a.sub_z)) * size;
        Aabb::from_origin_size(origin, size)
    }
}

/// Per-node LOD pass: distance, split/unsplit with hysteresis, crossfade alpha.
#[derive(Debug, Clone)]
pub struct LodController {
    bands: LodBands,
    metric: DistanceMetric,
}

impl LodController {
    pub fn new(bands: LodBands, metric: DistanceMetric) -> Self {
        Self { bands, metric }
    }

    pub fn bands(&self) -> &LodBands {
        &self.bands
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn create_node(&self, id: NodeId, parent: WeakNode) -> NodeHandle {
        TerrainNode::new(id, self.bands.bounds_of(id), parent).into_handle()
    }

    /// Update `node` and, if it ends up split, its subtree.
    ///
    /// `parent_distance` is the parent's distance from this same pass; `None` for roots.
    pub fn update_node(
        &self,
        node: &NodeHandle,
        camera: Vec3,
        parent_distance: Option<f32>,
        queue: &mut PendingQueue,
        stats: &mut StreamStats,
    ) {
        let mut n = node.borrow_mut();
        n.distance = self.metric.distance(camera, n.center());
        debug_assert!(n.distance >= 0.0);

        let band = *self.bands.band(n.depth());
        if n.is_leaf() {
            if n.distance < band.split && self.split_node(&Rc::downgrade(node), &mut n, queue) {
                stats.splits += 1;
            }
        } else if n.distance > band.unsplit {
            drop(n.detach_children());
            stats.unsplits += 1;
            tracing::debug!(id = %n.id(), depth = n.depth(), "unsplit");
        }

        n.alpha = if n.is_split() {
            band.fade_out_alpha(n.distance)
        } else if n.depth() > 0 {
            let parent_distance = parent_distance.unwrap_or(n.distance);
            self.bands.band(n.depth() - 1).fade_in_alpha(parent_distance)
        } else {
            1.0
        };

        let distance = n.distance;
        if let Some(children) = n.children() {
            for child in children {
                self.update_node(child, camera, Some(distance), queue, stats);
            }
        }
    }

    /// Split a leaf into eight children and queue them for generation.
    ///
    /// Returns false without splitting when the node is at the deepest level or its
    /// geometry is not ready or empty; uniform chunks are never refined.
    pub fn split(&self, node: &NodeHandle, queue: &mut PendingQueue) -> bool {
        let weak = Rc::downgrade(node);
        self.split_node(&weak, &mut node.borrow_mut(), queue)
    }

    /// Drop all children of a split node, releasing their subtrees.
    pub fn unsplit(&self, node: &NodeHandle) {
        drop(node.borrow_mut().detach_children());
    }

    fn split_node(&self, weak: &WeakNode, node: &mut TerrainNode, queue: &mut PendingQueue) -> bool {
        assert!(node.is_leaf(), "split called on split node {}", node.id());
        if node.depth() >= self.bands.max_depth() || !node.geometry().has_surface() {
            return false;
        }

        let id = node.id();
        let children: [NodeHandle; 8] =
            std::array::from_fn(|octant| self.create_node(id.child(octant), weak.clone()));
        for child in &children {
            queue.push(Rc::clone(child));
        }
        node.attach_children(children);
        tracing::debug!(id = %id, depth = node.depth(), "split");
        true
    }
}
