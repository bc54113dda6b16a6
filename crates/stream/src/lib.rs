//! Streaming: octree terrain nodes, LOD split/merge, visibility, generator scheduling.
//!
//! # Invariants
//! - A node is either a leaf or has exactly eight children; never partially split.
//! - A child's bounds are exactly one octant of its parent's bounds.
//! - At most one job per generator is in flight; `update` never blocks.
//! - A node evicted or unsplit while queued is never dispatched.
//! - Results for a node that no longer exists are dropped, never written.
//! - Pending work is ordered visible first, then shallow first, then nearest first.

mod config;
mod lod;
mod node;
mod node_id;
mod queue;
mod scheduler;
mod stats;
mod visibility;

pub use config::{ConfigError, DistanceMetric, StreamConfig};
pub use lod::{
    FADE_OUT_END_FACTOR, FADE_OUT_START_FACTOR, LodBand, LodBands, LodController, SPLIT_FACTOR,
    UNSPLIT_FACTOR,
};
pub use node::{NodeHandle, TerrainNode, WeakNode, subtree_len, walk};
pub use node_id::{MAX_ADDRESSABLE_DEPTH, MAX_TREE_DEPTH, NodeAddress, NodeId};
pub use queue::{PendingQueue, compare_priority};
pub use scheduler::TerrainStreamer;
pub use stats::StreamStats;
pub use visibility::calculate_visibility;

pub fn crate_info() -> &'static str {
    "terrastream-stream v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("stream"));
    }
}
