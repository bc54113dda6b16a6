use glam::Vec3;
use terrastream_stream::{NodeAddress, NodeId, TerrainStreamer, walk};

/// Terrain inspector for developer tooling.
///
/// Provides read-only queries against the streamer for debugging and profiling.
pub struct TreeInspector;

impl TreeInspector {
    /// Produce a per-depth summary of every resident tree.
    pub fn summary(streamer: &TerrainStreamer) -> TreeSummary {
        let max_depth = streamer.config().max_depth;
        let mut per_depth = vec![DepthCounts::default(); usize::from(max_depth) + 1];

        for root in streamer.roots() {
            walk(root, &mut |node| {
                let Some(counts) = per_depth.get_mut(usize::from(node.depth())) else {
                    tracing::warn!(id = %node.id(), "node deeper than configured max depth");
                    return;
                };
                counts.nodes += 1;
                counts.split += usize::from(node.is_split());
                counts.ready += usize::from(node.is_ready());
                counts.visible += usize::from(node.visible());
            });
        }
        for node in streamer.pending().iter() {
            if let Some(counts) = per_depth.get_mut(usize::from(node.borrow().depth())) {
                counts.pending += 1;
            }
        }

        TreeSummary {
            roots: streamer.root_count(),
            per_depth,
            pending: streamer.pending_count(),
            busy_generators: streamer.pool().busy_count(),
            generators: streamer.pool().len(),
        }
    }

    /// Look up one node by id.
    pub fn inspect_node(streamer: &TerrainStreamer, id: NodeId) -> Option<NodeInfo> {
        streamer.find(id).map(|handle| {
            let n = handle.borrow();
            NodeInfo {
                id,
                address: id.decode(),
                position: n.position(),
                size: n.size(),
                distance: n.distance(),
                alpha: n.alpha(),
                visible: n.visible(),
                split: n.is_split(),
                ready: n.is_ready(),
                vertex_count: n.geometry().vertex_count(),
            }
        })
    }

    /// List all resident root ids in map order.
    pub fn list_roots(streamer: &TerrainStreamer) -> Vec<NodeId> {
        streamer.root_ids().collect()
    }
}

/// Node counts for one tree level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthCounts {
    pub nodes: usize,
    pub split: usize,
    pub ready: usize,
    pub visible: usize,
    /// Queued nodes at this depth, including ones already cancelled.
    pub pending: usize,
}

#[derive(Debug, Clone)]
pub struct TreeSummary {
    pub roots: usize,
    pub per_depth: Vec<DepthCounts>,
    pub pending: usize,
    pub busy_generators: usize,
    pub generators: usize,
}

impl TreeSummary {
    pub fn node_count(&self) -> usize {
        self.per_depth.iter().map(|d| d.nodes).sum()
    }
}

impl std::fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Terrain: roots={} nodes={} pending={} generators={}/{} busy",
            self.roots,
            self.node_count(),
            self.pending,
            self.busy_generators,
            self.generators
        )?;
        for (depth, d) in self.per_depth.iter().enumerate() {
            writeln!(
                f,
                "  depth {depth}: nodes={} split={} ready={} visible={} pending={}",
                d.nodes, d.split, d.ready, d.visible, d.pending
            )?;
        }
        Ok(())
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub address: NodeAddress,
    pub position: Vec3,
    pub size: Vec3,
    pub distance: f32,
    pub alpha: f32,
    pub visible: bool,
    pub split: bool,
    pub ready: bool,
    pub vertex_count: usize,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node [{}] {} pos=({:.1}, {:.1}, {:.1}) size={:.1} dist={:.1} alpha={:.2} \
             visible={} split={} ready={} verts={}",
            self.id,
            self.address,
            self.position.x,
            self.position.y,
            self.position.z,
            self.size.x,
            self.distance,
            self.alpha,
            self.visible,
            self.split,
            self.ready,
            self.vertex_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use terrastream_common::CameraView;
    use terrastream_mesh::{GeneratorPool, MeshData, MeshRequest, Vertex};
    use terrastream_stream::StreamConfig;

    fn surface(_: &MeshRequest) -> MeshData {
        MeshData {
            vertices: vec![Vertex::default(); 6],
            indices: vec![0, 1, 2, 3, 4, 5],
        }
    }

    fn streamer() -> TerrainStreamer {
        let config = StreamConfig {
            root_size: Vec3::splat(64.0),
            visual_radius: 40.0,
            vertical_cells: [0, 0],
            max_depth: 1,
            generator_count: 2,
            ..StreamConfig::default()
        };
        let pool = GeneratorPool::with_inline(config.generator_count, Arc::new(surface));
        TerrainStreamer::new(config, pool).unwrap()
    }

    fn camera() -> CameraView {
        CameraView::at(Vec3::new(32.0, 0.0, 32.0))
    }

    #[test]
    fn summary_empty_streamer() {
        let s = streamer();
        let summary = TreeInspector::summary(&s);
        assert_eq!(summary.roots, 0);
        assert_eq!(summary.node_count(), 0);
        assert_eq!(summary.per_depth.len(), 2);
        assert_eq!(summary.generators, 2);
    }

    #[test]
    fn summary_counts_per_depth() {
        let mut s = streamer();
        for _ in 0..3 {
            s.tick(&camera());
        }

        // Root split on the third tick; two of its children are in flight.
        let summary = TreeInspector::summary(&s);
        assert_eq!(summary.roots, 1);
        assert_eq!(summary.node_count(), 9);
        assert_eq!(summary.per_depth[0], DepthCounts {
            nodes: 1,
            split: 1,
            ready: 1,
            visible: 1,
            pending: 0,
        });
        assert_eq!(summary.per_depth[1].nodes, 8);
        assert_eq!(summary.per_depth[1].ready, 0);
        assert_eq!(summary.per_depth[1].pending, 6);
        assert_eq!(summary.busy_generators, 2);
    }

    #[test]
    fn inspect_node_found() {
        let mut s = streamer();
        s.tick(&camera());
        s.tick(&camera());

        let info = TreeInspector::inspect_node(&s, NodeId::root(0, 0, 0)).unwrap();
        assert!(info.ready);
        assert_eq!(info.vertex_count, 6);
        assert_eq!(info.position, Vec3::ZERO);
        assert_eq!(info.distance, 0.0);
        assert!(format!("{info}").contains("verts=6"));
    }

    #[test]
    fn inspect_node_not_found() {
        let s = streamer();
        assert!(TreeInspector::inspect_node(&s, NodeId::root(7, 0, 7)).is_none());
    }

    #[test]
    fn list_roots() {
        let mut s = streamer();
        s.tick(&camera());
        assert_eq!(TreeInspector::list_roots(&s), vec![NodeId::root(0, 0, 0)]);
    }

    #[test]
    fn summary_display() {
        let s = streamer();
        let text = format!("{}", TreeInspector::summary(&s));
        assert!(text.contains("roots=0"));
        assert!(text.contains("depth 1:"));
    }
}
