use std::sync::Arc;

use glam::Vec3;
use terrastream_mesh::GeometryHandle;
use terrastream_stream::{NodeHandle, NodeId, TerrainNode, TerrainStreamer};

/// How a node's geometry is submitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawKind {
    Opaque,
    /// Crossfading; `alpha` is in `(0, 1)`.
    Blended { alpha: f32 },
    /// Parent geometry drawn behind fading-in leaf children to hide cracks.
    GapFiller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Full,
    /// Roots only, no refinement.
    LowDetail,
}

#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub id: NodeId,
    pub depth: u8,
    pub position: Vec3,
    pub geometry: GeometryHandle,
    pub kind: DrawKind,
}

/// Draw commands for one frame, in tree walk order.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn build(streamer: &TerrainStreamer, mode: DrawMode) -> Self {
        Self::from_roots(streamer.roots(), mode)
    }

    pub fn from_roots<'a>(roots: impl IntoIterator<Item = &'a NodeHandle>, mode: DrawMode) -> Self {
        let mut list = Self::default();
        for root in roots {
            list.collect(root, mode);
        }
        tracing::trace!(commands = list.commands.len(), ?mode, "draw list built");
        list
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn count(&self, matches: impl Fn(&DrawKind) -> bool) -> usize {
        self.commands.iter().filter(|c| matches(&c.kind)).count()
    }

    fn collect(&mut self, node: &NodeHandle, mode: DrawMode) {
        let n = node.borrow();
        if !n.visible() || !n.is_ready() {
            return;
        }

        // Keep drawing this node alone until every child can replace it.
        let placeholder = mode == DrawMode::LowDetail || (n.is_split() && !n.children_ready());
        if placeholder || n.alpha() >= 1.0 {
            self.push(&n, DrawKind::Opaque);
        } else if n.alpha() > 0.0 {
            self.push(&n, DrawKind::Blended { alpha: n.alpha() });
        }
        if placeholder {
            return;
        }

        if let Some(children) = n.children() {
            let leaf_children = children.iter().all(|c| c.borrow().is_leaf());
            if leaf_children && n.alpha() < 1.0 {
                self.push(&n, DrawKind::GapFiller);
            }
            for child in children {
                self.collect(child, mode);
            }
        }
    }

    fn push(&mut self, node: &TerrainNode, kind: DrawKind) {
        self.commands.push(DrawCommand {
            id: node.id(),
            depth: node.depth(),
            position: node.position(),
            geometry: Arc::clone(node.geometry()),
            kind,
        });
    }
}
