use glam::Vec3;
use terrastream_common::CameraView;
use terrastream_stream::TerrainStreamer;

use crate::bounds::{BoxLine, collect_boxes};
use crate::draw::{DrawKind, DrawList, DrawMode};

/// Camera and draw settings for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    pub camera: CameraView,
    pub mode: DrawMode,
}

impl RenderView {
    pub fn new(camera: CameraView) -> Self {
        Self {
            camera,
            mode: DrawMode::Full,
        }
    }

    pub fn low_detail(mut self) -> Self {
        self.mode = DrawMode::LowDetail;
        self
    }
}

impl Default for RenderView {
    fn default() -> Self {
        Self::new(CameraView::at(Vec3::ZERO))
    }
}

/// Renderer-agnostic interface. All terrain renderers implement this trait.
///
/// A render pass refreshes visibility for the view's frustum, then reads the tree.
/// It never changes tree structure; that belongs to the streamer.
pub trait TerrainRenderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of the streamed terrain.
    fn render(&self, streamer: &TerrainStreamer, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable summary of one frame's draw list.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// List every draw command, not just the totals.
    pub verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl TerrainRenderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, streamer: &TerrainStreamer, view: &RenderView) -> String {
        let visible_roots = streamer.calculate_visibility(&view.camera.frustum);
        let list = DrawList::build(streamer, view.mode);

        let mut out = String::new();
        out.push_str(&format!(
            "=== Terrain (roots={}, visible={}, nodes={}, pending={}) ===\n",
            streamer.root_count(),
            visible_roots,
            streamer.node_count(),
            streamer.pending_count()
        ));
        let p = view.camera.position;
        out.push_str(&format!(
            "Camera: pos=({:.1}, {:.1}, {:.1}) mode={:?}\n",
            p.x, p.y, p.z, view.mode
        ));
        out.push_str(&format!(
            "Draws: {} (opaque={}, blended={}, gap={})\n",
            list.len(),
            list.count(|k| *k == DrawKind::Opaque),
            list.count(|k| matches!(k, DrawKind::Blended { .. })),
            list.count(|k| *k == DrawKind::GapFiller)
        ));

        if self.verbose {
            for cmd in list.commands() {
                let kind = match cmd.kind {
                    DrawKind::Opaque => "opaque".to_string(),
                    DrawKind::Blended { alpha } => format!("blend {alpha:.2}"),
                    DrawKind::GapFiller => "gap".to_string(),
                };
                out.push_str(&format!(
                    "  [{}] d{} {kind} pos=({:.1}, {:.1}, {:.1}) verts={}\n",
                    cmd.id,
                    cmd.depth,
                    cmd.position.x,
                    cmd.position.y,
                    cmd.position.z,
                    cmd.geometry.vertex_count()
                ));
            }
        }

        out
    }
}

/// Bounding-box debug view: one coloured box per visible leaf.
#[derive(Debug, Default)]
pub struct BoundsRenderer;

impl TerrainRenderer for BoundsRenderer {
    type Output = Vec<BoxLine>;

    fn render(&self, streamer: &TerrainStreamer, view: &RenderView) -> Vec<BoxLine> {
        streamer.calculate_visibility(&view.camera.frustum);
        let mut boxes = Vec::new();
        for root in streamer.roots() {
            collect_boxes(root, &mut boxes);
        }
        boxes
    }
}
