//! Rendering Adapter: turns the streamed terrain tree into draw commands.
//!
//! # Invariants
//! - Renderers read node state; they never split, unsplit or evict.
//! - A node is drawn only when visible and its geometry is ready.
//! - A split node keeps drawing itself until all eight children are ready.
//!
//! No GPU backend lives here. Backends consume [`DrawList`] and [`BoxLine`] output.

mod bounds;
mod draw;
mod renderer;

pub use bounds::{BoxLine, collect_boxes, depth_color};
pub use draw::{DrawCommand, DrawKind, DrawList, DrawMode};
pub use renderer::{BoundsRenderer, DebugTextRenderer, RenderView, TerrainRenderer};

pub fn crate_info() -> &'static str {
    "terrastream-render v0.1.0"
}
