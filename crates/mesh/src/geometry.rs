use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use bytemuck::{Pod, Zeroable};

/// GPU vertex layout for terrain meshes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    /// Normal packed as 10:10:10 signed-normalized.
    pub normal: u32,
    pub material: u32,
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], material: u32) -> Self {
        Self {
            position,
            normal: pack_normal(normal),
            material,
        }
    }
}

fn pack_normal(n: [f32; 3]) -> u32 {
    let pack = |v: f32| ((v.clamp(-1.0, 1.0) * 511.0).round() as i32 as u32) & 0x3FF;
    pack(n[0]) | (pack(n[1]) << 10) | (pack(n[2]) << 20)
}

/// Vertex and index data produced by one generation job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Geometry owned by exactly one terrain node.
///
/// Written once by a generator, then read by the renderer. Buffers are sized to the
/// generated counts; the ready flag flips only after the data is in place.
#[derive(Debug, Default)]
pub struct Geometry {
    data: RwLock<MeshData>,
    ready: AtomicBool,
}

pub type GeometryHandle = Arc<Geometry>;

impl Geometry {
    pub fn new_handle() -> GeometryHandle {
        Arc::new(Self::default())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// Replace the buffers with freshly generated data and publish it.
    pub fn store(&self, mesh: MeshData) {
        match self.data.write() {
            Ok(mut guard) => *guard = mesh,
            Err(poisoned) => *poisoned.into_inner() = mesh,
        }
        self.set_ready(true);
    }

    pub fn vertex_count(&self) -> usize {
        self.read().vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.read().indices.len()
    }

    /// Ready and non-empty. Uniform chunks (fully solid or fully empty) yield no vertices.
    pub fn has_surface(&self) -> bool {
        self.is_ready() && self.vertex_count() > 0
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MeshData> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
