use std::f32::consts::TAU;

use glam::Vec3;
use terrastream_mesh::{MeshBuilder, MeshData, MeshRequest, Vertex};

const MATERIAL_LOWLAND: u32 = 0;
const MATERIAL_HIGHLAND: u32 = 1;

/// Demo surface: rolling sine hills sampled on a regular grid per node.
///
/// Nodes the surface does not cross produce no vertices, so they are never refined.
#[derive(Debug, Clone)]
pub struct Heightfield {
    pub base: f32,
    pub amplitude: f32,
    pub wavelength: f32,
    /// Grid cells per node side.
    pub resolution: u16,
}

impl Default for Heightfield {
    fn default() -> Self {
        Self {
            base: 256.0,
            amplitude: 768.0,
            wavelength: 8192.0,
            resolution: 16,
        }
    }
}

impl Heightfield {
    pub fn height(&self, x: f32, z: f32) -> f32 {
        let k = TAU / self.wavelength;
        self.base
            + self.amplitude * ((x * k).sin() * (z * k).cos() + 0.5 * ((x + z) * k * 0.37).sin())
    }

    fn normal(&self, x: f32, z: f32, e: f32) -> [f32; 3] {
        let dx = self.height(x - e, z) - self.height(x + e, z);
        let dz = self.height(x, z - e) - self.height(x, z + e);
        Vec3::new(dx, 2.0 * e, dz).normalize_or_zero().to_array()
    }
}

impl MeshBuilder for Heightfield {
    fn build(&self, request: &MeshRequest) -> MeshData {
        // (n + 1)^2 vertices must stay addressable by u16 indices.
        let n = self.resolution.clamp(1, 255);
        let side = usize::from(n) + 1;
        let step_x = request.size.x / f32::from(n);
        let step_z = request.size.z / f32::from(n);
        let (low, high) = (request.position.y, request.position.y + request.size.y);

        let mut heights = Vec::with_capacity(side * side);
        for j in 0..side {
            for i in 0..side {
                let x = request.position.x + i as f32 * step_x;
                let z = request.position.z + j as f32 * step_z;
                heights.push((x, z, self.height(x, z)));
            }
        }
        if heights.iter().all(|&(_, _, h)| h < low || h >= high) {
            return MeshData::default();
        }

        let highland = self.base + self.amplitude * 0.5;
        let vertices = heights
            .iter()
            .map(|&(x, z, h)| {
                let material = if h > highland {
                    MATERIAL_HIGHLAND
                } else {
                    MATERIAL_LOWLAND
                };
                Vertex::new([x, h.clamp(low, high), z], self.normal(x, z, step_x * 0.5), material)
            })
            .collect();

        let side = side as u16;
        let mut indices = Vec::with_capacity(usize::from(n) * usize::from(n) * 6);
        for j in 0..n {
            for i in 0..n {
                let a = j * side + i;
                let b = a + 1;
                let c = a + side;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        MeshData { vertices, indices }
    }
}
