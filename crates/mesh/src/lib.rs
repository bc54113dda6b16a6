//! Mesh generation boundary: geometry handles, the generator contract and the pool.
//!
//! The isosurface extraction itself is an opaque [`MeshBuilder`] supplied by the caller.
//!
//! # Invariants
//! - A generator holds at most one in-flight job.
//! - `process` never blocks; completion is observed only by polling `update`.
//! - A finished job never writes into geometry whose owner has been dropped.

mod generator;
mod geometry;
mod pool;

pub use generator::{
    AsyncGenerator, InlineGenerator, MeshBuilder, MeshError, MeshGenerator, MeshRequest,
};
pub use geometry::{Geometry, GeometryHandle, MeshData, Vertex};
pub use pool::{DEFAULT_POOL_SIZE, GeneratorPool};

pub fn crate_info() -> &'static str {
    "terrastream-mesh v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("mesh"));
    }
}
