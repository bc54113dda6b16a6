//! Shared math types for the terrain streaming workspace.
//!
//! # Invariants
//! - `Aabb::min <= Aabb::max` component-wise.
//! - A `CameraView` is an immutable snapshot; consumers never mutate it mid-tick.

mod bounds;
mod camera;
mod frustum;

pub use bounds::Aabb;
pub use camera::{CameraView, FlyCamera};
pub use frustum::{Frustum, Plane};

pub fn crate_info() -> &'static str {
    "terrastream-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
