use glam::{Mat4, Vec3};

use crate::frustum::Frustum;

/// Immutable per-tick camera snapshot consumed by the streaming core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub frustum: Frustum,
}

impl CameraView {
    pub fn new(position: Vec3, view_projection: &Mat4) -> Self {
        Self {
            position,
            frustum: Frustum::from_view_projection(view_projection),
        }
    }

    /// Camera at `position` that culls nothing.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            frustum: Frustum::unbounded(),
        }
    }
}

/// Fly camera with position, yaw, pitch, and projection parameters.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 512.0, 0.0),
            yaw: 0.0,
            pitch: -15.0_f32.to_radians(),
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 50_000.0,
            speed: 200.0,
        }
    }
}

impl FlyCamera {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Move along the horizontal projection of the view direction.
    pub fn advance(&mut self, dt: f32) {
        let mut heading = self.forward();
        heading.y = 0.0;
        self.position += heading.normalize_or_zero() * self.speed * dt;
    }

    pub fn turn(&mut self, yaw_delta: f32) {
        self.yaw += yaw_delta;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn snapshot(&self) -> CameraView {
        CameraView::new(self.position, &self.view_projection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_produces_finite_matrix() {
        let cam = FlyCamera::default();
        let vp = cam.view_projection();
        assert!(vp.is_finite());
    }

    #[test]
    fn advance_moves_horizontally() {
        let mut cam = FlyCamera::default();
        let start = cam.position;
        cam.advance(1.0);
        assert_eq!(cam.position.y, start.y);
        assert!((cam.position - start).length() > 199.0);
    }

    #[test]
    fn snapshot_sees_what_is_ahead() {
        let cam = FlyCamera {
            pitch: 0.0,
            ..FlyCamera::default()
        };
        let view = cam.snapshot();
        let ahead = cam.position + cam.forward() * 100.0;
        let behind = cam.position - cam.forward() * 100.0;
        assert!(view.frustum.contains_point(ahead));
        assert!(!view.frustum.contains_point(behind));
    }
}
