//! Host camera state.

use glam::{DMat4, DVec3};

use crate::math::Frustum;

/// Camera snapshot handed over by the host on every view change.
///
/// Only the two matrices are stored; position and frustum derive from them
/// so the snapshot can never be internally inconsistent.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub view: DMat4,
    pub projection: DMat4,
}

impl Camera {
    pub fn new(view: DMat4, projection: DMat4) -> Self {
        Self { view, projection }
    }

    pub fn view_projection(&self) -> DMat4 {
        self.projection * self.view
    }

    /// World-space camera position, recovered from the view matrix.
    pub fn position(&self) -> DVec3 {
        self.view.inverse().w_axis.truncate()
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_recovered_from_view() {
        let eye = DVec3::new(3.0, -2.0, 7.0);
        let view = DMat4::look_at_rh(eye, DVec3::ZERO, DVec3::Z);
        let camera = Camera::new(
            view,
            DMat4::perspective_rh(std::f64::consts::FRAC_PI_3, 1.5, 0.1, 1000.0),
        );
        assert!((camera.position() - eye).length() < 1e-9);
    }

    #[test]
    fn test_frustum_contains_look_target() {
        let eye = DVec3::new(0.0, 0.0, 10.0);
        let view = DMat4::look_at_rh(eye, DVec3::ZERO, DVec3::Y);
        let camera = Camera::new(
            view,
            DMat4::perspective_rh(std::f64::consts::FRAC_PI_3, 1.0, 0.1, 100.0),
        );
        let frustum = camera.frustum();
        let around_origin = crate::math::Aabb::new(DVec3::splat(-0.5), DVec3::splat(0.5));
        assert!(frustum.intersects_aabb(&around_origin));
        let behind = crate::math::Aabb::new(
            DVec3::new(-0.5, -0.5, 19.5),
            DVec3::new(0.5, 0.5, 20.5),
        );
        assert!(!frustum.intersects_aabb(&behind));
    }
}
