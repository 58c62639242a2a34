//! View frustum extraction and intersection tests.

use glam::{DMat4, DVec3, DVec4};

use super::Aabb;

/// One half-space; points with `normal.dot(p) + d >= 0` are inside.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: DVec3,
    d: f64,
}

impl Plane {
    fn from_coefficients(v: DVec4) -> Self {
        let normal = DVec3::new(v.x, v.y, v.z);
        let len = normal.length();
        if len > 0.0 {
            Self {
                normal: normal / len,
                d: v.w / len,
            }
        } else {
            Self {
                normal: DVec3::Z,
                d: v.w,
            }
        }
    }

    fn signed_distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.d
    }
}

/// Camera view frustum as six planes extracted from a view-projection
/// matrix (left, right, bottom, top, near, far).
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extract planes from a combined view-projection matrix.
    pub fn from_view_projection(vp: &DMat4) -> Self {
        let r0 = vp.row(0);
        let r1 = vp.row(1);
        let r2 = vp.row(2);
        let r3 = vp.row(3);
        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r3 + r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Whether the box intersects (or is contained in) the frustum.
    ///
    /// Positive-vertex test: for each plane, test the box corner farthest
    /// along the plane normal; if that corner is outside any plane the whole
    /// box is outside.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let p = DVec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane.signed_distance(p) < 0.0 {
                return false;
            }
        }
        true
    }
}
