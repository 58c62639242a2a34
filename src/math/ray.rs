//! Ray unprojection and intersection for picking.

use glam::{DMat4, DVec3, DVec4};

use super::Aabb;

/// A ray in world space.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }

    /// Unproject a screen pixel to a world-space ray.
    ///
    /// Screen origin is the top-left corner. Returns `None` when the
    /// view-projection matrix is singular.
    pub fn from_screen(
        screen_x: f64,
        screen_y: f64,
        width: f64,
        height: f64,
        view_projection: &DMat4,
    ) -> Option<Self> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let inv = view_projection.inverse();
        if !inv.is_finite() {
            return None;
        }
        let ndc_x = (screen_x / width) * 2.0 - 1.0;
        let ndc_y = 1.0 - (screen_y / height) * 2.0;

        let near = unproject(&inv, DVec4::new(ndc_x, ndc_y, -1.0, 1.0))?;
        let far = unproject(&inv, DVec4::new(ndc_x, ndc_y, 1.0, 1.0))?;
        let direction = (far - near).normalize_or_zero();
        if direction == DVec3::ZERO {
            return None;
        }
        Some(Self {
            origin: near,
            direction,
        })
    }

    pub fn point_at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Slab test; returns the entry parameter when the ray hits the box.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f64> {
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            let min = aabb.min[axis];
            let max = aabb.max[axis];
            if d.abs() < 1e-12 {
                if o < min || o > max {
                    return None;
                }
            } else {
                let mut t0 = (min - o) / d;
                let mut t1 = (max - o) / d;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return None;
                }
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(t_min.max(0.0))
    }

    /// Moeller-Trumbore ray/triangle intersection. Returns the ray
    /// parameter of the hit; back faces count.
    pub fn intersect_triangle(&self, a: DVec3, b: DVec3, c: DVec3) -> Option<f64> {
        const EPS: f64 = 1e-12;
        let ab = b - a;
        let ac = c - a;
        let pvec = self.direction.cross(ac);
        let det = ab.dot(pvec);
        if det.abs() < EPS {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = self.origin - a;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(ab);
        let v = self.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = ac.dot(qvec) * inv_det;
        if t < EPS {
            return None;
        }
        Some(t)
    }
}

fn unproject(inv: &DMat4, ndc: DVec4) -> Option<DVec3> {
    let world = *inv * ndc;
    if world.w.abs() < 1e-12 {
        return None;
    }
    Some(DVec3::new(world.x, world.y, world.z) / world.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_aabb_straight_on() {
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0));
        let aabb = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        let t = ray.intersect_aabb(&aabb).unwrap();
        assert!((t - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_intersect_aabb_miss() {
        let ray = Ray::new(DVec3::new(5.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0));
        let aabb = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        assert!(ray.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn test_intersect_aabb_from_inside() {
        let ray = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -1.0));
        let aabb = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
        assert_eq!(ray.intersect_aabb(&aabb), Some(0.0));
    }

    #[test]
    fn test_intersect_triangle_hit() {
        let ray = Ray::new(DVec3::new(0.25, 0.25, 1.0), DVec3::new(0.0, 0.0, -1.0));
        let t = ray
            .intersect_triangle(
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
            )
            .unwrap();
        assert!((t - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_intersect_triangle_outside_barycentric() {
        let ray = Ray::new(DVec3::new(0.9, 0.9, 1.0), DVec3::new(0.0, 0.0, -1.0));
        assert!(ray
            .intersect_triangle(
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
            )
            .is_none());
    }

    #[test]
    fn test_from_screen_center_points_forward() {
        let proj = DMat4::perspective_rh(std::f64::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let view = DMat4::look_at_rh(DVec3::ZERO, DVec3::new(0.0, 0.0, -1.0), DVec3::Y);
        let ray = Ray::from_screen(400.0, 300.0, 800.0, 600.0, &(proj * view)).unwrap();
        assert!(ray.direction.z < -0.99);
        assert!(ray.direction.x.abs() < 1e-6);
        assert!(ray.direction.y.abs() < 1e-6);
    }
}
