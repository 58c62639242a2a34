//! Axis-aligned bounding volumes.

use glam::{DMat4, DVec3};

/// Axis-aligned bounding box in f64 world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Create an AABB from explicit corners.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Create an empty (invalid) AABB, ready for expansion.
    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::MAX),
            max: DVec3::splat(f64::MIN),
        }
    }

    /// Whether min <= max on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Build from a manifest oriented-box array: 12 numbers, center followed
    /// by three half-axis vectors. Only the axis-aligned extents are kept
    /// (the x half-axis contributes its x component, and so on), matching
    /// the flattening the traversal operates on.
    pub fn from_box_array(b: &[f64; 12]) -> Self {
        let center = DVec3::new(b[0], b[1], b[2]);
        let half = DVec3::new(b[3].abs(), b[7].abs(), b[11].abs());
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    /// Expand to include a point.
    pub fn expand_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Smallest AABB containing this box after an affine transform. All
    /// eight corners are transformed and re-bounded.
    pub fn transformed(&self, m: &DMat4) -> Self {
        let mut out = Aabb::empty();
        for i in 0..8 {
            let corner = DVec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.expand_point(m.transform_point3(corner));
        }
        out
    }

    /// Distance from a point to the surface of the box; zero if inside.
    pub fn distance_to_point(&self, p: DVec3) -> f64 {
        let clamped = p.clamp(self.min, self.max);
        (p - clamped).length()
    }

    /// Tight bounds of a set of f32 vertex positions.
    pub fn from_positions<'a, I>(positions: I) -> Self
    where
        I: IntoIterator<Item = &'a [f32; 3]>,
    {
        let mut out = Aabb::empty();
        for p in positions {
            out.expand_point(DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64));
        }
        out
    }
}

/// Bounding sphere, recomputed from vertex data rather than trusted from
/// declared tile bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: DVec3,
    pub radius: f64,
}

impl Sphere {
    /// Sphere centered on the AABB of the positions, radius to the farthest
    /// vertex.
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        let aabb = Aabb::from_positions(positions.iter());
        if !aabb.is_valid() {
            return Self {
                center: DVec3::ZERO,
                radius: 0.0,
            };
        }
        let center = aabb.center();
        let mut radius_sq: f64 = 0.0;
        for p in positions {
            let d = DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64) - center;
            radius_sq = radius_sq.max(d.length_squared());
        }
        Self {
            center,
            radius: radius_sq.sqrt(),
        }
    }
}
