//! Decoded tile content: the renderable output of the geometry decoder.

use crate::container::BatchTable;
use crate::math::{Aabb, Sphere};

/// Material descriptor for a mesh primitive after style application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDescriptor {
    /// RGBA base color, unit floats.
    pub base_color: [f32; 4],
    /// Set when an explicit style opacity below 1.0 was applied.
    pub transparent: bool,
    pub depth_write: bool,
}

/// One renderable triangle primitive.
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub indices: Option<Vec<u32>>,
    pub batch_ids: Option<Vec<u32>>,
    pub material: MaterialDescriptor,
    /// Bounds recomputed from vertex data, never taken from the payload.
    pub bounds: Aabb,
    pub bounding_sphere: Sphere,
}

impl MeshPrimitive {
    /// Number of triangles, honoring the index buffer when present.
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(idx) => idx.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Vertex indices of one triangle.
    pub fn triangle(&self, face: usize) -> Option<[usize; 3]> {
        let base = face.checked_mul(3)?;
        match &self.indices {
            Some(idx) => {
                if base + 2 >= idx.len() {
                    return None;
                }
                Some([idx[base] as usize, idx[base + 1] as usize, idx[base + 2] as usize])
            }
            None => {
                if base + 2 >= self.positions.len() {
                    return None;
                }
                Some([base, base + 1, base + 2])
            }
        }
    }
}

/// Mesh scene content: primitives plus the batch table they index into.
#[derive(Debug, Clone)]
pub struct MeshContent {
    pub primitives: Vec<MeshPrimitive>,
    pub batch_table: BatchTable,
}

/// Point cloud content.
#[derive(Debug, Clone, Default)]
pub struct PointContent {
    pub positions: Vec<[f32; 3]>,
    /// Per-point RGBA, unit floats; `None` when the payload carried no
    /// supported color channel.
    pub colors: Option<Vec<[f32; 4]>>,
    /// Center-of-mass offset for numerical precision.
    pub rtc_center: Option<[f64; 3]>,
    pub point_size: f32,
}

impl PointContent {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Wireframe box outline emitted in debug mode, one hue per node.
#[derive(Debug, Clone, Copy)]
pub struct DebugBox {
    pub bounds: Aabb,
    pub color: [f32; 3],
}

/// Discriminated renderable payload for one tile node.
#[derive(Debug, Clone)]
pub enum TileContent {
    Mesh(MeshContent),
    Points(PointContent),
}

impl TileContent {
    /// Approximate resident size, used by the content cache for its byte
    /// budget. Counts the dominant buffers only.
    pub fn approx_byte_size(&self) -> usize {
        match self {
            TileContent::Mesh(mesh) => mesh
                .primitives
                .iter()
                .map(|p| {
                    p.positions.len() * 12
                        + p.indices.as_ref().map_or(0, |i| i.len() * 4)
                        + p.batch_ids.as_ref().map_or(0, |b| b.len() * 4)
                })
                .sum::<usize>()
                + mesh.batch_table.binary.len(),
            TileContent::Points(points) => {
                points.positions.len() * 12
                    + points.colors.as_ref().map_or(0, |c| c.len() * 16)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(positions: Vec<[f32; 3]>, indices: Option<Vec<u32>>) -> MeshPrimitive {
        let bounds = Aabb::from_positions(positions.iter());
        let bounding_sphere = Sphere::from_positions(&positions);
        MeshPrimitive {
            positions,
            indices,
            batch_ids: None,
            material: MaterialDescriptor {
                base_color: [1.0; 4],
                transparent: false,
                depth_write: true,
            },
            bounds,
            bounding_sphere,
        }
    }

    #[test]
    fn test_triangle_indexed() {
        let p = primitive(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
            Some(vec![0, 1, 2, 2, 1, 3]),
        );
        assert_eq!(p.triangle_count(), 2);
        assert_eq!(p.triangle(1), Some([2, 1, 3]));
        assert_eq!(p.triangle(2), None);
    }

    #[test]
    fn test_triangle_soup() {
        let p = primitive(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
        );
        assert_eq!(p.triangle_count(), 1);
        assert_eq!(p.triangle(0), Some([0, 1, 2]));
        assert_eq!(p.triangle(1), None);
    }

    #[test]
    fn test_approx_byte_size_counts_buffers() {
        let content = TileContent::Points(PointContent {
            positions: vec![[0.0; 3]; 10],
            colors: Some(vec![[1.0; 4]; 10]),
            rtc_center: None,
            point_size: 1.0,
        });
        assert_eq!(content.approx_byte_size(), 10 * 12 + 10 * 16);
    }
}
