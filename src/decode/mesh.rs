//! Mesh tile decoding: codec invocation, bounds recomputation, style
//! application.

use tracing::trace;

use crate::container::TileContainer;
use crate::math::{Aabb, Sphere};
use crate::tileset::StyleParams;

use super::codec::MeshCodec;
use super::content::{MaterialDescriptor, MeshContent, MeshPrimitive};
use super::error::DecodeError;

/// Decode a mesh container's opaque payload into renderable primitives.
///
/// The payload passes through the external codec unmodified. Every primitive
/// then gets its bounds recomputed from vertex data (declared bounds in the
/// wild are frequently wrong) and the batch table attached for picking.
pub fn decode_mesh(
    codec: &dyn MeshCodec,
    container: &TileContainer,
    style: &StyleParams,
) -> Result<MeshContent, DecodeError> {
    let scene = codec.decode_scene(&container.payload)?;
    trace!(primitives = scene.primitives.len(), "mesh payload decoded");

    let primitives = scene
        .primitives
        .into_iter()
        .map(|p| {
            let bounds = Aabb::from_positions(p.positions.iter());
            let bounding_sphere = Sphere::from_positions(&p.positions);
            let material = apply_style(p.base_color, style);
            MeshPrimitive {
                positions: p.positions,
                indices: p.indices,
                batch_ids: p.batch_ids,
                material,
                bounds,
                bounding_sphere,
            }
        })
        .collect();

    Ok(MeshContent {
        primitives,
        batch_table: container.batch_table.clone(),
    })
}

fn apply_style(native_color: [f32; 4], style: &StyleParams) -> MaterialDescriptor {
    let mut base_color = native_color;
    if let Some(color) = style.color {
        base_color[0] = color[0];
        base_color[1] = color[1];
        base_color[2] = color[2];
    }
    let mut transparent = false;
    if let Some(opacity) = style.opacity {
        base_color[3] = opacity;
        transparent = opacity < 1.0;
    }
    MaterialDescriptor {
        base_color,
        transparent,
        depth_write: true,
    }
}
