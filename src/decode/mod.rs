//! Geometry decoding: parsed containers in, renderable content out.
//!
//! The decoder owns no global state. One [`GeometryDecoder`] is constructed
//! with the external codec instances and shared by reference across every
//! tile load; interleaved asynchronous calls are safe because neither the
//! decoder nor the codecs carry node-specific state.

mod codec;
mod content;
mod error;
mod mesh;
mod points;

pub use codec::{DecodedPrimitive, DecodedScene, MeshCodec, PointCodec};
pub use content::{
    DebugBox, MaterialDescriptor, MeshContent, MeshPrimitive, PointContent, TileContent,
};
pub use error::DecodeError;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::container::{parse_container, ContentKind, FormatError, MESH_MAGIC, POINT_MAGIC};
use crate::math::Aabb;
use crate::tileset::StyleParams;

/// Shared geometry decoder.
pub struct GeometryDecoder {
    mesh_codec: Arc<dyn MeshCodec>,
    point_codec: Arc<dyn PointCodec>,
}

impl GeometryDecoder {
    pub fn new(mesh_codec: Arc<dyn MeshCodec>, point_codec: Arc<dyn PointCodec>) -> Self {
        Self {
            mesh_codec,
            point_codec,
        }
    }

    /// Parse and decode a raw tile payload of the given kind.
    ///
    /// `Tileset` payloads are not handled here (they splice into the tree,
    /// not into renderable content); `Composite` is recognized but
    /// unimplemented. Both are format errors at this seam.
    pub fn decode(
        &self,
        kind: ContentKind,
        payload: bytes::Bytes,
        style: &StyleParams,
    ) -> Result<TileContent, DecodeError> {
        match kind {
            ContentKind::Mesh => {
                let container = parse_container(payload, MESH_MAGIC)?;
                Ok(TileContent::Mesh(mesh::decode_mesh(
                    self.mesh_codec.as_ref(),
                    &container,
                    style,
                )?))
            }
            ContentKind::Points => {
                let container = parse_container(payload, POINT_MAGIC)?;
                Ok(TileContent::Points(points::decode_points(
                    self.point_codec.as_ref(),
                    &container,
                    style,
                )?))
            }
            ContentKind::Composite => Err(FormatError::UnimplementedKind.into()),
            ContentKind::Tileset => Err(DecodeError::NotRenderable),
        }
    }
}

/// Build the debug wireframe outline for a node's bounds, with a
/// pseudo-random hue stable for the given seed.
pub fn debug_box(bounds: Aabb, seed: u64) -> DebugBox {
    let mut rng = StdRng::seed_from_u64(seed);
    let hue: f32 = rng.gen_range(0.0..360.0);
    DebugBox {
        bounds,
        color: hue_to_rgb(hue),
    }
}

/// Full-saturation, full-value HSV hue to RGB.
fn hue_to_rgb(hue: f32) -> [f32; 3] {
    let h = (hue / 60.0) % 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    match h as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}
