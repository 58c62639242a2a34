//! Codec seams for the external mesh and point decompressors.
//!
//! The engine treats both codecs as opaque decode functions. One instance of
//! each is shared across all tile loads, so implementations must keep no
//! per-call mutable state.

use super::error::DecodeError;

/// A primitive as delivered by the mesh codec. Declared bounds are carried
/// through but never trusted; the decoder recomputes them from vertex data.
#[derive(Debug, Clone)]
pub struct DecodedPrimitive {
    pub positions: Vec<[f32; 3]>,
    /// Triangle index buffer; `None` means non-indexed triangle soup.
    pub indices: Option<Vec<u32>>,
    /// Per-vertex batch ID attribute, when the payload carries one.
    pub batch_ids: Option<Vec<u32>>,
    /// Material base color straight from the payload, RGBA unit floats.
    pub base_color: [f32; 4],
}

/// Scene-graph payload decoded into flat primitives.
#[derive(Debug, Clone, Default)]
pub struct DecodedScene {
    pub primitives: Vec<DecodedPrimitive>,
}

/// External decoder for opaque mesh scene-graph bytes.
pub trait MeshCodec: Send + Sync {
    fn decode_scene(&self, payload: &[u8]) -> Result<DecodedScene, DecodeError>;
}

/// External decompressor for compressed point position buffers.
pub trait PointCodec: Send + Sync {
    fn decode_positions(
        &self,
        data: &[u8],
        point_count: usize,
    ) -> Result<Vec<[f32; 3]>, DecodeError>;
}
