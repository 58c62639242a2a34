//! Error type for geometry decoding.

use thiserror::Error;

use crate::container::FormatError;

/// Errors raised while turning a parsed container into renderable content.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Container-level failure discovered during decode.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The external mesh codec rejected the scene-graph payload.
    #[error("mesh codec failed: {0}")]
    MeshCodec(String),

    /// The external point-compression codec rejected the position buffer.
    #[error("point codec failed: {0}")]
    PointCodec(String),

    /// A manifest payload was routed to the geometry decoder; manifests
    /// splice into the tree instead of decoding to content.
    #[error("manifest content cannot decode to geometry")]
    NotRenderable,
}
