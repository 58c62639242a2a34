//! Per-tileset style configuration.

/// Optional per-layer appearance overrides, threaded unchanged into every
/// node at tree construction time. Absent fields mean "use the content's
/// native appearance".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleParams {
    /// Replaces mesh material color, RGB unit floats.
    pub color: Option<[f32; 3]>,
    /// Sets mesh opacity; values below 1.0 flag the material transparent.
    pub opacity: Option<f32>,
    /// Point sprite size for point clouds.
    pub point_size: Option<f32>,
    /// Scales every geometric error in the tileset, coarsening or
    /// sharpening the whole LOD ladder.
    pub geometric_error_scale: Option<f64>,
}

impl StyleParams {
    pub fn error_scale(&self) -> f64 {
        self.geometric_error_scale.unwrap_or(1.0)
    }
}
