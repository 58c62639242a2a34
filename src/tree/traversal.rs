//! Traversal policy and per-pass context.

use glam::DVec3;

use crate::math::Frustum;

/// Distance thresholds for the load/unload decision, as multiples of a
/// node's geometric error.
///
/// Beyond `cull_factor * error` a tile is too coarse or far to matter and
/// unloads with its children; within `refine_factor * error` children get
/// the chance to load (and under `REPLACE` refinement the parent's own
/// content detaches). Policy, not physics: configurable, but the defaults
/// are the compatibility values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodPolicy {
    pub cull_factor: f64,
    pub refine_factor: f64,
}

impl Default for LodPolicy {
    fn default() -> Self {
        Self {
            cull_factor: 50.0,
            refine_factor: 20.0,
        }
    }
}

/// One consistent frustum + camera snapshot; taken once per pass so a
/// mid-pass camera update is never observed.
#[derive(Debug, Clone, Copy)]
pub struct TraversalContext {
    pub frustum: Frustum,
    pub camera_position: DVec3,
    pub policy: LodPolicy,
    /// Emit per-node wireframe boxes on decoded content.
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_compatibility_values() {
        let p = LodPolicy::default();
        assert_eq!(p.cull_factor, 50.0);
        assert_eq!(p.refine_factor, 20.0);
    }
}
