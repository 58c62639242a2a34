//! Geometry math shared across the engine.
//!
//! All spatial reasoning is done in f64 (`glam` `DMat4`/`DVec3`): tileset
//! transforms accumulate over deep trees and geographic coordinate magnitudes
//! lose precision quickly in f32. Decoded vertex data stays f32.

mod frustum;
mod ray;
mod volume;

pub use frustum::Frustum;
pub use ray::Ray;
pub use volume::{Aabb, Sphere};
