//! Host integration: camera snapshots, the layer adapter, and picking.

mod adapter;
mod camera;
mod picking;

pub use adapter::{HostMap, LayerParams, TilesLayer};
pub use camera::Camera;
pub use picking::{Highlight, PickedFeature, Picker};
