//! TileStream - streaming and level-of-detail engine for hierarchical 3D tile
//! datasets.
//!
//! This library loads a tileset manifest describing a recursive spatial tree,
//! then progressively fetches, decodes, and attaches tile content as the
//! camera approaches, discarding it again when it leaves view. Rendering,
//! camera input, and the binary mesh/point codecs are external collaborators
//! consumed through narrow trait interfaces.
//!
//! # High-Level API
//!
//! The [`layer`] module provides the host-facing facade:
//!
//! ```ignore
//! use tilestream::layer::{LayerParams, TilesLayer};
//!
//! let params = LayerParams::new("buildings", "https://example.com/tileset.json");
//! let mut layer = TilesLayer::new(params, fetcher, decoder);
//! layer.attach(&host).await;
//!
//! // Every host view change drives one traversal pass; the frame pump
//! // absorbs finished loads between passes.
//! layer.on_view_change(camera, &host);
//! layer.pump(&host);
//! ```

pub mod cache;
pub mod container;
pub mod decode;
pub mod fetch;
pub mod layer;
pub mod logging;
pub mod math;
pub mod scene;
pub mod tileset;
pub mod tree;

/// Version of the TileStream library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
