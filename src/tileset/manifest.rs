//! Tileset manifest document model.
//!
//! Fetched once per tileset, parsed into the node tree, then discarded;
//! only the tree persists.

use serde::Deserialize;

/// Top-level manifest document.
#[derive(Debug, Clone, Deserialize)]
pub struct TilesetManifest {
    pub asset: AssetInfo,
    #[serde(rename = "geometricError")]
    pub geometric_error: f64,
    pub root: TileDescriptor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetInfo {
    pub version: String,
}

/// One node descriptor in the manifest tree.
#[derive(Debug, Clone, Deserialize)]
pub struct TileDescriptor {
    #[serde(rename = "boundingVolume", default)]
    pub bounding_volume: Option<BoundingVolumeDesc>,
    #[serde(rename = "geometricError", default)]
    pub geometric_error: f64,
    /// `ADD` or `REPLACE`; inherited from the parent when absent.
    #[serde(default)]
    pub refine: Option<String>,
    /// Column-major 4x4 affine transform.
    #[serde(default)]
    pub transform: Option<[f64; 16]>,
    #[serde(default)]
    pub content: Option<ContentDesc>,
    #[serde(default)]
    pub children: Vec<TileDescriptor>,
}

/// Bounding volume; only the oriented-box form is used for traversal.
#[derive(Debug, Clone, Deserialize)]
pub struct BoundingVolumeDesc {
    /// 12 numbers: center, then three half-axis vectors.
    #[serde(rename = "box", default)]
    pub obb: Option<[f64; 12]>,
}

/// Content reference; older manifests use `url` instead of `uri`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentDesc {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ContentDesc {
    pub fn reference(&self) -> Option<&str> {
        self.uri.as_deref().or(self.url.as_deref())
    }
}
