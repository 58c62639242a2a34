//! Tileset loading: one manifest document in, one node subtree out.

mod error;
mod manifest;
mod style;

pub use error::TilesetError;
pub use manifest::{AssetInfo, BoundingVolumeDesc, ContentDesc, TileDescriptor, TilesetManifest};
pub use style::StyleParams;

use glam::DMat4;
use tracing::info;

use crate::fetch::{url_base, Fetcher};
use crate::scene::SceneGraph;
use crate::tree::{NodeId, Refine, TileTree};

/// A loaded tileset: manifest metadata plus the root of its node subtree.
#[derive(Debug, Clone)]
pub struct Tileset {
    pub url: String,
    pub version: String,
    /// Tileset-level geometric error, scaled by the layer style factor.
    pub geometric_error: f64,
    pub root: NodeId,
}

impl Tileset {
    /// Fetch and parse one manifest document. Network and JSON failures
    /// surface here; no tree is touched.
    pub async fn fetch_manifest(
        fetcher: &dyn Fetcher,
        url: &str,
    ) -> Result<TilesetManifest, TilesetError> {
        let body = fetcher.get(url).await?;
        serde_json::from_slice(&body).map_err(|e| TilesetError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Construct the node tree from a parsed manifest, synchronously and
    /// without network access; per-node content fetch is deferred.
    ///
    /// `style` is threaded unchanged into every node. The root inherits the
    /// manifest root's refine policy, defaulting to `ADD`.
    pub fn build(
        manifest: &TilesetManifest,
        url: &str,
        style: &StyleParams,
        tree: &mut TileTree,
        scene: &mut SceneGraph,
    ) -> Self {
        let resource_base = url_base(url);
        let refine = Refine::parse(manifest.root.refine.as_deref()).unwrap_or(Refine::Add);
        let root = tree.build_subtree(
            scene,
            &manifest.root,
            &resource_base,
            style,
            refine,
            DMat4::IDENTITY,
        );
        info!(
            url = %url,
            version = %manifest.asset.version,
            nodes = tree.len(),
            "tileset tree constructed"
        );
        Self {
            url: url.to_string(),
            version: manifest.asset.version.clone(),
            geometric_error: manifest.geometric_error * style.error_scale(),
            root,
        }
    }

    /// Fetch, parse, and build in one step.
    pub async fn load(
        fetcher: &dyn Fetcher,
        url: &str,
        style: &StyleParams,
        tree: &mut TileTree,
        scene: &mut SceneGraph,
    ) -> Result<Self, TilesetError> {
        let manifest = Self::fetch_manifest(fetcher, url).await?;
        Ok(Self::build(&manifest, url, style, tree, scene))
    }
}
