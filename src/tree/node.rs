//! Tile node: one element of the spatial hierarchy.

use glam::DMat4;
use tokio_util::sync::CancellationToken;

use crate::container::ContentKind;
use crate::decode::{DebugBox, TileContent};
use crate::math::Aabb;
use crate::scene::GroupId;
use crate::tileset::StyleParams;

/// Handle to a tile node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether children supplement or supersede a node's own content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refine {
    Add,
    Replace,
}

impl Refine {
    /// Parse a manifest refine string, case-insensitive. `None` for absent
    /// or unknown values, so the parent's policy is inherited.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value?.to_ascii_uppercase().as_str() {
            "ADD" => Some(Self::Add),
            "REPLACE" => Some(Self::Replace),
            _ => None,
        }
    }
}

/// Outcome of a node's content load, distinguishing "never tried" from
/// "tried and failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentState {
    NotRequested,
    InFlight,
    /// Terminal: failed nodes stay content-less and do not retry.
    Failed,
    Decoded,
}

/// The externally visible load state surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No content attached and none requested yet.
    Unloaded,
    /// A load task is in flight.
    Pending,
    /// Load failed; the node behaves as content-less.
    Failed,
    /// Content decoded and attached to the renderable graph.
    Loaded,
    /// Content decoded but detached from the renderable graph.
    Detached,
}

/// Reference to a payload to decode on demand.
#[derive(Debug, Clone)]
pub struct ContentRef {
    /// Fully resolved URL.
    pub url: String,
    /// Kind decided from the declared reference; `None` means unrecognized
    /// and fails at load time.
    pub kind: Option<ContentKind>,
}

/// Scene groups owned by one tile: `total` carries the tile transform and
/// parents both `content` (this tile's own geometry) and `children` (the
/// subtree). Detaching `content` hides just this tile; detaching `children`
/// hides the whole subtree.
#[derive(Debug, Clone, Copy)]
pub struct TileGroups {
    pub total: GroupId,
    pub content: GroupId,
    pub children: GroupId,
}

/// A node in the tile tree.
#[derive(Debug)]
pub struct TileNode {
    /// Bounding box in the manifest's local frame; `None` permits content
    /// without a spatial bound (always treated as visible).
    pub bounding_box: Option<Aabb>,
    /// Non-negative; larger means coarser. Already scaled by the layer
    /// style factor.
    pub geometric_error: f64,
    pub refine: Refine,
    pub local_transform: DMat4,
    /// Product of ancestor local transforms at construction (or splice)
    /// time.
    pub world_transform: DMat4,
    /// Manifest order; stable.
    pub children: Vec<NodeId>,
    pub content: Option<ContentRef>,
    pub groups: TileGroups,
    pub style: StyleParams,

    pub(crate) content_state: ContentState,
    pub(crate) decoded: Option<TileContent>,
    pub(crate) debug_box: Option<DebugBox>,
    /// Mirrors of the scene attachment, kept so unload/load pairs are
    /// idempotent without consulting the scene.
    pub(crate) content_detached: bool,
    pub(crate) children_detached: bool,
    /// A nested manifest is spliced in at most once.
    pub(crate) spliced: bool,
    /// Mesh payloads are Y-up; the content group is rotated to Z-up once.
    pub(crate) mesh_oriented: bool,
    pub(crate) cancel: Option<CancellationToken>,
}

impl TileNode {
    pub fn load_state(&self) -> LoadState {
        match self.content_state {
            ContentState::NotRequested => LoadState::Unloaded,
            ContentState::InFlight => LoadState::Pending,
            ContentState::Failed => LoadState::Failed,
            ContentState::Decoded => {
                if self.content_detached {
                    LoadState::Detached
                } else {
                    LoadState::Loaded
                }
            }
        }
    }

    pub fn decoded(&self) -> Option<&TileContent> {
        self.decoded.as_ref()
    }

    pub fn debug_box(&self) -> Option<&DebugBox> {
        self.debug_box.as_ref()
    }

    /// Whether this node's own content group is attached under its total
    /// group.
    pub fn content_attached(&self) -> bool {
        !self.content_detached
    }

    pub fn children_attached(&self) -> bool {
        !self.children_detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refine_parse() {
        assert_eq!(Refine::parse(Some("ADD")), Some(Refine::Add));
        assert_eq!(Refine::parse(Some("replace")), Some(Refine::Replace));
        assert_eq!(Refine::parse(Some("other")), None);
        assert_eq!(Refine::parse(None), None);
    }
}
