//! Tagged content-kind dispatch.
//!
//! Content references carry a kind decided from the declared URL at tree
//! construction time, or sniffed from the payload's leading bytes. Decision
//! points switch on this enum, never on URL suffix strings.

use super::header::{COMPOSITE_MAGIC, MESH_MAGIC, POINT_MAGIC};

/// The four recognized tile content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Mesh tile container (opaque scene-graph payload).
    Mesh,
    /// Point cloud tile container.
    Points,
    /// Nested tileset manifest, spliced into the tree as a subtree.
    Tileset,
    /// Composite container; recognized but unimplemented.
    Composite,
}

impl ContentKind {
    /// Decide the kind from a resolved content URL.
    ///
    /// Returns `None` for unrecognized extensions; callers surface that as a
    /// `FormatError` at load time.
    pub fn from_declared(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path.rsplit('.').next()?;
        match ext.to_ascii_lowercase().as_str() {
            "b3dm" => Some(Self::Mesh),
            "pnts" => Some(Self::Points),
            "json" => Some(Self::Tileset),
            "cmpt" => Some(Self::Composite),
            _ => None,
        }
    }

    /// Sniff the kind from a payload's leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 4 {
            match &bytes[..4] {
                m if m == MESH_MAGIC => return Some(Self::Mesh),
                m if m == POINT_MAGIC => return Some(Self::Points),
                m if m == COMPOSITE_MAGIC => return Some(Self::Composite),
                _ => {}
            }
        }
        // A manifest is a JSON document; skip leading whitespace.
        let first = bytes.iter().find(|b| !b.is_ascii_whitespace())?;
        if *first == b'{' {
            return Some(Self::Tileset);
        }
        None
    }
}
