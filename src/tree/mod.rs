//! The recursive spatial tree and its streaming engine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      StreamingEngine                       │
//! │  run_pass(ctx) ──► check_load ──► load / unload decisions  │
//! │       │                               │                    │
//! │       │ spawns                        │ detaches groups    │
//! │       ▼                               ▼                    │
//! │  fetch + decode tasks           SceneGraph arena           │
//! │       │                                                    │
//! │       └──► completion events ──► drain_completions ──►     │
//! │            apply content / splice manifests / one redraw   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Traversal is synchronous and never suspends mid-tree; loads are
//! fire-and-forget tasks whose completions are applied between passes.

mod engine;
mod node;
mod traversal;

pub use engine::StreamingEngine;
pub use node::{ContentRef, ContentState, LoadState, NodeId, Refine, TileGroups, TileNode};
pub use traversal::{LodPolicy, TraversalContext};

use glam::DMat4;

use crate::container::ContentKind;
use crate::fetch::resolve_url;
use crate::math::Aabb;
use crate::scene::SceneGraph;
use crate::tileset::{StyleParams, TileDescriptor};

/// Arena owning every tile node. Parent to child is the only ownership
/// direction; nodes are addressed by [`NodeId`] handles.
#[derive(Debug, Default)]
pub struct TileTree {
    nodes: Vec<TileNode>,
}

impl TileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TileNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TileNode {
        &mut self.nodes[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Recursively construct nodes from a manifest descriptor, depth-first,
    /// children in manifest order.
    ///
    /// Each node gets three scene groups (see [`TileGroups`]); the child's
    /// `total` group attaches under the parent's `children` group, so
    /// detaching a parent's `children` group hides the whole subtree.
    pub fn build_subtree(
        &mut self,
        scene: &mut SceneGraph,
        desc: &TileDescriptor,
        resource_base: &str,
        style: &StyleParams,
        parent_refine: Refine,
        parent_transform: DMat4,
    ) -> NodeId {
        let refine = Refine::parse(desc.refine.as_deref()).unwrap_or(parent_refine);
        let geometric_error = desc.geometric_error * style.error_scale();

        let local_transform = desc
            .transform
            .map(|t| DMat4::from_cols_array(&t))
            .unwrap_or(DMat4::IDENTITY);
        let world_transform = parent_transform * local_transform;

        let total = scene.add_group(None);
        let content_group = scene.add_group(Some(total));
        let children_group = scene.add_group(Some(total));
        scene.apply_transform(total, local_transform);

        let bounding_box = desc
            .bounding_volume
            .as_ref()
            .and_then(|bv| bv.obb.as_ref())
            .map(Aabb::from_box_array);

        let content = desc.content.as_ref().and_then(|c| c.reference()).map(|r| {
            let url = resolve_url(resource_base, r);
            let kind = ContentKind::from_declared(&url);
            ContentRef { url, kind }
        });

        let id = NodeId(self.nodes.len());
        self.nodes.push(TileNode {
            bounding_box,
            geometric_error,
            refine,
            local_transform,
            world_transform,
            children: Vec::new(),
            content,
            groups: TileGroups {
                total,
                content: content_group,
                children: children_group,
            },
            style: style.clone(),
            content_state: ContentState::NotRequested,
            decoded: None,
            debug_box: None,
            content_detached: false,
            children_detached: false,
            spliced: false,
            mesh_oriented: false,
            cancel: None,
        });

        let mut children = Vec::with_capacity(desc.children.len());
        for child_desc in &desc.children {
            let child = self.build_subtree(
                scene,
                child_desc,
                resource_base,
                style,
                refine,
                world_transform,
            );
            scene.attach(children_group, self.nodes[child.0].groups.total);
            children.push(child);
        }
        self.nodes[id.0].children = children;

        id
    }
}
