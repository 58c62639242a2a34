//! Arena-based transform graph.
//!
//! Groups are addressed by [`GroupId`] handles into a flat arena; parent to
//! child is the only link direction. World transforms are cached and
//! refreshed top-down by [`SceneGraph::update_world_transforms`], which runs
//! once per traversal pass. A group detached from its parent keeps its last
//! cached world transform but is no longer part of the renderable graph.

use glam::DMat4;

/// Handle to a group node in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

#[derive(Debug)]
struct GroupNode {
    local: DMat4,
    world: DMat4,
    children: Vec<GroupId>,
}

impl GroupNode {
    fn new() -> Self {
        Self {
            local: DMat4::IDENTITY,
            world: DMat4::IDENTITY,
            children: Vec::new(),
        }
    }
}

/// Flat arena of transform groups with a single root.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<GroupNode>,
    root: GroupId,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![GroupNode::new()],
            root: GroupId(0),
        }
    }

    pub fn root(&self) -> GroupId {
        self.root
    }

    /// Create a new group. Pass a parent to attach immediately, or `None`
    /// for a detached group attached later.
    pub fn add_group(&mut self, parent: Option<GroupId>) -> GroupId {
        let id = GroupId(self.nodes.len());
        self.nodes.push(GroupNode::new());
        if let Some(parent) = parent {
            self.attach(parent, id);
        }
        id
    }

    /// Attach a child group; no-op when already attached to this parent.
    pub fn attach(&mut self, parent: GroupId, child: GroupId) {
        let node = &mut self.nodes[parent.0];
        if !node.children.contains(&child) {
            node.children.push(child);
        }
    }

    /// Detach a child group; no-op when not attached.
    pub fn detach(&mut self, parent: GroupId, child: GroupId) {
        self.nodes[parent.0].children.retain(|c| *c != child);
    }

    pub fn is_attached(&self, parent: GroupId, child: GroupId) -> bool {
        self.nodes[parent.0].children.contains(&child)
    }

    pub fn set_local_transform(&mut self, id: GroupId, m: DMat4) {
        self.nodes[id.0].local = m;
    }

    /// Pre-multiply the group's local transform, like applying a matrix to
    /// an object in place.
    pub fn apply_transform(&mut self, id: GroupId, m: DMat4) {
        let node = &mut self.nodes[id.0];
        node.local = m * node.local;
    }

    pub fn local_transform(&self, id: GroupId) -> DMat4 {
        self.nodes[id.0].local
    }

    /// Last cached world transform; refresh with
    /// [`update_world_transforms`](Self::update_world_transforms) first.
    pub fn world_transform(&self, id: GroupId) -> DMat4 {
        self.nodes[id.0].world
    }

    /// Recompute cached world transforms top-down from the root.
    pub fn update_world_transforms(&mut self) {
        let root = self.root;
        self.nodes[root.0].world = self.nodes[root.0].local;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let world = self.nodes[id.0].world;
            let children = self.nodes[id.0].children.clone();
            for child in children {
                self.nodes[child.0].world = world * self.nodes[child.0].local;
                stack.push(child);
            }
        }
    }

    /// Whether a group is reachable from the root, i.e. part of the
    /// renderable graph.
    pub fn is_in_renderable_graph(&self, id: GroupId) -> bool {
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            if current == id {
                return true;
            }
            stack.extend(self.nodes[current.0].children.iter().copied());
        }
        false
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
