//! Renderable scene graph and the external renderer seam.

mod graph;

pub use graph::{GroupId, SceneGraph};

use crate::layer::Camera;
use crate::tree::TileTree;

/// External rasterizer. The engine hands it the scene transforms, the tile
/// tree (whose nodes own the decoded geometry), and a camera; everything
/// else about drawing is the host's business.
pub trait Renderer {
    fn draw(&mut self, scene: &SceneGraph, tree: &TileTree, camera: &Camera);
}
