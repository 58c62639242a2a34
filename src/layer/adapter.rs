//! The host-facing layer adapter.
//!
//! A [`TilesLayer`] is what a map host actually holds: it wires host
//! callbacks (attach, view change, frame pump, render, pick, detach) to the
//! streaming engine. The host is abstracted behind [`HostMap`] so the whole
//! lifecycle runs against a test double.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::DEFAULT_CONTENT_BUDGET;
use crate::decode::GeometryDecoder;
use crate::fetch::Fetcher;
use crate::math::Ray;
use crate::scene::Renderer;
use crate::tileset::StyleParams;
use crate::tree::{LodPolicy, StreamingEngine, TraversalContext};

use super::camera::Camera;
use super::picking::{PickedFeature, Picker};

/// The minimal surface a map host must expose to the layer.
pub trait HostMap: Send {
    /// Canvas size in pixels.
    fn canvas_size(&self) -> (u32, u32);
    /// Schedule one repaint. Any number of requests between frames collapse
    /// into a single draw on the host side.
    fn request_redraw(&self);
}

/// Construction-time layer configuration.
#[derive(Debug, Clone)]
pub struct LayerParams {
    pub id: String,
    /// Root manifest URL.
    pub url: String,
    pub style: StyleParams,
    pub policy: LodPolicy,
    /// Emit per-tile wireframe bounds.
    pub debug: bool,
    pub content_budget_bytes: usize,
}

impl LayerParams {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            style: StyleParams::default(),
            policy: LodPolicy::default(),
            debug: false,
            content_budget_bytes: DEFAULT_CONTENT_BUDGET,
        }
    }
}

/// One streamed tileset bound to a host map.
pub struct TilesLayer {
    params: LayerParams,
    engine: StreamingEngine,
    picker: Picker,
    camera: Option<Camera>,
}

impl TilesLayer {
    pub fn new(
        params: LayerParams,
        fetcher: Arc<dyn Fetcher>,
        decoder: Arc<GeometryDecoder>,
    ) -> Self {
        let engine = StreamingEngine::new(fetcher, decoder, params.content_budget_bytes);
        Self {
            params,
            engine,
            picker: Picker::new(),
            camera: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.params.id
    }

    pub fn engine(&self) -> &StreamingEngine {
        &self.engine
    }

    /// Host added the layer: fetch the root manifest and build the tree.
    ///
    /// A failed manifest leaves an empty but functional layer; the host map
    /// keeps working either way.
    pub async fn attach(&mut self, host: &dyn HostMap) {
        match self
            .engine
            .load_tileset(&self.params.url, &self.params.style)
            .await
        {
            Ok(tileset) => {
                info!(
                    layer = %self.params.id,
                    url = %tileset.url,
                    version = %tileset.version,
                    "layer attached"
                );
            }
            Err(e) => {
                warn!(
                    layer = %self.params.id,
                    url = %self.params.url,
                    error = %e,
                    "tileset failed to load, layer stays empty"
                );
            }
        }
        host.request_redraw();
    }

    /// Host camera moved: run one traversal pass against the new snapshot.
    pub fn on_view_change(&mut self, camera: Camera, host: &dyn HostMap) {
        let ctx = self.traversal_context(&camera);
        self.camera = Some(camera);
        if self.engine.run_pass(&ctx) {
            host.request_redraw();
        }
    }

    /// Frame pump: absorb finished loads. Any number of completions since
    /// the last call yield at most one redraw request.
    pub fn pump(&mut self, host: &dyn HostMap) {
        if self.engine.drain_completions() {
            host.request_redraw();
        }
    }

    /// Hand the current scene to the host's rasterizer.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        if let Some(camera) = &self.camera {
            renderer.draw(self.engine.scene(), self.engine.tree(), camera);
        }
    }

    /// Resolve the feature under a screen pixel; at most one, which also
    /// becomes the highlighted feature. Without a camera there is nothing
    /// on screen to pick.
    pub fn query_rendered_features(
        &mut self,
        screen_x: f64,
        screen_y: f64,
        host: &dyn HostMap,
    ) -> Vec<PickedFeature> {
        let Some(camera) = &self.camera else {
            return Vec::new();
        };
        let (width, height) = host.canvas_size();
        let Some(ray) = Ray::from_screen(
            screen_x,
            screen_y,
            width as f64,
            height as f64,
            &camera.view_projection(),
        ) else {
            self.picker.clear();
            return Vec::new();
        };
        self.picker.pick(
            self.engine.tree(),
            self.engine.scene(),
            ray,
            &self.params.id,
            &self.params.url,
        )
    }

    /// Host removed the layer: cancel outstanding loads and drop the tree.
    pub fn detach(&mut self, host: &dyn HostMap) {
        self.engine.shutdown();
        self.picker.clear();
        self.camera = None;
        info!(layer = %self.params.id, "layer detached");
        host.request_redraw();
    }

    fn traversal_context(&self, camera: &Camera) -> TraversalContext {
        TraversalContext {
            frustum: camera.frustum(),
            camera_position: camera.position(),
            policy: self.params.policy,
            debug: self.params.debug,
        }
    }
}
