//! Load/unload decision procedure and asynchronous content loading.

use std::sync::Arc;

use glam::DMat4;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::cache::ContentCache;
use crate::container::{ContentKind, FormatError};
use crate::decode::{debug_box, GeometryDecoder, TileContent};
use crate::fetch::Fetcher;
use crate::scene::SceneGraph;
use crate::tileset::{StyleParams, Tileset, TilesetError, TilesetManifest};

use super::node::{ContentState, NodeId, Refine};
use super::traversal::TraversalContext;
use super::TileTree;

/// Completion delivered by a load task.
enum LoadEvent {
    /// Content fetched and decoded.
    Decoded {
        node: NodeId,
        content: Box<TileContent>,
    },
    /// A nested manifest fetched and parsed, ready to splice.
    Manifest {
        node: NodeId,
        manifest: Box<TilesetManifest>,
        url: String,
    },
    /// Fetch, parse, or decode failed; the node becomes content-less.
    Failed { node: NodeId, message: String },
}

/// Owns the tile tree and scene, runs traversal passes, and brokers
/// asynchronous content loads.
///
/// Traversal (`run_pass`) is synchronous; content loads are spawned
/// fire-and-forget and their completions applied by `drain_completions`,
/// which coalesces any number of completions into a single redraw request.
/// Must be driven from within a tokio runtime.
pub struct StreamingEngine {
    tree: TileTree,
    scene: SceneGraph,
    root: Option<NodeId>,
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<GeometryDecoder>,
    cache: ContentCache,
    events_tx: mpsc::UnboundedSender<LoadEvent>,
    events_rx: mpsc::UnboundedReceiver<LoadEvent>,
    last_ctx: Option<TraversalContext>,
    dirty: bool,
}

impl StreamingEngine {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        decoder: Arc<GeometryDecoder>,
        content_budget_bytes: usize,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            tree: TileTree::new(),
            scene: SceneGraph::new(),
            root: None,
            fetcher,
            decoder,
            cache: ContentCache::new(content_budget_bytes),
            events_tx,
            events_rx,
            last_ctx: None,
            dirty: false,
        }
    }

    pub fn tree(&self) -> &TileTree {
        &self.tree
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Fetch the root manifest and construct the tree, replacing any
    /// previously loaded tileset. Manifest failures propagate; the engine
    /// stays empty and usable.
    pub async fn load_tileset(
        &mut self,
        url: &str,
        style: &StyleParams,
    ) -> Result<Tileset, TilesetError> {
        if !self.tree.is_empty() {
            self.shutdown();
        }
        let tileset = Tileset::load(
            self.fetcher.as_ref(),
            url,
            style,
            &mut self.tree,
            &mut self.scene,
        )
        .await?;
        let root_total = self.tree.node(tileset.root).groups.total;
        let scene_root = self.scene.root();
        self.scene.attach(scene_root, root_total);
        self.scene.update_world_transforms();
        self.root = Some(tileset.root);
        self.dirty = true;
        Ok(tileset)
    }

    /// Run one traversal pass against a single frustum/camera snapshot.
    ///
    /// Returns whether any visible state changed (a redraw is warranted).
    /// Re-running with an unchanged snapshot is a no-op.
    pub fn run_pass(&mut self, ctx: &TraversalContext) -> bool {
        self.last_ctx = Some(*ctx);
        self.scene.update_world_transforms();
        if let Some(root) = self.root {
            self.check_load(root, ctx);
        }
        self.evict_over_budget();
        self.take_dirty()
    }

    /// Apply all pending load completions. Returns whether a redraw is
    /// warranted; any number of completions coalesce into one `true`.
    pub fn drain_completions(&mut self) -> bool {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                LoadEvent::Decoded { node, content } => self.apply_decoded(node, *content),
                LoadEvent::Manifest {
                    node,
                    manifest,
                    url,
                } => self.apply_manifest(node, &manifest, &url),
                LoadEvent::Failed { node, message } => self.apply_failed(node, &message),
            }
        }
        if self.dirty {
            // Content orientation may have changed group transforms.
            self.scene.update_world_transforms();
        }
        self.evict_over_budget();
        self.take_dirty()
    }

    /// Cancel every in-flight load and drop the tree; called when the
    /// owning layer is removed.
    pub fn shutdown(&mut self) {
        for id in self.tree.ids().collect::<Vec<_>>() {
            if let Some(token) = self.tree.node_mut(id).cancel.take() {
                token.cancel();
            }
        }
        // Queued completions refer to nodes of the tree being dropped;
        // applying them to a replacement tree would hit reused indices.
        while self.events_rx.try_recv().is_ok() {}
        self.tree = TileTree::new();
        self.scene = SceneGraph::new();
        self.root = None;
        self.cache = ContentCache::new(self.cache.budget_bytes());
        self.last_ctx = None;
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// The per-node decision procedure, top-down.
    fn check_load(&mut self, id: NodeId, ctx: &TraversalContext) {
        let (bounds, geometric_error, refine, world_transform, total_group, children) = {
            let node = self.tree.node(id);
            (
                node.bounding_box,
                node.geometric_error,
                node.refine,
                node.world_transform,
                node.groups.total,
                node.children.clone(),
            )
        };

        // A node without a spatial bound is always relevant at distance 0.
        let dist = match bounds {
            Some(bounds) => {
                let frustum_box = bounds.transformed(&self.scene.world_transform(total_group));
                if !ctx.frustum.intersects_aabb(&frustum_box) {
                    self.unload(id, true);
                    return;
                }
                bounds
                    .transformed(&world_transform)
                    .distance_to_point(ctx.camera_position)
            }
            None => 0.0,
        };

        // Too coarse or far to matter.
        if geometric_error > 0.0 && dist > geometric_error * ctx.policy.cull_factor {
            self.unload(id, true);
            return;
        }

        // Under REPLACE refinement the children supersede this node's own
        // content once they are close enough to load.
        if refine == Refine::Replace && dist < geometric_error * ctx.policy.refine_factor {
            self.unload(id, false);
        } else {
            self.load(id, ctx);
        }

        for child in children {
            if dist < geometric_error * ctx.policy.refine_factor {
                self.check_load(child, ctx);
            } else {
                self.unload(child, true);
            }
        }
    }

    /// Attach (or begin loading) a node's own content.
    fn load(&mut self, id: NodeId, _ctx: &TraversalContext) {
        let groups = self.tree.node(id).groups;

        // Cheap re-attach path: previously decoded content comes back
        // without a re-fetch.
        if self.tree.node(id).content_detached {
            self.scene.attach(groups.total, groups.content);
            let node = self.tree.node_mut(id);
            node.content_detached = false;
            if node.decoded.is_some() {
                self.cache.touch(id);
            }
            self.dirty = true;
        }
        if self.tree.node(id).children_detached {
            self.scene.attach(groups.total, groups.children);
            self.tree.node_mut(id).children_detached = false;
            self.dirty = true;
        }

        match self.tree.node(id).content_state {
            ContentState::NotRequested => {}
            // Decoded is terminal until eviction; Failed never retries;
            // InFlight is already on its way.
            ContentState::Decoded | ContentState::Failed | ContentState::InFlight => return,
        }

        let Some(content_ref) = self.tree.node(id).content.clone() else {
            return;
        };
        let Some(kind) = content_ref.kind else {
            warn!(
                node = id.index(),
                url = %content_ref.url,
                error = %FormatError::UnknownKind { url: content_ref.url.clone() },
                "tile load failed"
            );
            self.tree.node_mut(id).content_state = ContentState::Failed;
            return;
        };

        match kind {
            ContentKind::Composite => {
                warn!(
                    node = id.index(),
                    url = %content_ref.url,
                    error = %FormatError::UnimplementedKind,
                    "tile load failed"
                );
                self.tree.node_mut(id).content_state = ContentState::Failed;
            }
            ContentKind::Tileset => self.spawn_manifest_load(id, content_ref.url),
            ContentKind::Mesh | ContentKind::Points => {
                self.spawn_content_load(id, content_ref.url, kind)
            }
        }
    }

    fn spawn_content_load(&mut self, id: NodeId, url: String, declared: ContentKind) {
        let token = CancellationToken::new();
        {
            let node = self.tree.node_mut(id);
            node.content_state = ContentState::InFlight;
            node.cancel = Some(token.clone());
        }
        let fetcher = Arc::clone(&self.fetcher);
        let decoder = Arc::clone(&self.decoder);
        let style = self.tree.node(id).style.clone();
        let tx = self.events_tx.clone();
        trace!(node = id.index(), url = %url, "content load dispatched");

        tokio::spawn(async move {
            let work = async {
                let bytes = fetcher.get(&url).await.map_err(|e| e.to_string())?;
                // Trust the payload over the declared extension when the
                // magic bytes identify another container format.
                let kind = match ContentKind::sniff(&bytes) {
                    Some(sniffed @ (ContentKind::Mesh | ContentKind::Points))
                        if sniffed != declared =>
                    {
                        debug!(url = %url, ?declared, ?sniffed, "content kind sniffed from payload");
                        sniffed
                    }
                    _ => declared,
                };
                decoder.decode(kind, bytes, &style).map_err(|e| e.to_string())
            };
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(node = id.index(), "content load cancelled");
                }
                result = work => {
                    let event = match result {
                        Ok(content) => LoadEvent::Decoded { node: id, content: Box::new(content) },
                        Err(message) => LoadEvent::Failed { node: id, message },
                    };
                    let _ = tx.send(event);
                }
            }
        });
    }

    fn spawn_manifest_load(&mut self, id: NodeId, url: String) {
        let token = CancellationToken::new();
        {
            let node = self.tree.node_mut(id);
            node.content_state = ContentState::InFlight;
            node.cancel = Some(token.clone());
        }
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.events_tx.clone();
        trace!(node = id.index(), url = %url, "nested manifest load dispatched");

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(node = id.index(), "manifest load cancelled");
                }
                result = Tileset::fetch_manifest(fetcher.as_ref(), &url) => {
                    let event = match result {
                        Ok(manifest) => LoadEvent::Manifest {
                            node: id,
                            manifest: Box::new(manifest),
                            url,
                        },
                        Err(e) => LoadEvent::Failed { node: id, message: e.to_string() },
                    };
                    let _ = tx.send(event);
                }
            }
        });
    }

    /// Detach a node's own content, and optionally its whole subtree, from
    /// the renderable graph. Content is detached, not destroyed; the cache
    /// decides later whether to free it.
    fn unload(&mut self, id: NodeId, include_children: bool) {
        let groups = self.tree.node(id).groups;

        if let Some(token) = self.tree.node_mut(id).cancel.take() {
            token.cancel();
            if self.tree.node(id).content_state == ContentState::InFlight {
                self.tree.node_mut(id).content_state = ContentState::NotRequested;
            }
        }

        if !self.tree.node(id).content_detached {
            self.scene.detach(groups.total, groups.content);
            self.tree.node_mut(id).content_detached = true;
            self.dirty = true;
        }

        if include_children {
            if !self.tree.node(id).children_detached {
                self.scene.detach(groups.total, groups.children);
                self.tree.node_mut(id).children_detached = true;
                self.dirty = true;
                self.cancel_subtree(id);
            }
        } else if self.tree.node(id).children_detached {
            self.scene.attach(groups.total, groups.children);
            self.tree.node_mut(id).children_detached = false;
            self.dirty = true;
        }
    }

    /// Cancel in-flight loads below a node whose subtree just left the
    /// renderable graph.
    fn cancel_subtree(&mut self, id: NodeId) {
        let mut stack = self.tree.node(id).children.clone();
        while let Some(current) = stack.pop() {
            if let Some(token) = self.tree.node_mut(current).cancel.take() {
                token.cancel();
                if self.tree.node(current).content_state == ContentState::InFlight {
                    self.tree.node_mut(current).content_state = ContentState::NotRequested;
                }
            }
            stack.extend(self.tree.node(current).children.iter().copied());
        }
    }

    /// Attach freshly decoded content. Runs even for nodes unloaded while
    /// the load was in flight; the next pass sweeps them again.
    fn apply_decoded(&mut self, id: NodeId, content: TileContent) {
        let groups = self.tree.node(id).groups;
        let debug_enabled = self.last_ctx.map(|c| c.debug).unwrap_or(false);

        {
            let node = self.tree.node_mut(id);
            node.cancel = None;
            node.content_state = ContentState::Decoded;
        }

        if matches!(content, TileContent::Mesh(_)) && !self.tree.node(id).mesh_oriented {
            // Mesh payloads are Y-up; rotate this tile's content group to
            // Z-up exactly once, surviving eviction and reload.
            self.scene
                .apply_transform(groups.content, DMat4::from_rotation_x(std::f64::consts::FRAC_PI_2));
            self.tree.node_mut(id).mesh_oriented = true;
        }

        self.scene.attach(groups.total, groups.content);
        self.cache.insert(id, content.approx_byte_size());

        let node = self.tree.node_mut(id);
        node.content_detached = false;
        if debug_enabled {
            node.debug_box = node
                .bounding_box
                .map(|bounds| debug_box(bounds, id.index() as u64));
        }
        node.decoded = Some(content);
        self.dirty = true;
        trace!(node = id.index(), "tile content attached");
    }

    /// Splice a nested tileset: coordinate-frame flattening exactly once,
    /// then the spliced sub-root joins the current traversal snapshot.
    fn apply_manifest(&mut self, id: NodeId, manifest: &TilesetManifest, url: &str) {
        if self.tree.node(id).spliced {
            return;
        }

        let (groups, world_transform, style, children_group) = {
            let node = self.tree.node_mut(id);
            node.cancel = None;
            node.spliced = true;
            // The splice itself is this node's content; nothing renderable
            // attaches here.
            node.content_state = ContentState::Decoded;
            if let Some(bounds) = node.bounding_box {
                node.bounding_box = Some(bounds.transformed(&node.world_transform));
            }
            (
                node.groups,
                node.world_transform,
                node.style.clone(),
                node.groups.children,
            )
        };

        self.scene
            .apply_transform(groups.total, world_transform.inverse());
        self.tree.node_mut(id).world_transform = DMat4::IDENTITY;

        let sub = Tileset::build(manifest, url, &style, &mut self.tree, &mut self.scene);
        let sub_total = self.tree.node(sub.root).groups.total;
        self.tree.node_mut(id).children.push(sub.root);
        self.scene.attach(children_group, sub_total);
        self.scene.update_world_transforms();
        self.dirty = true;
        debug!(node = id.index(), url = %url, sub_nodes = self.tree.len(), "nested tileset spliced");

        // The spliced subtree participates in the same pass instead of
        // waiting for the next camera change.
        if let Some(ctx) = self.last_ctx {
            self.check_load(sub.root, &ctx);
        }
    }

    /// A single tile's failure never aborts traversal: log, mark, move on.
    fn apply_failed(&mut self, id: NodeId, message: &str) {
        let node = self.tree.node_mut(id);
        node.cancel = None;
        if node.content_state != ContentState::Decoded {
            node.content_state = ContentState::Failed;
        }
        let url = node.content.as_ref().map(|c| c.url.clone()).unwrap_or_default();
        warn!(node = id.index(), url = %url, error = %message, "tile load failed");
    }

    /// Evict least-recently-used *detached* content until under budget.
    /// Evicted nodes return to `NotRequested` and re-fetch on demand.
    fn evict_over_budget(&mut self) {
        while self.cache.over_budget() {
            let victim = self
                .cache
                .lru_order()
                .into_iter()
                .find(|&candidate| {
                    let node = self.tree.node(candidate);
                    node.content_detached && node.decoded.is_some()
                });
            let Some(victim) = victim else {
                // Everything over budget is still attached; nothing safe
                // to drop this pass.
                break;
            };
            let node = self.tree.node_mut(victim);
            node.decoded = None;
            node.debug_box = None;
            node.content_state = ContentState::NotRequested;
            self.cache.remove(victim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use bytes::Bytes;
    use futures::future::BoxFuture;
    use glam::{DMat4, DVec3};

    use crate::container::HEADER_LEN;
    use crate::decode::{DecodeError, DecodedPrimitive, DecodedScene, MeshCodec, PointCodec};
    use crate::fetch::FetchError;
    use crate::math::Frustum;
    use crate::tree::{LoadState, LodPolicy};

    struct MapFetcher {
        map: HashMap<String, Bytes>,
    }

    impl MapFetcher {
        fn new(entries: Vec<(&str, Bytes)>) -> Self {
            Self {
                map: entries
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            }
        }
    }

    impl Fetcher for MapFetcher {
        fn get(&self, url: &str) -> BoxFuture<'_, Result<Bytes, FetchError>> {
            let result = self
                .map
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::NotFound {
                    url: url.to_string(),
                });
            Box::pin(async move { result })
        }
    }

    struct StubMeshCodec;

    impl MeshCodec for StubMeshCodec {
        fn decode_scene(&self, _payload: &[u8]) -> Result<DecodedScene, DecodeError> {
            Ok(DecodedScene {
                primitives: vec![DecodedPrimitive {
                    positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    indices: None,
                    batch_ids: None,
                    base_color: [1.0, 1.0, 1.0, 1.0],
                }],
            })
        }
    }

    struct NoPointCodec;

    impl PointCodec for NoPointCodec {
        fn decode_positions(
            &self,
            _data: &[u8],
            _point_count: usize,
        ) -> Result<Vec<[f32; 3]>, DecodeError> {
            Err(DecodeError::PointCodec("not available".into()))
        }
    }

    fn container(magic: &[u8; 4], ft_json: &[u8], ft_bin: &[u8], payload: &[u8]) -> Bytes {
        let total = HEADER_LEN + ft_json.len() + ft_bin.len() + payload.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(magic);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(ft_json.len() as u32).to_le_bytes());
        out.extend_from_slice(&(ft_bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(ft_json);
        out.extend_from_slice(ft_bin);
        out.extend_from_slice(payload);
        Bytes::from(out)
    }

    fn mesh_tile() -> Bytes {
        container(b"b3dm", b"{}", b"", b"payload")
    }

    fn point_tile() -> Bytes {
        let ft = br#"{"POINTS_LENGTH":1,"POSITION":{"byteOffset":0}}"#;
        let bin = [0u8; 12];
        container(b"pnts", ft, &bin, b"")
    }

    const MANIFEST: &str = r#"{
        "asset": {"version": "1.0"},
        "geometricError": 500,
        "root": {
            "boundingVolume": {"box": [0,0,0, 10,0,0, 0,10,0, 0,0,10]},
            "geometricError": 10,
            "refine": "REPLACE",
            "content": {"uri": "root.b3dm"},
            "children": [
                {
                    "boundingVolume": {"box": [0,0,0, 10,0,0, 0,10,0, 0,0,10]},
                    "geometricError": 4,
                    "content": {"uri": "child.pnts"}
                }
            ]
        }
    }"#;

    fn default_fetcher() -> Arc<MapFetcher> {
        Arc::new(MapFetcher::new(vec![
            ("https://example.com/data/tileset.json", Bytes::from(MANIFEST)),
            ("https://example.com/data/root.b3dm", mesh_tile()),
            ("https://example.com/data/child.pnts", point_tile()),
        ]))
    }

    fn engine_with(fetcher: Arc<MapFetcher>, budget: usize) -> StreamingEngine {
        let decoder = Arc::new(GeometryDecoder::new(
            Arc::new(StubMeshCodec),
            Arc::new(NoPointCodec),
        ));
        StreamingEngine::new(fetcher, decoder, budget)
    }

    /// A frustum wide enough that visibility is decided by distance alone.
    fn ctx_at(x: f64) -> TraversalContext {
        let vp = DMat4::orthographic_rh(-1.0e6, 1.0e6, -1.0e6, 1.0e6, -1.0e6, 1.0e6);
        TraversalContext {
            frustum: Frustum::from_view_projection(&vp),
            camera_position: DVec3::new(x, 0.0, 0.0),
            policy: LodPolicy::default(),
            debug: false,
        }
    }

    async fn settle(engine: &mut StreamingEngine) -> bool {
        let mut redraw = false;
        for _ in 0..50 {
            tokio::task::yield_now().await;
            redraw |= engine.drain_completions();
        }
        redraw
    }

    async fn loaded_engine() -> StreamingEngine {
        let mut engine = engine_with(default_fetcher(), usize::MAX);
        engine
            .load_tileset(
                "https://example.com/data/tileset.json",
                &StyleParams::default(),
            )
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn test_distant_tile_unloads_with_children() {
        let mut engine = loaded_engine().await;
        let root = engine.root().unwrap();

        // ge 10, cull threshold 500; box half-extent 10 at the origin.
        engine.run_pass(&ctx_at(610.0));
        settle(&mut engine).await;

        let node = engine.tree().node(root);
        assert!(!node.content_attached());
        assert!(!node.children_attached());
        assert_eq!(node.load_state(), LoadState::Unloaded);
    }

    #[tokio::test]
    async fn test_out_of_frustum_tile_unloads_with_children() {
        let mut engine = loaded_engine().await;
        let root = engine.root().unwrap();

        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;
        assert_eq!(engine.tree().node(root).load_state(), LoadState::Loaded);

        // Camera still close, but the frustum covers x in [100, 200] and
        // misses the box at the origin entirely.
        let vp = DMat4::orthographic_rh(100.0, 200.0, -50.0, 50.0, -50.0, 50.0);
        let ctx = TraversalContext {
            frustum: Frustum::from_view_projection(&vp),
            camera_position: DVec3::new(0.0, 0.0, 30.0),
            policy: LodPolicy::default(),
            debug: false,
        };
        engine.run_pass(&ctx);
        settle(&mut engine).await;

        let node = engine.tree().node(root);
        assert_eq!(node.load_state(), LoadState::Detached);
        assert!(!node.children_attached());
    }

    #[tokio::test]
    async fn test_mid_distance_loads_own_content_gates_children() {
        let mut engine = loaded_engine().await;
        let root = engine.root().unwrap();

        // dist 300 sits between refine (200) and cull (500).
        let redraw = {
            engine.run_pass(&ctx_at(310.0));
            settle(&mut engine).await
        };
        assert!(redraw);

        let node = engine.tree().node(root);
        assert_eq!(node.load_state(), LoadState::Loaded);
        assert!(node.decoded().is_some());
        let child = engine.tree().node(node.children[0]);
        assert!(!engine
            .scene()
            .is_in_renderable_graph(child.groups.content));
    }

    #[tokio::test]
    async fn test_replace_detaches_parent_when_refining() {
        let mut engine = loaded_engine().await;
        let root = engine.root().unwrap();

        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;
        assert_eq!(engine.tree().node(root).load_state(), LoadState::Loaded);

        // Within the refine threshold REPLACE hands over to the children.
        engine.run_pass(&ctx_at(160.0));
        settle(&mut engine).await;

        let node = engine.tree().node(root);
        assert_eq!(node.load_state(), LoadState::Detached);
        assert!(node.children_attached());
        let child = engine.tree().node(node.children[0]);
        assert_eq!(child.load_state(), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_rerunning_unchanged_snapshot_requests_no_redraw() {
        let mut engine = loaded_engine().await;

        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;

        let redraw = engine.run_pass(&ctx_at(310.0));
        assert!(!redraw);
        assert!(!settle(&mut engine).await);
    }

    #[tokio::test]
    async fn test_failed_load_is_terminal() {
        let fetcher = Arc::new(MapFetcher::new(vec![(
            "https://example.com/data/tileset.json",
            Bytes::from(MANIFEST),
        )]));
        let mut engine = engine_with(fetcher, usize::MAX);
        engine
            .load_tileset(
                "https://example.com/data/tileset.json",
                &StyleParams::default(),
            )
            .await
            .unwrap();
        let root = engine.root().unwrap();

        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;
        assert_eq!(engine.tree().node(root).load_state(), LoadState::Failed);

        // No retry on subsequent passes.
        engine.run_pass(&ctx_at(310.0));
        assert_eq!(
            engine.tree().node(root).content_state,
            ContentState::Failed
        );
        assert!(!settle(&mut engine).await);
    }

    #[tokio::test]
    async fn test_nested_manifest_splices_once() {
        let nested = r#"{
            "asset": {"version": "1.0"},
            "geometricError": 500,
            "root": {
                "boundingVolume": {"box": [0,0,0, 10,0,0, 0,10,0, 0,0,10]},
                "geometricError": 10,
                "content": {"uri": "inner.b3dm"}
            }
        }"#;
        let outer = r#"{
            "asset": {"version": "1.0"},
            "geometricError": 500,
            "root": {
                "boundingVolume": {"box": [0,0,0, 10,0,0, 0,10,0, 0,0,10]},
                "geometricError": 10,
                "content": {"uri": "sub/tileset.json"}
            }
        }"#;
        let fetcher = Arc::new(MapFetcher::new(vec![
            ("https://example.com/data/tileset.json", Bytes::from(outer)),
            ("https://example.com/data/sub/tileset.json", Bytes::from(nested)),
            ("https://example.com/data/sub/inner.b3dm", mesh_tile()),
        ]));
        let mut engine = engine_with(fetcher, usize::MAX);
        engine
            .load_tileset(
                "https://example.com/data/tileset.json",
                &StyleParams::default(),
            )
            .await
            .unwrap();
        let root = engine.root().unwrap();

        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;

        let node = engine.tree().node(root);
        assert_eq!(node.children.len(), 1);
        let sub_root = node.children[0];
        assert_eq!(
            engine.tree().node(sub_root).load_state(),
            LoadState::Loaded
        );

        // Re-running never splices a second copy.
        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;
        assert_eq!(engine.tree().node(root).children.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_keeps_configured_budget() {
        let mut engine = engine_with(default_fetcher(), 1);
        engine
            .load_tileset(
                "https://example.com/data/tileset.json",
                &StyleParams::default(),
            )
            .await
            .unwrap();
        engine.shutdown();

        // The 1-byte budget survives the shutdown: after reloading, content
        // detached by the next pass still evicts under pressure.
        engine
            .load_tileset(
                "https://example.com/data/tileset.json",
                &StyleParams::default(),
            )
            .await
            .unwrap();
        let root = engine.root().unwrap();

        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;
        assert_eq!(engine.tree().node(root).load_state(), LoadState::Loaded);

        engine.run_pass(&ctx_at(610.0));
        settle(&mut engine).await;
        let node = engine.tree().node(root);
        assert_eq!(node.load_state(), LoadState::Unloaded);
        assert!(node.decoded().is_none());
    }

    #[tokio::test]
    async fn test_reloading_tileset_replaces_tree() {
        let mut engine = loaded_engine().await;
        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;
        let nodes_after_first = engine.tree().len();

        // A second load starts from fresh arenas rather than appending to
        // the old tree.
        engine
            .load_tileset(
                "https://example.com/data/tileset.json",
                &StyleParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(engine.tree().len(), nodes_after_first);
        let root = engine.root().unwrap();
        assert_eq!(engine.tree().node(root).load_state(), LoadState::Unloaded);
        assert_eq!(engine.cache.total_bytes(), 0);
    }

    #[tokio::test]
    async fn test_detached_content_evicts_under_pressure() {
        let mut engine = engine_with(default_fetcher(), 1);
        engine
            .load_tileset(
                "https://example.com/data/tileset.json",
                &StyleParams::default(),
            )
            .await
            .unwrap();
        let root = engine.root().unwrap();

        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;
        // Attached content is over budget but never evicted.
        assert_eq!(engine.tree().node(root).load_state(), LoadState::Loaded);

        engine.run_pass(&ctx_at(610.0));
        settle(&mut engine).await;

        // Once detached the over-budget content drops and the node refetches
        // on demand.
        let node = engine.tree().node(root);
        assert_eq!(node.load_state(), LoadState::Unloaded);
        assert!(node.decoded().is_none());

        engine.run_pass(&ctx_at(310.0));
        settle(&mut engine).await;
        assert_eq!(engine.tree().node(root).load_state(), LoadState::Loaded);
    }
}
