//! Screen-coordinate feature picking over attached mesh content.

use glam::DVec3;
use serde_json::{Map, Value};
use tracing::trace;

use crate::decode::TileContent;
use crate::math::Ray;
use crate::scene::SceneGraph;
use crate::tree::{NodeId, TileTree};

/// A feature resolved by a pick, shaped like a GeoJSON feature so hosts can
/// hand it straight to their UI.
#[derive(Debug, Clone)]
pub struct PickedFeature {
    pub feature_type: &'static str,
    pub properties: Map<String, Value>,
    pub layer_id: String,
    pub source_url: String,
}

/// The currently highlighted pick target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub node: NodeId,
    pub primitive: usize,
    pub face: usize,
    pub batch_id: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    t: f64,
    node: NodeId,
    primitive: usize,
    face: usize,
    /// First vertex index of the hit face, for the batch ID lookup.
    vertex: usize,
}

/// Ray picker holding at most one highlight: a hit replaces the previous
/// highlight, a miss clears it.
#[derive(Debug, Default)]
pub struct Picker {
    highlight: Option<Highlight>,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn clear(&mut self) {
        self.highlight = None;
    }

    /// Intersect a world-space ray with every attached mesh primitive and
    /// resolve the closest hit to its batch table properties.
    ///
    /// Point content and detached content are never pickable. Returns at
    /// most one feature.
    pub fn pick(
        &mut self,
        tree: &TileTree,
        scene: &SceneGraph,
        ray: Ray,
        layer_id: &str,
        source_url: &str,
    ) -> Vec<PickedFeature> {
        let mut best: Option<Hit> = None;

        for id in tree.ids() {
            let node = tree.node(id);
            if !node.content_attached() {
                continue;
            }
            let Some(TileContent::Mesh(mesh)) = node.decoded() else {
                continue;
            };
            if !scene.is_in_renderable_graph(node.groups.content) {
                continue;
            }
            let world = scene.world_transform(node.groups.content);

            for (primitive, prim) in mesh.primitives.iter().enumerate() {
                // Coarse reject on the primitive's world-space bounds.
                if ray.intersect_aabb(&prim.bounds.transformed(&world)).is_none() {
                    continue;
                }
                for face in 0..prim.triangle_count() {
                    let Some([i0, i1, i2]) = prim.triangle(face) else {
                        break;
                    };
                    // Malformed payloads can reference vertices the position
                    // accessor does not have; skip such faces instead of
                    // crashing the host mid-query.
                    let (Some(pa), Some(pb), Some(pc)) = (
                        prim.positions.get(i0),
                        prim.positions.get(i1),
                        prim.positions.get(i2),
                    ) else {
                        continue;
                    };
                    let a = world.transform_point3(vertex(*pa));
                    let b = world.transform_point3(vertex(*pb));
                    let c = world.transform_point3(vertex(*pc));
                    if let Some(t) = ray.intersect_triangle(a, b, c) {
                        if best.map_or(true, |h| t < h.t) {
                            best = Some(Hit {
                                t,
                                node: id,
                                primitive,
                                face,
                                vertex: i0,
                            });
                        }
                    }
                }
            }
        }

        let Some(hit) = best else {
            self.clear();
            return Vec::new();
        };

        let node = tree.node(hit.node);
        let Some(TileContent::Mesh(mesh)) = node.decoded() else {
            self.clear();
            return Vec::new();
        };
        let prim = &mesh.primitives[hit.primitive];
        // A batch accessor shorter than the position accessor yields no
        // batch ID rather than a panic.
        let batch_id = prim
            .batch_ids
            .as_ref()
            .and_then(|ids| ids.get(hit.vertex))
            .copied();

        let mut properties = match batch_id {
            Some(id) => {
                let mut props = mesh.batch_table.properties_for(id as usize);
                if props.is_empty() {
                    props.insert("batchId".to_string(), Value::from(id));
                }
                props
            }
            // No batch attribute: fall back to identifying the face itself.
            None => {
                let mut props = Map::new();
                props.insert("index".to_string(), Value::from(hit.face as u64));
                props
            }
        };
        properties.insert("distance".to_string(), Value::from(hit.t));

        self.highlight = Some(Highlight {
            node: hit.node,
            primitive: hit.primitive,
            face: hit.face,
            batch_id,
        });
        trace!(
            node = hit.node.index(),
            face = hit.face,
            batch_id = ?batch_id,
            "pick hit"
        );

        vec![PickedFeature {
            feature_type: "Feature",
            properties,
            layer_id: layer_id.to_string(),
            source_url: source_url.to_string(),
        }]
    }
}

fn vertex(p: [f32; 3]) -> DVec3 {
    DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64)
}
