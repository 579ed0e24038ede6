//! Adoption of loaded asset graphs into a scene.
//!
//! Ids embedded in an asset file are only unique inside that file, so every
//! mesh, transform node and geometry gets a fresh scene id. Transform nodes
//! are flattened: a mesh is parented to its nearest mesh ancestor and picks
//! up the translations of the transform nodes in between.

use glam::Vec3;

use crate::asset_pipeline::asset_graph::{AssetGraph, AssetParent, AssetSource};
use crate::error::{ImportError, Result, SceneError};
use crate::rendering::backend::RenderBackend;
use crate::scene_graph::geometry::{Geometry, TransformNode};
use crate::scene_graph::primitive::{Primitive, PrimitiveKey, PrimitiveKind};
use crate::scene_graph::scene::Scene;

/// Nearest mesh ancestor of a link, and the translation accumulated from the
/// transform nodes walked through to reach it.
#[derive(Debug, Clone, Copy)]
struct ResolvedParent {
    mesh: Option<usize>,
    offset: Vec3,
}

fn resolve_parent(graph: &AssetGraph, start: Option<AssetParent>) -> Result<ResolvedParent> {
    let mut offset = Vec3::ZERO;
    let mut current = start;
    let mut fuel = graph.transform_nodes.len();

    loop {
        match current {
            None => return Ok(ResolvedParent { mesh: None, offset }),
            Some(AssetParent::Mesh(index)) => {
                if index >= graph.meshes.len() {
                    return Err(ImportError::InvalidReference(format!("mesh #{index}")).into());
                }
                return Ok(ResolvedParent {
                    mesh: Some(index),
                    offset,
                });
            }
            Some(AssetParent::TransformNode(index)) => {
                let node = graph.transform_nodes.get(index).ok_or_else(|| {
                    ImportError::InvalidReference(format!("transform node #{index}"))
                })?;

                if fuel == 0 {
                    return Err(SceneError::Cycle(node.id.clone()));
                }
                fuel -= 1;

                offset += node.translation;
                current = node.parent;
            }
        }
    }
}

/// Checks the whole graph before anything is allocated. Returns the
/// resolved parent of each mesh and the index of the root mesh.
fn validate(graph: &AssetGraph) -> Result<(Vec<ResolvedParent>, usize)> {
    for mesh in &graph.meshes {
        if let Some(geometry) = mesh.geometry {
            if geometry >= graph.geometries.len() {
                return Err(ImportError::InvalidReference(format!(
                    "geometry #{geometry} of {}",
                    mesh.id
                ))
                .into());
            }
        }
    }

    for geometry in &graph.geometries {
        let count = geometry.positions.len() as u32;
        if geometry.indices.iter().any(|&i| i >= count) {
            return Err(ImportError::InvalidReference(format!(
                "vertex index out of range in {}",
                geometry.id
            ))
            .into());
        }
    }

    for node in &graph.transform_nodes {
        resolve_parent(graph, node.parent)?;
    }

    let resolved = graph
        .meshes
        .iter()
        .map(|mesh| resolve_parent(graph, mesh.parent))
        .collect::<Result<Vec<_>>>()?;

    for (start, mesh) in graph.meshes.iter().enumerate() {
        let mut current = resolved[start].mesh;
        let mut fuel = graph.meshes.len();
        while let Some(index) = current {
            if index == start || fuel == 0 {
                return Err(SceneError::Cycle(mesh.id.clone()));
            }
            fuel -= 1;
            current = resolved[index].mesh;
        }
    }

    let roots: Vec<usize> = resolved
        .iter()
        .enumerate()
        .filter(|(_, parent)| parent.mesh.is_none())
        .map(|(index, _)| index)
        .collect();

    match roots.as_slice() {
        [root] => Ok((resolved, *root)),
        _ => Err(ImportError::AmbiguousRoot(roots.len()).into()),
    }
}

impl<B: RenderBackend> Scene<B> {
    /// Adds a loaded asset graph to the scene and returns its root primitive.
    pub fn adopt_asset(&mut self, graph: AssetGraph) -> Result<PrimitiveKey> {
        let (resolved, root_index) = validate(&graph)?;
        let owners = graph
            .transform_nodes
            .iter()
            .map(|node| resolve_parent(&graph, node.parent).map(|parent| parent.mesh))
            .collect::<Result<Vec<_>>>()?;

        let geometry_keys: Vec<_> = graph
            .geometries
            .into_iter()
            .map(|geometry| {
                self.geometries.insert(Geometry {
                    id: self.ids.next("geometry"),
                    positions: geometry.positions,
                    indices: geometry.indices,
                })
            })
            .collect();

        let keys: Vec<PrimitiveKey> = graph
            .meshes
            .iter()
            .zip(&resolved)
            .map(|(mesh, parent)| {
                let position = mesh.translation + parent.offset;
                let mut primitive =
                    Primitive::new(self.ids.next("mesh"), PrimitiveKind::Imported, position);

                if let Some(geometry) = mesh.geometry.map(|index| geometry_keys[index]) {
                    primitive.geometry = Some(geometry);
                    primitive.drawable =
                        Some(self.backend.create_mesh(&self.geometries[geometry], position));
                }

                self.primitives.insert(primitive)
            })
            .collect();

        for (index, parent) in resolved.iter().enumerate() {
            if let Some(parent_index) = parent.mesh {
                let (child, parent) = (keys[index], keys[parent_index]);
                self.primitives[child].parent = Some(parent);
                self.primitives[parent].children.push(child);
            }
        }

        let root = keys[root_index];
        for (node, owner) in graph.transform_nodes.iter().zip(owners) {
            self.transform_nodes.insert(TransformNode {
                id: self.ids.next("transform"),
                translation: node.translation,
                owner: owner.map_or(root, |index| keys[index]),
            });
        }

        log::info!(
            "Imported asset as {} ({} primitives, {} geometries, {} transform nodes)",
            self.primitives[root].id,
            keys.len(),
            geometry_keys.len(),
            graph.transform_nodes.len()
        );

        Ok(root)
    }

    /// Loads an asset through `source` and adopts it.
    pub async fn import_asset<S: AssetSource>(
        &mut self,
        source: &S,
        path: &str,
        filename: &str,
    ) -> Result<PrimitiveKey> {
        let graph = source.load(path, filename).await?;
        self.adopt_asset(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_pipeline::asset_graph::{AssetGeometry, AssetMesh, AssetTransformNode};
    use crate::rendering::headless::{HeadlessBackend, HeadlessShape};
    use crate::scene_graph::ids::IdGenerator;

    fn mesh(id: &str, parent: Option<AssetParent>, geometry: Option<usize>) -> AssetMesh {
        AssetMesh {
            id: id.into(),
            translation: Vec3::X,
            parent,
            geometry,
        }
    }

    fn triangle() -> AssetGeometry {
        AssetGeometry {
            id: "tri".into(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![0, 1, 2],
        }
    }

    fn sample() -> AssetGraph {
        AssetGraph {
            meshes: vec![
                mesh("root", None, None),
                mesh("body", Some(AssetParent::TransformNode(0)), Some(0)),
            ],
            transform_nodes: vec![AssetTransformNode {
                id: "pivot".into(),
                translation: Vec3::Y,
                parent: Some(AssetParent::Mesh(0)),
            }],
            geometries: vec![triangle()],
        }
    }

    fn scene() -> Scene<HeadlessBackend> {
        Scene::with_ids(HeadlessBackend::new(), IdGenerator::with_salt(3))
    }

    #[test]
    fn adopts_tree_with_fresh_ids() {
        let mut scene = scene();
        let root = scene.adopt_asset(sample()).unwrap();

        let root_primitive = scene.primitive(root).unwrap();
        assert_eq!(root_primitive.kind(), PrimitiveKind::Imported);
        assert_ne!(root_primitive.id(), "root");
        assert!(root_primitive.connectors().is_empty());
        assert_eq!(root_primitive.children().len(), 1);

        let body = root_primitive.children()[0];
        let body = scene.primitive(body).unwrap();
        assert_eq!(body.parent(), Some(root));
        assert_eq!(body.position(), Vec3::new(1.0, 1.0, 0.0));

        let geometry = scene.geometry(body.geometry().unwrap()).unwrap();
        assert_ne!(geometry.id, "tri");
        let drawable = scene.backend().drawable(body.drawable().unwrap()).unwrap();
        assert_eq!(
            drawable.shape,
            HeadlessShape::Mesh {
                geometry: geometry.id.clone(),
                triangles: 1
            }
        );

        let transform = scene.transform_nodes().next().unwrap();
        assert_ne!(transform.id, "pivot");
        assert_eq!(transform.owner, root);
    }

    #[test]
    fn rejects_multiple_roots() {
        let mut scene = scene();
        let mut graph = sample();
        graph.meshes.push(mesh("stray", None, None));

        assert!(matches!(
            scene.adopt_asset(graph),
            Err(SceneError::Import(ImportError::AmbiguousRoot(2)))
        ));
        assert_eq!(scene.primitive_count(), 0);
        assert_eq!(scene.backend().live_drawables(), 0);
    }

    #[test]
    fn rejects_missing_root() {
        let mut scene = scene();
        let graph = AssetGraph::default();
        assert!(matches!(
            scene.adopt_asset(graph),
            Err(SceneError::Import(ImportError::AmbiguousRoot(0)))
        ));
    }

    #[test]
    fn rejects_transform_loop() {
        let mut scene = scene();
        let mut graph = sample();
        graph.transform_nodes[0].parent = Some(AssetParent::TransformNode(0));

        assert!(matches!(scene.adopt_asset(graph), Err(SceneError::Cycle(_))));
        assert_eq!(scene.primitive_count(), 0);
    }

    #[test]
    fn rejects_mesh_loop_beside_valid_root() {
        let mut scene = scene();
        let mut graph = sample();
        graph.meshes.push(mesh("a", Some(AssetParent::Mesh(3)), None));
        graph.meshes.push(mesh("b", Some(AssetParent::Mesh(2)), None));

        assert!(matches!(scene.adopt_asset(graph), Err(SceneError::Cycle(_))));
    }

    #[test]
    fn rejects_dangling_references() {
        let mut scene = scene();
        let mut graph = sample();
        graph.meshes[1].geometry = Some(5);
        assert!(matches!(
            scene.adopt_asset(graph),
            Err(SceneError::Import(ImportError::InvalidReference(_)))
        ));

        let mut graph = sample();
        graph.geometries[0].indices = vec![0, 1, 9];
        assert!(matches!(
            scene.adopt_asset(graph),
            Err(SceneError::Import(ImportError::InvalidReference(_)))
        ));
    }

    #[test]
    fn imported_root_behaves_like_native_primitive() {
        let mut scene = scene();
        let root = scene.adopt_asset(sample()).unwrap();
        let other = scene
            .create_primitive(
                PrimitiveKind::Box,
                &crate::scene_graph::primitive::ShapeParams::default(),
            )
            .unwrap();

        let c = scene.add_connector(root, other).unwrap();
        scene.move_to(root, Vec3::new(2.0, 0.0, 0.0)).unwrap();

        assert_eq!(scene.connector(c).unwrap().start(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(scene.root(root).unwrap(), root);

        scene.remove_primitive(root).unwrap();
        assert_eq!(scene.primitive_count(), 1);
        assert_eq!(scene.connector(c).unwrap().from(), None);
    }

    #[test]
    fn removing_imported_tree_frees_its_records() {
        let mut scene = scene();

        for _ in 0..3 {
            let root = scene.adopt_asset(sample()).unwrap();
            let body = scene.primitive(root).unwrap().children()[0];
            let geometry = scene.primitive(body).unwrap().geometry().unwrap();

            scene.remove_primitive(root).unwrap();

            assert!(scene.geometry(geometry).is_none());
            assert_eq!(scene.geometry_count(), 0);
            assert_eq!(scene.transform_nodes().count(), 0);
            assert_eq!(scene.primitive_count(), 0);
        }
    }

    #[test]
    fn shared_geometry_outlives_one_user() {
        let mut scene = scene();
        let mut graph = sample();
        graph.meshes.push(mesh("twin", Some(AssetParent::Mesh(0)), Some(0)));
        let root = scene.adopt_asset(graph).unwrap();

        let children = scene.primitive(root).unwrap().children().to_vec();
        assert_eq!(children.len(), 2);
        let geometry = scene.primitive(children[0]).unwrap().geometry().unwrap();

        scene.remove_primitive(children[0]).unwrap();
        assert!(scene.geometry(geometry).is_some());

        scene.remove_primitive(children[1]).unwrap();
        assert!(scene.geometry(geometry).is_none());
    }

    #[test]
    fn transform_nodes_above_every_mesh_belong_to_root() {
        let mut scene = scene();
        let mut graph = sample();
        graph.transform_nodes.push(AssetTransformNode {
            id: "top".into(),
            translation: Vec3::Z,
            parent: None,
        });
        graph.meshes[0].parent = Some(AssetParent::TransformNode(1));
        let root = scene.adopt_asset(graph).unwrap();

        assert_eq!(scene.primitive(root).unwrap().position(), Vec3::new(1.0, 0.0, 1.0));
        assert!(scene.transform_nodes().all(|node| node.owner == root));

        scene.remove_primitive(root).unwrap();
        assert_eq!(scene.transform_nodes().count(), 0);
    }
}
