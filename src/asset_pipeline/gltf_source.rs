use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::asset_pipeline::asset_graph::{
    AssetGeometry, AssetGraph, AssetMesh, AssetParent, AssetSource, AssetTransformNode,
};
use crate::error::ImportError;

/// Name of the synthetic mesh that parents every top-level node of a file.
pub const ROOT_NODE_NAME: &str = "__root__";

/// Reads `.gltf` / `.glb` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfAssetSource;

impl AssetSource for GltfAssetSource {
    fn load(
        &self,
        path: &str,
        filename: &str,
    ) -> impl Future<Output = Result<AssetGraph, ImportError>> {
        let full_path: PathBuf = Path::new(path).join(filename);
        async move { load_gltf(&full_path) }
    }
}

pub fn load_gltf(path: &Path) -> Result<AssetGraph, ImportError> {
    let failed = |reason: String| ImportError::Load {
        path: path.display().to_string(),
        reason,
    };

    let (document, buffers, _images) = gltf::import(path).map_err(|e| failed(e.to_string()))?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| failed("No scenes in gltf".to_string()))?;

    let mut builder = GraphBuilder {
        graph: AssetGraph::default(),
        buffers: &buffers,
        gltf_mesh_to_geometry: HashMap::new(),
    };

    builder.graph.meshes.push(AssetMesh {
        id: ROOT_NODE_NAME.to_string(),
        translation: Vec3::ZERO,
        parent: None,
        geometry: None,
    });

    for node in scene.nodes() {
        builder
            .spawn_node(&node, AssetParent::Mesh(0))
            .map_err(failed)?;
    }

    log::info!(
        "Loaded {} ({} meshes, {} transform nodes, {} geometries)",
        path.display(),
        builder.graph.meshes.len(),
        builder.graph.transform_nodes.len(),
        builder.graph.geometries.len()
    );

    Ok(builder.graph)
}

struct GraphBuilder<'a> {
    graph: AssetGraph,
    buffers: &'a [gltf::buffer::Data],
    gltf_mesh_to_geometry: HashMap<usize, usize>,
}

impl GraphBuilder<'_> {
    fn spawn_node(&mut self, node: &gltf::Node, parent: AssetParent) -> Result<(), String> {
        let name = node
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("node{}", node.index()));
        let (translation, _rotation, _scale) = node.transform().decomposed();
        let translation = Vec3::from(translation);

        let this = match node.mesh() {
            Some(mesh) => {
                let geometry = self.geometry_for(&mesh, &name)?;
                self.graph.meshes.push(AssetMesh {
                    id: name,
                    translation,
                    parent: Some(parent),
                    geometry: Some(geometry),
                });
                AssetParent::Mesh(self.graph.meshes.len() - 1)
            }
            None => {
                self.graph.transform_nodes.push(AssetTransformNode {
                    id: name,
                    translation,
                    parent: Some(parent),
                });
                AssetParent::TransformNode(self.graph.transform_nodes.len() - 1)
            }
        };

        for child in node.children() {
            self.spawn_node(&child, this)?;
        }

        Ok(())
    }

    fn geometry_for(&mut self, mesh: &gltf::Mesh, node_name: &str) -> Result<usize, String> {
        if let Some(&index) = self.gltf_mesh_to_geometry.get(&mesh.index()) {
            return Ok(index);
        }

        let buffers = self.buffers;
        let mut positions = Vec::new();
        let mut indices = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(format!(
                    "Unsupported primitive mode: {:?}",
                    primitive.mode()
                ));
            }

            let reader = primitive
                .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

            let base = positions.len() as u32;
            let read: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| format!("Primitive without positions in {node_name}"))?
                .map(Vec3::from)
                .collect();

            match reader.read_indices() {
                Some(read_indices) => indices.extend(read_indices.into_u32().map(|i| base + i)),
                None => indices.extend(base..base + read.len() as u32),
            }

            positions.extend(read);
        }

        let id = mesh
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("{} (Mesh)", node_name));

        self.graph.geometries.push(AssetGeometry {
            id,
            positions,
            indices,
        });

        let index = self.graph.geometries.len() - 1;
        self.gltf_mesh_to_geometry.insert(mesh.index(), index);
        Ok(index)
    }
}
