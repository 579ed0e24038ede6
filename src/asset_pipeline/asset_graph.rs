use std::future::Future;

use glam::Vec3;

use crate::error::ImportError;

/// Parent link inside an `AssetGraph`, by index into the owning list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetParent {
    Mesh(usize),
    TransformNode(usize),
}

#[derive(Debug, Clone)]
pub struct AssetMesh {
    pub id: String,
    pub translation: Vec3,
    pub parent: Option<AssetParent>,
    pub geometry: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AssetTransformNode {
    pub id: String,
    pub translation: Vec3,
    pub parent: Option<AssetParent>,
}

#[derive(Debug, Clone)]
pub struct AssetGeometry {
    pub id: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// Everything a loader produced for one asset file. Ids are whatever the
/// file contained and are replaced on adoption.
#[derive(Debug, Clone, Default)]
pub struct AssetGraph {
    pub meshes: Vec<AssetMesh>,
    pub transform_nodes: Vec<AssetTransformNode>,
    pub geometries: Vec<AssetGeometry>,
}

/// Loads asset files into an `AssetGraph`.
pub trait AssetSource {
    fn load(
        &self,
        path: &str,
        filename: &str,
    ) -> impl Future<Output = Result<AssetGraph, ImportError>>;
}
