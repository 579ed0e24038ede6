pub mod asset_graph;
pub mod gltf_source;

pub use asset_graph::{
    AssetGeometry, AssetGraph, AssetMesh, AssetParent, AssetSource, AssetTransformNode,
};
pub use gltf_source::GltfAssetSource;
