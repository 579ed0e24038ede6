use std::collections::HashSet;

use glam::Vec3;
use meshlink::asset_pipeline::gltf_source::ROOT_NODE_NAME;
use meshlink::asset_pipeline::GltfAssetSource;
use meshlink::rendering::config::ViewportConfig;
use meshlink::rendering::headless::HeadlessBackend;
use meshlink::{ImportError, PrimitiveKey, PrimitiveKind, Scene, SceneError, ViewportSession};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn subtree_ids(scene: &Scene<HeadlessBackend>, root: PrimitiveKey) -> HashSet<String> {
    let mut ids = HashSet::new();
    let mut stack = vec![root];
    while let Some(key) = stack.pop() {
        let primitive = scene.primitive(key).unwrap();
        ids.insert(primitive.id().to_string());
        if let Some(geometry) = primitive.geometry() {
            ids.insert(scene.geometry(geometry).unwrap().id.clone());
        }
        stack.extend_from_slice(primitive.children());
    }
    ids
}

#[test]
fn imports_fixture_under_single_root() {
    let mut scene = Scene::new(HeadlessBackend::new());
    let root = pollster::block_on(scene.import_asset(&GltfAssetSource, FIXTURES, "triangle.gltf"))
        .unwrap();

    let primitive = scene.primitive(root).unwrap();
    assert_eq!(primitive.kind(), PrimitiveKind::Imported);
    assert_eq!(primitive.parent(), None);
    assert_ne!(primitive.id(), ROOT_NODE_NAME);
    assert!(primitive.connectors().is_empty());
    assert_eq!(primitive.children().len(), 1);

    let body = scene.primitive(primitive.children()[0]).unwrap();
    assert_eq!(body.position(), Vec3::new(2.0, 1.0, 0.0));
    assert_eq!(scene.geometry(body.geometry().unwrap()).unwrap().triangle_count(), 1);
    assert_eq!(scene.root(primitive.children()[0]).unwrap(), root);

    assert_eq!(scene.transform_nodes().count(), 2);
    assert!(scene.transform_nodes().all(|node| node.owner == root));
}

#[test]
fn importing_twice_yields_disjoint_ids() {
    let mut scene = Scene::new(HeadlessBackend::new());
    let first = pollster::block_on(scene.import_asset(&GltfAssetSource, FIXTURES, "triangle.gltf"))
        .unwrap();
    let second =
        pollster::block_on(scene.import_asset(&GltfAssetSource, FIXTURES, "triangle.gltf"))
            .unwrap();

    let a = subtree_ids(&scene, first);
    let b = subtree_ids(&scene, second);
    assert_eq!(a.len(), 3);
    assert!(a.is_disjoint(&b));

    let transform_ids: HashSet<_> = scene.transform_nodes().map(|n| n.id.clone()).collect();
    assert_eq!(transform_ids.len(), 4);
    assert!(transform_ids.is_disjoint(&a) && transform_ids.is_disjoint(&b));
}

#[test]
fn removing_imported_root_frees_geometry_and_transforms() {
    let mut scene = Scene::new(HeadlessBackend::new());
    let root = pollster::block_on(scene.import_asset(&GltfAssetSource, FIXTURES, "triangle.gltf"))
        .unwrap();
    assert_eq!(scene.geometry_count(), 1);

    scene.remove_primitive(root).unwrap();

    assert_eq!(scene.primitive_count(), 0);
    assert_eq!(scene.geometry_count(), 0);
    assert_eq!(scene.transform_nodes().count(), 0);
    assert_eq!(scene.backend().live_drawables(), 0);
}

#[test]
fn missing_file_is_an_import_error() {
    let mut scene = Scene::new(HeadlessBackend::new());
    let result = pollster::block_on(scene.import_asset(&GltfAssetSource, FIXTURES, "missing.gltf"));

    assert!(matches!(
        result,
        Err(SceneError::Import(ImportError::Load { .. }))
    ));
    assert_eq!(scene.primitive_count(), 0);
}

#[test]
fn session_import_connects_like_native_primitive() {
    let mut session = ViewportSession::new(HeadlessBackend::new(), ViewportConfig::default());
    let root = pollster::block_on(session.import_asset(&GltfAssetSource, FIXTURES, "triangle.gltf"))
        .unwrap()
        .unwrap();

    let scene = session.scene_mut().unwrap();
    let anchor = scene
        .create_primitive(PrimitiveKind::Box, &Default::default())
        .unwrap();
    let c = scene.add_connector(anchor, root).unwrap();
    scene.move_by(root, Vec3::Y).unwrap();

    assert_eq!(scene.connector(c).unwrap().end(), Vec3::Y);
    assert_eq!(scene.primitive(root).unwrap().connectors(), &[c]);
}
