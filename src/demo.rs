use std::path::Path;

use anyhow::Context;
use glam::Vec3;

use crate::asset_pipeline::gltf_source::GltfAssetSource;
use crate::error::Result;
use crate::rendering::backend::RenderBackend;
use crate::scene_graph::connector::Endpoint;
use crate::scene_graph::primitive::{PrimitiveKey, PrimitiveKind, ShapeParams};
use crate::scene_graph::scene::Scene;
use crate::session::ViewportSession;

/// Environment variable naming an optional glTF file to show in the demo.
pub const ASSET_ENV: &str = "MESHLINK_ASSET";

pub struct DemoScene {
    hub: PrimitiveKey,
    orbiter: PrimitiveKey,
}

impl DemoScene {
    pub fn populate<B: RenderBackend>(scene: &mut Scene<B>) -> Result<Self> {
        let hub = scene.create_primitive(
            PrimitiveKind::Sphere,
            &ShapeParams {
                diameter: 1.5,
                ..ShapeParams::default()
            },
        )?;
        let orbiter =
            scene.create_primitive(PrimitiveKind::Box, &ShapeParams::at(Vec3::new(3.0, 0.0, 0.0)))?;
        let anchor = scene.create_primitive(
            PrimitiveKind::Box,
            &ShapeParams {
                size: 0.5,
                ..ShapeParams::at(Vec3::new(-3.0, 1.0, 2.0))
            },
        )?;

        scene.add_connector(hub, orbiter)?;
        scene.add_connector(orbiter, anchor)?;
        scene.add_connector(anchor, anchor)?;

        // One end pinned in space, the other following the hub.
        let tether = scene.create_connector(Vec3::new(0.0, -2.0, 0.0), Vec3::ZERO);
        scene.connect(hub, tether, Endpoint::To)?;

        Ok(Self { hub, orbiter })
    }

    pub fn update<B: RenderBackend>(&self, scene: &mut Scene<B>, time: f32) -> Result<()> {
        let angle = time * 0.5;
        let target = Vec3::new(
            3.0 * angle.cos(),
            (time * 2.0).sin() * 0.5,
            3.0 * angle.sin(),
        );
        scene.move_to(self.orbiter, target)
    }

    /// Imports `asset` and ties its root to the hub.
    pub fn attach_asset<B: RenderBackend>(
        &self,
        session: &mut ViewportSession<B>,
        asset: &str,
    ) -> anyhow::Result<()> {
        let path = Path::new(asset);
        let directory = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .context("Asset path has no file name")?;

        let imported =
            pollster::block_on(session.import_asset(&GltfAssetSource, &directory, &filename))
                .with_context(|| format!("Failed to import {asset}"))?;

        if let Some(root) = imported {
            let scene = session.scene_mut()?;
            let current = scene.primitive(root).map_or(Vec3::ZERO, |p| p.position());
            move_subtree_by(scene, root, Vec3::new(0.0, 2.5, 0.0) - current)?;
            scene.add_connector(self.hub, root)?;
        }

        Ok(())
    }
}

/// Child positions do not follow their parent, so an imported model is
/// shifted node by node.
fn move_subtree_by<B: RenderBackend>(
    scene: &mut Scene<B>,
    root: PrimitiveKey,
    delta: Vec3,
) -> Result<()> {
    let mut stack = vec![root];
    while let Some(key) = stack.pop() {
        scene.move_by(key, delta)?;
        if let Some(primitive) = scene.primitive(key) {
            stack.extend_from_slice(primitive.children());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::headless::HeadlessBackend;

    #[test]
    fn demo_scene_is_consistent_while_animating() {
        let mut scene = Scene::new(HeadlessBackend::new());
        let demo = DemoScene::populate(&mut scene).unwrap();

        for frame in 0..10 {
            demo.update(&mut scene, frame as f32 * 0.1).unwrap();
        }

        let orbiter = scene.primitive(demo.orbiter).unwrap();
        assert_eq!(orbiter.connectors().len(), 2);
        for &c in orbiter.connectors() {
            let connector = scene.connector(c).unwrap();
            if connector.from() == Some(demo.orbiter) {
                assert_eq!(connector.start(), orbiter.position());
            } else {
                assert_eq!(connector.end(), orbiter.position());
            }
        }
        assert_eq!(scene.connector_count(), 4);
    }

    #[test]
    fn subtree_moves_together() {
        let mut scene = Scene::new(HeadlessBackend::new());
        let parent = scene
            .create_primitive(PrimitiveKind::Box, &ShapeParams::default())
            .unwrap();
        let child = scene
            .create_primitive(PrimitiveKind::Sphere, &ShapeParams::at(Vec3::X))
            .unwrap();
        scene.set_parent(child, Some(parent)).unwrap();

        move_subtree_by(&mut scene, parent, Vec3::Y).unwrap();

        assert_eq!(scene.primitive(parent).unwrap().position(), Vec3::Y);
        assert_eq!(scene.primitive(child).unwrap().position(), Vec3::new(1.0, 1.0, 0.0));
    }
}
