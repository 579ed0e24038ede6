//! Viewport session: owns the scene (and through it the render backend) for
//! as long as the surface lives.

use std::rc::Weak;
use std::time::Instant;

use crate::asset_pipeline::asset_graph::{AssetGraph, AssetSource};
use crate::error::{FrameError, Result, SceneError};
use crate::rendering::backend::RenderBackend;
use crate::rendering::config::ViewportConfig;
use crate::scene_graph::primitive::PrimitiveKey;
use crate::scene_graph::scene::Scene;

/// Taken before an asset load starts. Completing an import with a ticket
/// whose scene has since been torn down does nothing.
#[derive(Debug, Clone)]
pub struct ImportTicket {
    scene: Weak<()>,
}

impl ImportTicket {
    pub fn is_live(&self) -> bool {
        self.scene.strong_count() > 0
    }
}

pub struct ViewportSession<B: RenderBackend> {
    scene: Option<Scene<B>>,
    config: ViewportConfig,
    start_time: Instant,
    frames: u64,
}

impl<B: RenderBackend> ViewportSession<B> {
    pub fn new(backend: B, config: ViewportConfig) -> Self {
        Self::with_scene(Scene::new(backend), config)
    }

    pub fn with_scene(scene: Scene<B>, config: ViewportConfig) -> Self {
        Self {
            scene: Some(scene),
            config,
            start_time: Instant::now(),
            frames: 0,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_open(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene(&self) -> Result<&Scene<B>> {
        self.scene.as_ref().ok_or(SceneError::SessionClosed)
    }

    pub fn scene_mut(&mut self) -> Result<&mut Scene<B>> {
        self.scene.as_mut().ok_or(SceneError::SessionClosed)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(scene) = self.scene.as_mut() {
            log::debug!("Resizing viewport to {}x{}", width, height);
            scene.backend_mut().resize(width, height);
        }
    }

    /// Runs one frame: the caller's update, then a render.
    pub fn tick<F>(&mut self, update: F) -> std::result::Result<(), FrameError>
    where
        F: FnOnce(&mut Scene<B>, f32),
    {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };

        update(scene, self.start_time.elapsed().as_secs_f32());
        self.frames += 1;
        scene.backend_mut().render_frame()
    }

    pub fn import_ticket(&self) -> Result<ImportTicket> {
        Ok(ImportTicket {
            scene: self.scene()?.liveness(),
        })
    }

    /// Adopts a loaded graph if the ticket still refers to this session's
    /// scene. Returns `Ok(None)` when the session was torn down meanwhile.
    pub fn complete_import(
        &mut self,
        ticket: ImportTicket,
        graph: AssetGraph,
    ) -> Result<Option<PrimitiveKey>> {
        let Some(scene) = self.scene.as_mut() else {
            log::warn!("Dropping asset import: session was torn down");
            return Ok(None);
        };

        if !ticket.scene.ptr_eq(&scene.liveness()) {
            log::warn!("Dropping asset import: ticket belongs to a previous scene");
            return Ok(None);
        }

        scene.adopt_asset(graph).map(Some)
    }

    pub async fn import_asset<S: AssetSource>(
        &mut self,
        source: &S,
        path: &str,
        filename: &str,
    ) -> Result<Option<PrimitiveKey>> {
        let ticket = self.import_ticket()?;
        let graph = source.load(path, filename).await?;
        self.complete_import(ticket, graph)
    }

    /// Releases every drawable and closes the session.
    pub fn teardown(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            log::info!(
                "Tearing down viewport ({} primitives, {} connectors, {} frames)",
                scene.primitive_count(),
                scene.connector_count(),
                self.frames
            );
            scene.clear();
        }
    }

    /// Replaces a torn-down (or live) scene with a fresh one over `backend`.
    pub fn reopen(&mut self, backend: B) {
        self.teardown();
        self.scene = Some(Scene::new(backend));
        self.start_time = Instant::now();
        self.frames = 0;
    }
}

impl<B: RenderBackend> Drop for ViewportSession<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::asset_pipeline::asset_graph::AssetMesh;
    use crate::rendering::headless::HeadlessBackend;
    use crate::scene_graph::primitive::{PrimitiveKind, ShapeParams};

    fn single_mesh() -> AssetGraph {
        AssetGraph {
            meshes: vec![AssetMesh {
                id: "__root__".into(),
                translation: Vec3::ZERO,
                parent: None,
                geometry: None,
            }],
            ..Default::default()
        }
    }

    fn session() -> ViewportSession<HeadlessBackend> {
        ViewportSession::new(HeadlessBackend::new(), ViewportConfig::default())
    }

    #[test]
    fn tick_runs_update_then_renders() {
        let mut session = session();
        let mut seen = None;

        session
            .tick(|scene, _| {
                seen = Some(scene.primitive_count());
                scene
                    .create_primitive(PrimitiveKind::Box, &ShapeParams::default())
                    .unwrap();
            })
            .unwrap();

        assert_eq!(seen, Some(0));
        assert_eq!(session.frames(), 1);
        assert_eq!(session.scene().unwrap().backend().frames, 1);
    }

    #[test]
    fn resize_ignores_zero_sizes() {
        let mut session = session();
        session.resize(640, 480);
        session.resize(0, 480);
        assert_eq!(session.scene().unwrap().backend().size, (640, 480));
    }

    #[test]
    fn teardown_closes_scene() {
        let mut session = session();
        session
            .scene_mut()
            .unwrap()
            .create_primitive(PrimitiveKind::Sphere, &ShapeParams::default())
            .unwrap();

        session.teardown();

        assert!(!session.is_open());
        assert!(matches!(session.scene(), Err(SceneError::SessionClosed)));
        assert!(session.tick(|_, _| unreachable!()).is_ok());
    }

    #[test]
    fn import_after_teardown_is_noop() {
        let mut session = session();
        let ticket = session.import_ticket().unwrap();
        session.teardown();

        assert!(!ticket.is_live());
        assert_eq!(session.complete_import(ticket, single_mesh()).unwrap(), None);
    }

    #[test]
    fn stale_ticket_does_not_touch_reopened_scene() {
        let mut session = session();
        let ticket = session.import_ticket().unwrap();
        session.reopen(HeadlessBackend::new());

        assert_eq!(session.complete_import(ticket, single_mesh()).unwrap(), None);
        assert_eq!(session.scene().unwrap().primitive_count(), 0);
    }

    #[test]
    fn live_ticket_adopts_graph() {
        let mut session = session();
        let ticket = session.import_ticket().unwrap();
        let root = session
            .complete_import(ticket, single_mesh())
            .unwrap()
            .unwrap();

        let scene = session.scene().unwrap();
        assert_eq!(scene.primitive(root).unwrap().kind(), PrimitiveKind::Imported);
    }
}
