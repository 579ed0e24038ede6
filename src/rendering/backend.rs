use glam::Vec3;

use crate::error::FrameError;
use crate::scene_graph::geometry::Geometry;
use crate::scene_graph::primitive::Shape;

/// Handle to a drawable owned by a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(u64);

impl DrawableId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// The narrow interface the scene uses to reach the render engine.
///
/// Drawables are never edited in place: a connector whose geometry changes
/// gets a new polyline and the old one is disposed.
pub trait RenderBackend {
    fn create_shape(&mut self, shape: &Shape, position: Vec3) -> DrawableId;

    fn create_polyline(&mut self, points: &[Vec3]) -> DrawableId;

    fn create_mesh(&mut self, geometry: &Geometry, position: Vec3) -> DrawableId;

    /// Moves an existing drawable. Primitives are placed, connectors are
    /// recreated.
    fn place(&mut self, drawable: DrawableId, position: Vec3);

    fn remove_from_scene(&mut self, drawable: DrawableId);

    fn dispose_drawable(&mut self, drawable: DrawableId);

    fn resize(&mut self, width: u32, height: u32);

    fn render_frame(&mut self) -> Result<(), FrameError>;

    /// Detaches and frees a drawable in one go.
    fn release(&mut self, drawable: DrawableId) {
        self.remove_from_scene(drawable);
        self.dispose_drawable(drawable);
    }
}
