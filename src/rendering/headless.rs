//! In-memory render backend.
//!
//! Keeps every drawable as plain data and counts what the scene asked for,
//! which makes it usable for offscreen sessions and for tests.

use std::collections::HashMap;

use glam::Vec3;

use crate::error::FrameError;
use crate::rendering::backend::{DrawableId, RenderBackend};
use crate::scene_graph::geometry::Geometry;
use crate::scene_graph::primitive::Shape;

#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessShape {
    Shape(Shape),
    Polyline(Vec<Vec3>),
    Mesh { geometry: String, triangles: usize },
}

#[derive(Debug, Clone)]
pub struct HeadlessDrawable {
    pub shape: HeadlessShape,
    pub position: Vec3,
    pub in_scene: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    drawables: HashMap<DrawableId, HeadlessDrawable>,
    next_id: u64,
    pub polylines_created: usize,
    pub disposed: usize,
    pub frames: u64,
    pub size: (u32, u32),
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drawable(&self, id: DrawableId) -> Option<&HeadlessDrawable> {
        self.drawables.get(&id)
    }

    pub fn live_drawables(&self) -> usize {
        self.drawables.len()
    }

    fn insert(&mut self, shape: HeadlessShape, position: Vec3) -> DrawableId {
        let id = DrawableId::new(self.next_id);
        self.next_id += 1;
        self.drawables.insert(
            id,
            HeadlessDrawable {
                shape,
                position,
                in_scene: true,
            },
        );
        id
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_shape(&mut self, shape: &Shape, position: Vec3) -> DrawableId {
        self.insert(HeadlessShape::Shape(*shape), position)
    }

    fn create_polyline(&mut self, points: &[Vec3]) -> DrawableId {
        self.polylines_created += 1;
        self.insert(HeadlessShape::Polyline(points.to_vec()), Vec3::ZERO)
    }

    fn create_mesh(&mut self, geometry: &Geometry, position: Vec3) -> DrawableId {
        self.insert(
            HeadlessShape::Mesh {
                geometry: geometry.id.clone(),
                triangles: geometry.triangle_count(),
            },
            position,
        )
    }

    fn place(&mut self, drawable: DrawableId, position: Vec3) {
        if let Some(d) = self.drawables.get_mut(&drawable) {
            d.position = position;
        }
    }

    fn remove_from_scene(&mut self, drawable: DrawableId) {
        if let Some(d) = self.drawables.get_mut(&drawable) {
            d.in_scene = false;
        }
    }

    fn dispose_drawable(&mut self, drawable: DrawableId) {
        if self.drawables.remove(&drawable).is_some() {
            self.disposed += 1;
        } else {
            log::warn!("Dispose of unknown drawable {:?}", drawable);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render_frame(&mut self) -> Result<(), FrameError> {
        self.frames += 1;
        Ok(())
    }
}
