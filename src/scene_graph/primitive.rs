use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::error::SceneError;
use crate::rendering::backend::DrawableId;
use crate::scene_graph::connector::ConnectorKey;
use crate::scene_graph::geometry::GeometryKey;

slotmap::new_key_type! {
    pub struct PrimitiveKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Box,
    Sphere,
    Imported,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Box => "box",
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Imported => "imported",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "box" => Ok(PrimitiveKind::Box),
            "sphere" => Ok(PrimitiveKind::Sphere),
            "imported" => Ok(PrimitiveKind::Imported),
            other => Err(SceneError::UnsupportedKind(other.to_string())),
        }
    }
}

/// Creation options for the built-in shapes. Fields that do not apply to the
/// requested kind are ignored.
#[derive(Debug, Clone)]
pub struct ShapeParams {
    pub size: f32,
    pub diameter: f32,
    pub segments: u32,
    pub position: Vec3,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            size: 1.0,
            diameter: 1.0,
            segments: 16,
            position: Vec3::ZERO,
        }
    }
}

impl ShapeParams {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// A resolved shape description, as handed to the render backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Box { size: f32 },
    Sphere { diameter: f32, segments: u32 },
}

impl Shape {
    /// Only boxes and spheres can be built directly; imported primitives come
    /// from an asset.
    pub fn resolve(kind: PrimitiveKind, params: &ShapeParams) -> Result<Shape, SceneError> {
        match kind {
            PrimitiveKind::Box => Ok(Shape::Box { size: params.size }),
            PrimitiveKind::Sphere => Ok(Shape::Sphere {
                diameter: params.diameter,
                segments: params.segments.max(3),
            }),
            PrimitiveKind::Imported => Err(SceneError::UnsupportedKind(kind.to_string())),
        }
    }
}

/// Target for `Scene::move_to`. Missing components keep the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionUpdate {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl PositionUpdate {
    pub fn x(x: f32) -> Self {
        Self {
            x: Some(x),
            ..Default::default()
        }
    }

    pub fn y(y: f32) -> Self {
        Self {
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn z(z: f32) -> Self {
        Self {
            z: Some(z),
            ..Default::default()
        }
    }

    pub fn resolve(&self, current: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.z.unwrap_or(current.z),
        )
    }
}

impl From<Vec3> for PositionUpdate {
    fn from(v: Vec3) -> Self {
        Self {
            x: Some(v.x),
            y: Some(v.y),
            z: Some(v.z),
        }
    }
}

/// A placed object in the scene. Only `Scene` mutates these; callers read
/// them through the accessors.
#[derive(Debug)]
pub struct Primitive {
    pub(crate) id: String,
    pub(crate) kind: PrimitiveKind,
    pub(crate) position: Vec3,
    pub(crate) parent: Option<PrimitiveKey>,
    pub(crate) children: Vec<PrimitiveKey>,
    pub(crate) connectors: Vec<ConnectorKey>,
    pub(crate) drawable: Option<DrawableId>,
    pub(crate) geometry: Option<GeometryKey>,
}

impl Primitive {
    pub(crate) fn new(id: String, kind: PrimitiveKind, position: Vec3) -> Self {
        Self {
            id,
            kind,
            position,
            parent: None,
            children: Vec::new(),
            connectors: Vec::new(),
            drawable: None,
            geometry: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn parent(&self) -> Option<PrimitiveKey> {
        self.parent
    }

    pub fn children(&self) -> &[PrimitiveKey] {
        &self.children
    }

    pub fn connectors(&self) -> &[ConnectorKey] {
        &self.connectors
    }

    pub fn has_connector(&self, connector: ConnectorKey) -> bool {
        self.connectors.contains(&connector)
    }

    pub fn drawable(&self) -> Option<DrawableId> {
        self.drawable
    }

    pub fn geometry(&self) -> Option<GeometryKey> {
        self.geometry
    }

    pub(crate) fn attach(&mut self, connector: ConnectorKey) {
        if !self.connectors.contains(&connector) {
            self.connectors.push(connector);
        }
    }

    pub(crate) fn detach(&mut self, connector: ConnectorKey) {
        self.connectors.retain(|&c| c != connector);
    }
}
