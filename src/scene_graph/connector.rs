use glam::Vec3;

use crate::rendering::backend::DrawableId;
use crate::scene_graph::primitive::PrimitiveKey;

slotmap::new_key_type! {
    pub struct ConnectorKey;
}

/// Which end of a connector a binding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    From,
    To,
}

impl Endpoint {
    pub fn other(self) -> Endpoint {
        match self {
            Endpoint::From => Endpoint::To,
            Endpoint::To => Endpoint::From,
        }
    }
}

/// A drawn segment whose ends optionally track primitives.
#[derive(Debug)]
pub struct Connector {
    pub(crate) id: String,
    pub(crate) points: Vec<Vec3>,
    pub(crate) from: Option<PrimitiveKey>,
    pub(crate) to: Option<PrimitiveKey>,
    pub(crate) drawable: DrawableId,
}

impl Connector {
    pub(crate) fn new(id: String, start: Vec3, end: Vec3, drawable: DrawableId) -> Self {
        Self {
            id,
            points: vec![start, end],
            from: None,
            to: None,
            drawable,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn start(&self) -> Vec3 {
        self.points[0]
    }

    pub fn end(&self) -> Vec3 {
        self.points[self.points.len() - 1]
    }

    pub fn from(&self) -> Option<PrimitiveKey> {
        self.from
    }

    pub fn to(&self) -> Option<PrimitiveKey> {
        self.to
    }

    pub fn drawable(&self) -> DrawableId {
        self.drawable
    }

    pub fn binding(&self, endpoint: Endpoint) -> Option<PrimitiveKey> {
        match endpoint {
            Endpoint::From => self.from,
            Endpoint::To => self.to,
        }
    }

    pub fn is_bound_to(&self, primitive: PrimitiveKey) -> bool {
        self.from == Some(primitive) || self.to == Some(primitive)
    }

    pub(crate) fn set_binding(&mut self, endpoint: Endpoint, primitive: Option<PrimitiveKey>) {
        match endpoint {
            Endpoint::From => self.from = primitive,
            Endpoint::To => self.to = primitive,
        }
    }

    pub(crate) fn set_point(&mut self, endpoint: Endpoint, position: Vec3) {
        let index = match endpoint {
            Endpoint::From => 0,
            Endpoint::To => self.points.len() - 1,
        };
        self.points[index] = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_point_targets_first_and_last() {
        let mut c = Connector::new("c".into(), Vec3::ZERO, Vec3::ONE, DrawableId::new(0));
        c.set_point(Endpoint::To, Vec3::X);
        c.set_point(Endpoint::From, Vec3::Y);
        assert_eq!(c.points(), &[Vec3::Y, Vec3::X]);
    }

    #[test]
    fn binding_roles_are_independent() {
        let mut keys = slotmap::SlotMap::<PrimitiveKey, ()>::with_key();
        let p = keys.insert(());
        let mut c = Connector::new("c".into(), Vec3::ZERO, Vec3::ONE, DrawableId::new(0));
        c.set_binding(Endpoint::To, Some(p));
        assert_eq!(c.binding(Endpoint::From), None);
        assert_eq!(c.binding(Endpoint::To), Some(p));
        assert!(c.is_bound_to(p));
        assert_eq!(Endpoint::To.other(), Endpoint::From);
    }
}
