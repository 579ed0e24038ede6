use glam::Vec3;
use slotmap::new_key_type;

use crate::scene_graph::primitive::PrimitiveKey;

new_key_type! {
    pub struct GeometryKey;
    pub struct TransformNodeKey;
}

/// Triangle geometry adopted from an imported asset.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub id: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unique edges of every triangle, as pairs of positions.
    pub fn edges(&self) -> Vec<(Vec3, Vec3)> {
        let mut seen = std::collections::HashSet::new();
        let mut edges = Vec::new();

        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = (a.min(b), a.max(b));
                if !seen.insert(key) {
                    continue;
                }

                if let (Some(pa), Some(pb)) = (
                    self.positions.get(a as usize),
                    self.positions.get(b as usize),
                ) {
                    edges.push((*pa, *pb));
                }
            }
        }

        edges
    }
}

/// Grouping node from an imported asset. Transform nodes have no drawable
/// and live exactly as long as their owner.
#[derive(Debug, Clone)]
pub struct TransformNode {
    pub id: String,
    pub translation: Vec3,
    /// Nearest primitive above this node, or the imported root when the node
    /// sits above every mesh.
    pub owner: PrimitiveKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edges_are_emitted_once() {
        let quad = Geometry {
            id: "quad".into(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            indices: vec![0, 1, 2, 0, 2, 3],
        };

        assert_eq!(quad.triangle_count(), 2);
        assert_eq!(quad.edges().len(), 5);
    }
}
