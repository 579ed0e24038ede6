use glam::Vec3;
use itertools::Itertools;

use crate::scene_graph::primitive::Shape;

pub type Segment = (Vec3, Vec3);

/// Edges of a shape centred on the origin.
pub fn shape_segments(shape: &Shape) -> Vec<Segment> {
    match *shape {
        Shape::Box { size } => box_segments(size * 0.5),
        Shape::Sphere { diameter, segments } => sphere_segments(diameter * 0.5, segments),
    }
}

fn box_segments(h: f32) -> Vec<Segment> {
    let corner = |i: usize| {
        Vec3::new(
            if i & 1 == 0 { -h } else { h },
            if i & 2 == 0 { -h } else { h },
            if i & 4 == 0 { -h } else { h },
        )
    };

    // Corners differing in exactly one bit share an edge.
    (0..8usize)
        .flat_map(|i| [1usize, 2, 4].map(|bit| (i, i ^ bit)))
        .filter(|(a, b)| a < b)
        .map(|(a, b)| (corner(a), corner(b)))
        .collect()
}

fn sphere_segments(radius: f32, segments: u32) -> Vec<Segment> {
    let ring = |axis_a: Vec3, axis_b: Vec3, offset: Vec3, r: f32| {
        (0..=segments)
            .map(|i| {
                let t = i as f32 / segments as f32 * std::f32::consts::TAU;
                offset + (axis_a * t.cos() + axis_b * t.sin()) * r
            })
            .tuple_windows()
            .collect::<Vec<Segment>>()
    };

    let mut out = Vec::new();

    // Meridians
    let meridians = (segments / 2).max(2);
    for i in 0..meridians {
        let phi = i as f32 / meridians as f32 * std::f32::consts::PI;
        let axis = Vec3::new(phi.cos(), 0.0, phi.sin());
        out.extend(ring(axis, Vec3::Y, Vec3::ZERO, radius));
    }

    // Parallels
    let parallels = (segments / 4).max(1);
    for i in 1..=parallels {
        let theta = i as f32 / (parallels + 1) as f32 * std::f32::consts::PI;
        let y = radius * theta.cos();
        let r = radius * theta.sin();
        out.extend(ring(Vec3::X, Vec3::Z, Vec3::new(0.0, y, 0.0), r));
    }

    out
}

pub fn polyline_segments(points: &[Vec3]) -> Vec<Segment> {
    points.iter().copied().tuple_windows().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_twelve_edges_of_equal_length() {
        let edges = shape_segments(&Shape::Box { size: 2.0 });
        assert_eq!(edges.len(), 12);
        for (a, b) in edges {
            assert!((a.distance(b) - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn sphere_points_lie_on_surface() {
        let edges = shape_segments(&Shape::Sphere {
            diameter: 4.0,
            segments: 8,
        });
        assert!(!edges.is_empty());
        for (a, b) in edges {
            assert!((a.length() - 2.0).abs() < 1e-4);
            assert!((b.length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn polyline_pairs_consecutive_points() {
        let segments = polyline_segments(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(segments, vec![(Vec3::ZERO, Vec3::X), (Vec3::X, Vec3::Y)]);
        assert!(polyline_segments(&[Vec3::ZERO]).is_empty());
    }
}
