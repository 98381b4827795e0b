//! Unit geometry generators.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Corners of the unit quad spanning [0, 1] x [0, 1].
pub const UNIT_QUAD_POSITIONS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
];

/// Indices assembling the unit quad into two counter-clockwise triangles.
pub const UNIT_QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// Corners of the unit cube spanning [-1, 1] on each axis.
pub const UNIT_CUBE_POSITIONS: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
];

/// Indices assembling the unit cube corners into 12 triangles.
pub const UNIT_CUBE_INDICES: [u32; 36] = [
    0, 2, 1, 0, 3, 2, // back
    4, 5, 6, 4, 6, 7, // front
    0, 4, 7, 0, 7, 3, // left
    1, 6, 5, 1, 2, 6, // right
    3, 7, 6, 3, 6, 2, // top
    0, 1, 5, 0, 5, 4, // bottom
];

/// A vertex with position and face normal, interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct NormalVertex {
    /// Position in model space.
    pub position: Vec3,
    /// Face normal.
    pub normal: Vec3,
}

/// Generate the unit cube as 36 unindexed vertices with flat face
/// normals. Corners cannot be shared since each face needs its own
/// normal.
pub fn unit_cube_with_normals() -> Vec<NormalVertex> {
    UNIT_CUBE_INDICES
        .chunks_exact(3)
        .flat_map(|triangle| {
            let a = UNIT_CUBE_POSITIONS[triangle[0] as usize];
            let b = UNIT_CUBE_POSITIONS[triangle[1] as usize];
            let c = UNIT_CUBE_POSITIONS[triangle[2] as usize];
            let normal = (b - a).cross(c - a).normalize();
            [a, b, c].map(|position| NormalVertex { position, normal })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_indices_address_quad_vertices() {
        assert!(UNIT_QUAD_INDICES
            .iter()
            .all(|&i| (i as usize) < UNIT_QUAD_POSITIONS.len()));
    }

    #[test]
    fn test_cube_indices_address_cube_vertices() {
        assert!(UNIT_CUBE_INDICES
            .iter()
            .all(|&i| (i as usize) < UNIT_CUBE_POSITIONS.len()));
    }

    #[test]
    fn test_cube_normals_are_axis_aligned_and_unit() {
        let vertices = unit_cube_with_normals();
        assert_eq!(vertices.len(), 36);
        for vertex in &vertices {
            assert!((vertex.normal.length() - 1.0).abs() < 1e-6);
            let abs = vertex.normal.abs();
            // Exactly one component of a face normal is 1.
            assert!((abs.x + abs.y + abs.z - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cube_normals_point_outward() {
        for vertex in unit_cube_with_normals() {
            // Centroid of the cube is the origin, so an outward normal has
            // a positive projection onto its vertex position.
            assert!(vertex.normal.dot(vertex.position) > 0.0);
        }
    }
}
