use super::{CLEAR, Mesh, WHITE};
use glam::Vec3;

/// Distance the opaque core is pulled in from the boundary.
pub const FEATHER_LENGTH: f32 = 0.2;
/// Upper bound on the pull as a fraction of the vertex's distance from the center.
pub const FEATHER_SCALE: f32 = 0.2;

/// Pulls below this length are treated as a vertex sitting on the center.
const MIN_PULL_LENGTH: f32 = 1e-6;

/// Rebuilds `mesh` as a feathered plane: the boundary ring fully transparent, an
/// inset ring fully opaque, a fan over the inset ring and a skirt between the two.
///
/// For `n` boundary points the mesh has `2n` vertices and `(n - 2) + 2n`
/// triangles. Fewer than three points leave the mesh empty.
pub fn feathered(boundary: &[Vec3], center: Vec3, mesh: &mut Mesh) {
    mesh.clear();
    let count = boundary.len();
    if count < 3 {
        return;
    }

    mesh.vertices.reserve(count * 2);
    mesh.colors.reserve(count * 2);

    mesh.vertices.extend_from_slice(boundary);
    mesh.colors.extend(std::iter::repeat(CLEAR).take(count));

    for &vertex in boundary {
        mesh.vertices.push(center + inset_scale(vertex - center) * (vertex - center));
        mesh.colors.push(WHITE);
    }

    let inner = count as u32;
    let count = count as u32;
    mesh.indices.reserve(((count - 2) + 2 * count) as usize * 3);

    for i in 0..count - 2 {
        mesh.indices.extend([inner, inner + i + 1, inner + i + 2]);
    }

    for i in 0..count {
        let next = (i + 1) % count;
        mesh.indices.extend([i, next, inner + i]);
        mesh.indices.extend([inner + i, next, inner + next]);
    }

    mesh.recalculate_bounds();
}

fn inset_scale(pull: Vec3) -> f32 {
    let length = pull.length();
    let ratio = if length < MIN_PULL_LENGTH {
        FEATHER_SCALE
    } else {
        (FEATHER_LENGTH / length).min(FEATHER_SCALE)
    };
    1.0 - ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square(half: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(-half, 0.0, -half),
            Vec3::new(half, 0.0, -half),
            Vec3::new(half, 0.0, half),
            Vec3::new(-half, 0.0, half),
        ]
    }

    #[test]
    fn large_polygon_is_inset_by_feather_length() {
        let boundary = square(5.0);
        let mut mesh = Mesh::new();
        feathered(&boundary, Vec3::ZERO, &mut mesh);

        let corner = boundary[2];
        let inset = mesh.vertices[4 + 2];
        let pulled = corner.length() - inset.length();
        assert!((pulled - FEATHER_LENGTH).abs() < 1e-4, "pulled {pulled}");
    }

    #[test]
    fn small_polygon_is_inset_by_feather_scale() {
        let boundary = square(0.1);
        let mut mesh = Mesh::new();
        feathered(&boundary, Vec3::ZERO, &mut mesh);

        let ratio = mesh.vertices[4].length() / boundary[0].length();
        assert!((ratio - (1.0 - FEATHER_SCALE)).abs() < 1e-5);
    }

    #[test]
    fn rings_are_colored_clear_then_white() {
        let mut mesh = Mesh::new();
        feathered(&square(1.0), Vec3::ZERO, &mut mesh);
        assert!(mesh.colors[..4].iter().all(|c| *c == CLEAR));
        assert!(mesh.colors[4..].iter().all(|c| *c == WHITE));
    }

    #[test]
    fn vertex_on_center_stays_finite() {
        let boundary = vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)];
        let mut mesh = Mesh::new();
        feathered(&boundary, Vec3::ZERO, &mut mesh);

        assert!(mesh.vertices.iter().all(|v| v.is_finite()));
        assert_eq!(mesh.vertices[3], Vec3::ZERO);
    }

    #[test]
    fn degenerate_boundary_leaves_mesh_empty() {
        let mut mesh = Mesh::new();
        feathered(&square(1.0)[..2], Vec3::ZERO, &mut mesh);
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }

    proptest! {
        #[test]
        fn ring_and_triangle_counts(count in 3usize..64, radius in 0.05f32..10.0) {
            let boundary: Vec<Vec3> = (0..count)
                .map(|i| {
                    let angle = i as f32 / count as f32 * std::f32::consts::TAU;
                    Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
                })
                .collect();
            let mut mesh = Mesh::new();
            feathered(&boundary, Vec3::ZERO, &mut mesh);

            prop_assert_eq!(mesh.vertices.len(), 2 * count);
            prop_assert_eq!(mesh.colors.len(), 2 * count);
            prop_assert_eq!(mesh.triangle_count(), (count - 2) + 2 * count);
            prop_assert!(mesh.indices.iter().all(|&i| (i as usize) < 2 * count));
        }
    }
}
