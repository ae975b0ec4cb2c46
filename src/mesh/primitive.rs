use super::Mesh;
use glam::{Vec2, Vec3, Vec4};

pub const REFERENCE_PLANE_SIZE: f32 = 10.0;
pub const REFERENCE_PLANE_SUBDIVISIONS: u32 = 10;

/// The flat grid primitive simulated planes copy: 10 x 10 units centered on the
/// origin in XZ, facing +Y, 11 x 11 vertices and 200 triangles.
pub fn reference_plane() -> Mesh {
    let cells = REFERENCE_PLANE_SUBDIVISIONS;
    let stride = cells + 1;
    let half = REFERENCE_PLANE_SIZE * 0.5;
    let step = REFERENCE_PLANE_SIZE / cells as f32;

    let mut mesh = Mesh::new();
    for row in 0..stride {
        for column in 0..stride {
            let x = -half + column as f32 * step;
            let z = -half + row as f32 * step;
            mesh.vertices.push(Vec3::new(x, 0.0, z));
            mesh.normals.push(Vec3::Y);
            mesh.uvs.push(Vec2::new(
                column as f32 / cells as f32,
                row as f32 / cells as f32,
            ));
            mesh.tangents.push(Vec4::new(1.0, 0.0, 0.0, -1.0));
        }
    }

    for row in 0..cells {
        for column in 0..cells {
            let a = row * stride + column;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            mesh.indices.extend([a, c, b, b, c, d]);
        }
    }

    mesh.recalculate_bounds();
    mesh
}

/// Boundary of the reference plane, counter-clockwise in XZ.
pub fn reference_plane_outline() -> [Vec3; 4] {
    let half = REFERENCE_PLANE_SIZE * 0.5;
    [
        Vec3::new(-half, 0.0, -half),
        Vec3::new(half, 0.0, -half),
        Vec3::new(half, 0.0, half),
        Vec3::new(-half, 0.0, half),
    ]
}
