use super::primitive::reference_plane_outline;
use super::{Mesh, feathered, reference_plane, triangulate_xz};
use crate::config::PlaneStyle;
use crate::plane::DetectedPlane;
use crate::pose::Pose;
use glam::Vec3;

/// Turns a plane's boundary polygon into renderable geometry.
pub trait PlaneMeshBuilder: Send {
    fn label(&self) -> &'static str;

    /// Geometry shown for a simulated plane, which has no boundary polygon.
    /// Expressed in the plane's local space.
    fn build_placeholder(&self, mesh: &mut Mesh);

    /// Rebuilds `mesh` from the polygon reported this frame and returns the
    /// transform the hosting node should take.
    fn build(&self, plane: &DetectedPlane, boundary: &[Vec3], mesh: &mut Mesh) -> Pose;
}

pub fn builder_for(style: PlaneStyle) -> Box<dyn PlaneMeshBuilder> {
    match style {
        PlaneStyle::Flat => Box::new(FlatPlaneMesh),
        PlaneStyle::Feathered => Box::new(FeatheredPlaneMesh),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FlatPlaneMesh;

impl PlaneMeshBuilder for FlatPlaneMesh {
    fn label(&self) -> &'static str {
        "flat"
    }

    fn build_placeholder(&self, mesh: &mut Mesh) {
        mesh.copy_from(&reference_plane());
    }

    fn build(&self, _plane: &DetectedPlane, boundary: &[Vec3], mesh: &mut Mesh) -> Pose {
        mesh.clear();
        if boundary.len() >= 3 {
            mesh.vertices.extend_from_slice(boundary);
            mesh.indices = triangulate_xz(boundary);
            mesh.recalculate_bounds();
        }
        // Boundary points are already in world space.
        Pose::IDENTITY
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FeatheredPlaneMesh;

impl PlaneMeshBuilder for FeatheredPlaneMesh {
    fn label(&self) -> &'static str {
        "feathered"
    }

    fn build_placeholder(&self, mesh: &mut Mesh) {
        feathered(&reference_plane_outline(), Vec3::ZERO, mesh);
    }

    /// Builds in the plane's local frame, so the returned center pose places it.
    fn build(&self, plane: &DetectedPlane, boundary: &[Vec3], mesh: &mut Mesh) -> Pose {
        let center = plane.center_pose;
        let to_local = center.rotation.inverse();
        let local: Vec<Vec3> = boundary
            .iter()
            .map(|&vertex| to_local * (vertex - center.position))
            .collect();
        feathered(&local, Vec3::ZERO, mesh);
        center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::PlaneId;
    use glam::Quat;

    fn pentagon() -> Vec<Vec3> {
        (0..5)
            .map(|i| {
                let angle = i as f32 / 5.0 * std::f32::consts::TAU;
                Vec3::new(angle.cos() + 2.0, 0.5, angle.sin())
            })
            .collect()
    }

    #[test]
    fn flat_build_keeps_world_space_polygon() {
        let plane = DetectedPlane::simulated(PlaneId(1), Pose::IDENTITY);
        let boundary = pentagon();
        let mut mesh = Mesh::new();

        let transform = FlatPlaneMesh.build(&plane, &boundary, &mut mesh);

        assert_eq!(transform, Pose::IDENTITY);
        assert_eq!(mesh.vertices, boundary);
        assert_eq!(mesh.triangle_count(), 3);
        assert!(mesh.bounds().min.x > 0.9);
    }

    #[test]
    fn flat_build_of_degenerate_polygon_is_empty() {
        let plane = DetectedPlane::simulated(PlaneId(1), Pose::IDENTITY);
        let mut mesh = Mesh::new();
        FlatPlaneMesh.build(&plane, &pentagon()[..2], &mut mesh);
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn feathered_build_orients_to_center_rotation() {
        let rotation = Quat::from_rotation_y(1.0);
        let plane = DetectedPlane::simulated(
            PlaneId(1),
            Pose::new(Vec3::new(2.0, 0.5, 0.0), rotation),
        );
        let mut mesh = Mesh::new();

        let boundary = pentagon();
        let transform = FeatheredPlaneMesh.build(&plane, &boundary, &mut mesh);

        assert_eq!(transform.rotation, rotation);
        assert_eq!(transform.position, Vec3::new(2.0, 0.5, 0.0));
        assert_eq!(mesh.vertices.len(), 10);
        assert_eq!(mesh.triangle_count(), 3 + 10);
        for (local, world) in mesh.vertices.iter().zip(&boundary) {
            let placed = transform.transform_point(*local);
            assert!(placed.distance(*world) < 1e-4, "{placed} vs {world}");
        }
    }

    #[test]
    fn placeholders_are_never_empty() {
        let mut mesh = Mesh::new();
        builder_for(PlaneStyle::Flat).build_placeholder(&mut mesh);
        assert_eq!(mesh.triangle_count(), 200);

        builder_for(PlaneStyle::Feathered).build_placeholder(&mut mesh);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangle_count(), 2 + 8);
    }
}
