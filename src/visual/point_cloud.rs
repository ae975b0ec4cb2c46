use crate::mesh::{Mesh, Topology};
use crate::session::Session;
use glam::Vec3;

/// Feature points beyond this are dropped.
pub const MAX_POINT_COUNT: usize = 61440;

/// Renders the device's feature points as a point-topology mesh.
pub struct PointCloudVisual {
    visualize: bool,
    has_material: bool,
    mesh: Mesh,
    points: Vec<Vec3>,
}

impl PointCloudVisual {
    pub fn new(visualize: bool, has_material: bool) -> Self {
        if visualize && !has_material {
            log::warn!("[points] point cloud has no material and will not render");
        }
        let mut mesh = Mesh::new();
        mesh.topology = Topology::Points;
        Self {
            visualize,
            has_material,
            mesh,
            points: Vec::new(),
        }
    }

    /// Refreshes the mesh when the session reports a new cloud. Returns true on refresh.
    pub fn update(&mut self, session: &Session) -> bool {
        if !self.visualize || !session.point_cloud(&mut self.points) {
            return false;
        }

        if self.points.len() > MAX_POINT_COUNT {
            log::debug!(
                "[points] truncating cloud of {} points to {MAX_POINT_COUNT}",
                self.points.len()
            );
            self.points.truncate(MAX_POINT_COUNT);
        }

        self.mesh.clear();
        self.mesh.topology = Topology::Points;
        self.mesh.vertices.extend_from_slice(&self.points);
        self.mesh.indices.extend(0..self.points.len() as u32);
        self.mesh.recalculate_bounds();
        true
    }

    /// Like plane visuals, the cloud only renders when it has a material.
    pub fn render_enabled(&self) -> bool {
        self.visualize && self.has_material
    }

    pub fn point_count(&self) -> usize {
        self.mesh.vertices.len()
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArConfig;

    #[test]
    fn simulated_session_never_refreshes_the_cloud() {
        let session = Session::simulated(&ArConfig::simulated());
        let mut cloud = PointCloudVisual::new(true, true);
        assert!(!cloud.update(&session));
        assert_eq!(cloud.point_count(), 0);
        assert_eq!(cloud.mesh().topology, Topology::Points);
    }

    #[test]
    fn hidden_cloud_skips_updates() {
        let session = Session::simulated(&ArConfig::simulated());
        let mut cloud = PointCloudVisual::new(false, true);
        assert!(!cloud.update(&session));
        assert!(!cloud.render_enabled());
    }

    #[test]
    fn cloud_without_material_does_not_render() {
        assert!(PointCloudVisual::new(true, true).render_enabled());
        assert!(!PointCloudVisual::new(true, false).render_enabled());
    }
}
