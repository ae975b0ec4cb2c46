//! Per-plane visual bindings and the point cloud.

mod point_cloud;

pub use point_cloud::{MAX_POINT_COUNT, PointCloudVisual};

use crate::config::ArConfig;
use crate::error::{ArError, ArResult};
use crate::mesh::{Mesh, PlaneMeshBuilder};
use crate::plane::{DetectedPlane, PlaneId};
use crate::pose::Pose;
use crate::session::Session;
use glam::Vec3;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VisualState {
    Uninitialized,
    Active,
    /// Tracking paused or stopped; rendering and collision are off until it resumes.
    Hidden,
    /// Terminal. The plane was subsumed or is gone from the backend.
    Destroyed,
}

/// What a single [`PlaneVisual::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualEvent {
    Unchanged,
    Rebuilt,
    Hidden,
    /// Reported exactly once, on the update that tore the visual down.
    Destroyed { subsumed_by: Option<PlaneId> },
    /// Already destroyed; nothing to do.
    Idle,
}

/// Render settings copied from the config when the visual is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisualSettings {
    pub visualize: bool,
    pub has_material: bool,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

impl VisualSettings {
    pub fn from_config(config: &ArConfig) -> Self {
        Self {
            visualize: config.visualize_planes,
            has_material: config.plane_material.is_some(),
            cast_shadows: config.planes_cast_shadows,
            receive_shadows: config.planes_receive_shadows,
        }
    }
}

/// Mirrors one detected plane into a mesh, rebuilding only when its boundary changes.
pub struct PlaneVisual {
    state: VisualState,
    plane: Option<PlaneId>,
    builder: Box<dyn PlaneMeshBuilder>,
    settings: VisualSettings,
    mesh: Mesh,
    transform: Pose,
    boundary: Vec<Vec3>,
    previous_boundary: Vec<Vec3>,
    uses_placeholder: bool,
    placeholder_built: bool,
    render_enabled: bool,
    collider_enabled: bool,
}

impl PlaneVisual {
    pub fn new(builder: Box<dyn PlaneMeshBuilder>, settings: VisualSettings) -> Self {
        Self {
            state: VisualState::Uninitialized,
            plane: None,
            builder,
            settings,
            mesh: Mesh::new(),
            transform: Pose::IDENTITY,
            boundary: Vec::new(),
            previous_boundary: Vec::new(),
            uses_placeholder: false,
            placeholder_built: false,
            render_enabled: false,
            collider_enabled: false,
        }
    }

    /// Binds the visual to `plane` and runs the first update.
    pub fn initialize(
        &mut self,
        plane: &DetectedPlane,
        session: &Session,
    ) -> ArResult<VisualEvent> {
        self.plane = Some(plane.id);
        self.uses_placeholder = session.is_simulated();
        self.state = VisualState::Active;
        log::debug!(
            "[planes] {} bound to {} visual ({:?})",
            plane.id,
            self.builder.label(),
            plane.direction()
        );
        self.update(session)
    }

    pub fn update(&mut self, session: &Session) -> ArResult<VisualEvent> {
        let id = match (self.state, self.plane) {
            (VisualState::Uninitialized, _) | (_, None) => {
                return Err(ArError::NotInitialized {
                    component: "PlaneVisual",
                });
            }
            (VisualState::Destroyed, _) => return Ok(VisualEvent::Idle),
            (_, Some(id)) => id,
        };

        let Some(plane) = session.plane(id) else {
            log::info!("[planes] {id} no longer reported; tearing down visual");
            self.destroy();
            return Ok(VisualEvent::Destroyed { subsumed_by: None });
        };

        if let Some(subsumer) = plane.subsumed_by {
            log::info!("[planes] {id} subsumed by {subsumer}; tearing down visual");
            self.destroy();
            return Ok(VisualEvent::Destroyed {
                subsumed_by: Some(subsumer),
            });
        }

        if !plane.is_tracking() {
            if self.state != VisualState::Hidden {
                log::debug!("[planes] {id} {:?}; hiding", plane.tracking_state);
            }
            self.state = VisualState::Hidden;
            self.render_enabled = false;
            self.collider_enabled = false;
            return Ok(VisualEvent::Hidden);
        }

        if self.state == VisualState::Hidden {
            log::debug!("[planes] {id} tracking again; showing");
        }
        self.state = VisualState::Active;
        self.render_enabled = self.settings.visualize && self.settings.has_material;
        self.collider_enabled = true;

        if self.rebuild_if_needed(session, &plane) {
            Ok(VisualEvent::Rebuilt)
        } else {
            Ok(VisualEvent::Unchanged)
        }
    }

    fn rebuild_if_needed(&mut self, session: &Session, plane: &DetectedPlane) -> bool {
        if self.uses_placeholder {
            if self.placeholder_built {
                return false;
            }
            self.builder.build_placeholder(&mut self.mesh);
            self.transform = plane.center_pose;
            self.placeholder_built = true;
            return true;
        }

        session.boundary_polygon(plane.id, &mut self.boundary);
        if self.boundary == self.previous_boundary {
            return false;
        }

        self.transform = self.builder.build(plane, &self.boundary, &mut self.mesh);
        std::mem::swap(&mut self.boundary, &mut self.previous_boundary);
        log::debug!(
            "[planes] {} rebuilt: {} vertices, {} triangles",
            plane.id,
            self.mesh.vertices.len(),
            self.mesh.triangle_count()
        );
        true
    }

    fn destroy(&mut self) {
        self.state = VisualState::Destroyed;
        self.render_enabled = false;
        self.collider_enabled = false;
        self.mesh.clear();
    }

    pub fn state(&self) -> VisualState {
        self.state
    }

    pub fn plane_id(&self) -> Option<PlaneId> {
        self.plane
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn transform(&self) -> Pose {
        self.transform
    }

    pub fn settings(&self) -> VisualSettings {
        self.settings
    }

    pub fn render_enabled(&self) -> bool {
        self.render_enabled
    }

    pub fn collider_enabled(&self) -> bool {
        self.collider_enabled
    }

    pub fn builder_label(&self) -> &'static str {
        self.builder.label()
    }
}
