use super::{
    ApkAvailability, ApkInstallStatus, ArBackend, AsyncTask, SessionMode, SessionStatus,
    TrackableQueryFilter,
};
use crate::anchor::{Anchor, AnchorId};
use crate::error::ArResult;
use crate::plane::{DetectedPlane, PlaneId, TrackableId};
use crate::pose::Pose;
use crate::raycast::{ColliderSource, HitFlags, RaycastHit, RaycastQuery};
use glam::Vec3;

pub const SIMULATED_FLOOR: PlaneId = PlaneId(1);
pub const SIMULATED_WALL: PlaneId = PlaneId(2);

/// Wall rotation in degrees, applied Z, then X, then Y.
const WALL_EULER_DEGREES: [f32; 3] = [0.0, 90.0, -90.0];

/// In-process stand-in for a device: a host-controlled status, an instant APK
/// check, and a floor and a wall that appear on the first plane query.
pub struct SimulatedBackend {
    status: SessionStatus,
    apk_availability: ApkAvailability,
    planes: Vec<DetectedPlane>,
    planes_detected: bool,
    next_anchor: u64,
}

impl SimulatedBackend {
    pub fn new(status: SessionStatus, apk_availability: ApkAvailability) -> Self {
        Self {
            status,
            apk_availability,
            planes: Vec::new(),
            planes_detected: false,
            next_anchor: 1,
        }
    }

    pub fn planes_detected(&self) -> bool {
        self.planes_detected
    }

    fn synthesize_planes(&mut self) {
        self.planes.clear();
        self.planes
            .push(DetectedPlane::simulated(SIMULATED_FLOOR, Pose::IDENTITY));
        self.planes.push(DetectedPlane::simulated(
            SIMULATED_WALL,
            Pose::from_euler_degrees(Vec3::ZERO, WALL_EULER_DEGREES),
        ));
        if !self.planes_detected {
            log::debug!("[session] simulated floor and wall detected");
        }
        self.planes_detected = true;
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(SessionStatus::Tracking, ApkAvailability::SupportedInstalled)
    }
}

impl ArBackend for SimulatedBackend {
    fn label(&self) -> &'static str {
        "simulated"
    }

    fn mode(&self) -> SessionMode {
        SessionMode::Simulated
    }

    fn status(&self) -> SessionStatus {
        self.status
    }

    fn set_status(&mut self, status: SessionStatus) {
        if status != self.status {
            log::debug!("[session] simulated status {:?} -> {:?}", self.status, status);
        }
        self.status = status;
    }

    fn is_not_initialized(&self) -> bool {
        false
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn is_error(&self) -> bool {
        false
    }

    fn planes(&mut self, filter: TrackableQueryFilter, out: &mut Vec<DetectedPlane>) {
        out.clear();
        // The first query of either kind reports both planes as new. After that
        // `New` stays empty while `All` re-synthesizes the same two planes.
        if !self.planes_detected || filter == TrackableQueryFilter::All {
            self.synthesize_planes();
            out.extend(self.planes.iter().cloned());
        }
    }

    fn plane(&self, id: PlaneId) -> Option<DetectedPlane> {
        self.planes.iter().find(|plane| plane.id == id).cloned()
    }

    fn boundary_polygon(&self, _id: PlaneId, out: &mut Vec<Vec3>) -> bool {
        out.clear();
        false
    }

    fn check_apk_availability(&mut self) -> AsyncTask<ApkAvailability> {
        AsyncTask::ready(self.apk_availability)
    }

    fn set_apk_availability(&mut self, availability: ApkAvailability) {
        self.apk_availability = availability;
    }

    fn request_apk_installation(
        &mut self,
        _user_requested: bool,
    ) -> Option<AsyncTask<ApkInstallStatus>> {
        None
    }

    fn create_anchor(&mut self, _trackable: Option<TrackableId>, pose: Pose) -> ArResult<Anchor> {
        let id = AnchorId(self.next_anchor);
        self.next_anchor += 1;
        Ok(Anchor::placeholder(id, pose))
    }

    fn anchor_pose(&self, anchor: &Anchor) -> Pose {
        anchor.pose
    }

    fn raycast(
        &mut self,
        query: &RaycastQuery,
        filter: HitFlags,
        colliders: &dyn ColliderSource,
    ) -> Option<RaycastHit> {
        if !filter.intersects(HitFlags::PLANE_WITHIN_POLYGON) {
            return None;
        }
        colliders
            .raycast_colliders(&query.ray)
            .map(RaycastHit::from_geometric)
    }

    fn point_cloud(&self, out: &mut Vec<Vec3>) -> bool {
        out.clear();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::{PlaneDirection, TrackingState};

    #[test]
    fn first_new_query_reports_floor_and_wall() {
        let mut backend = SimulatedBackend::default();
        let mut planes = Vec::new();

        backend.planes(TrackableQueryFilter::New, &mut planes);

        assert_eq!(planes.len(), 2);
        assert_eq!(planes[0].direction(), PlaneDirection::Horizontal);
        assert_eq!(planes[1].direction(), PlaneDirection::Vertical);
        assert!(planes.iter().all(|p| p.tracking_state == TrackingState::Tracking));
        assert!(planes.iter().all(|p| p.subsumed_by.is_none() && p.extent_x == 0.0));
    }

    #[test]
    fn later_new_queries_are_empty() {
        let mut backend = SimulatedBackend::default();
        let mut planes = Vec::new();
        backend.planes(TrackableQueryFilter::New, &mut planes);

        for _ in 0..5 {
            backend.planes(TrackableQueryFilter::New, &mut planes);
            assert!(planes.is_empty());
        }
    }

    #[test]
    fn first_all_query_also_sets_the_latch() {
        let mut backend = SimulatedBackend::default();
        let mut planes = Vec::new();

        backend.planes(TrackableQueryFilter::All, &mut planes);
        assert_eq!(planes.len(), 2);
        backend.planes(TrackableQueryFilter::New, &mut planes);
        assert!(planes.is_empty());
    }

    #[test]
    fn all_queries_keep_plane_ids_stable() {
        let mut backend = SimulatedBackend::default();
        let mut first = Vec::new();
        let mut second = Vec::new();

        backend.planes(TrackableQueryFilter::All, &mut first);
        backend.planes(TrackableQueryFilter::All, &mut second);

        assert_eq!(first, second);
        assert_eq!(backend.plane(SIMULATED_WALL).map(|p| p.id), Some(SIMULATED_WALL));
    }

    #[test]
    fn status_is_host_driven() {
        let mut backend = SimulatedBackend::default();
        backend.set_status(SessionStatus::ErrorPermissionNotGranted);
        assert_eq!(backend.status(), SessionStatus::ErrorPermissionNotGranted);
        assert!(!backend.is_error());
        assert!(backend.is_valid());
    }

    #[test]
    fn apk_check_resolves_immediately() {
        let mut backend =
            SimulatedBackend::new(SessionStatus::Tracking, ApkAvailability::SupportedApkTooOld);
        let task = backend.check_apk_availability();
        assert_eq!(task.result(), Some(ApkAvailability::SupportedApkTooOld));
        assert!(backend.request_apk_installation(true).is_none());
    }

    #[test]
    fn anchors_are_disabled_placeholders() {
        let mut backend = SimulatedBackend::default();
        let pose = Pose::new(Vec3::new(1.0, 0.0, 2.0), glam::Quat::IDENTITY);
        let anchor = backend
            .create_anchor(Some(SIMULATED_FLOOR.into()), pose)
            .expect("simulated anchors never fail");
        assert!(!anchor.enabled);
        assert_eq!(anchor.pose, pose);
        assert_eq!(anchor.trackable(), None);
    }
}
