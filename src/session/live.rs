use super::{
    ApkAvailability, ApkInstallStatus, ArBackend, AsyncTask, SessionMode, SessionStatus,
    TrackableQueryFilter,
};
use crate::anchor::{Anchor, AnchorId};
use crate::error::{ArResult, BackendError};
use crate::plane::{DetectedPlane, PlaneId, TrackableId};
use crate::pose::Pose;
use crate::raycast::{BackendHit, ColliderSource, HitFlags, RaycastHit, RaycastQuery};
use glam::{Vec2, Vec3};

/// The device SDK as seen from this crate. Implemented by the host's platform
/// glue; every call is a synchronous snapshot except the APK queries.
pub trait DeviceSession: Send {
    fn label(&self) -> &'static str {
        "device"
    }

    fn status(&self) -> SessionStatus;

    /// Clears `out` and fills it with planes matching `filter`.
    fn trackables(&mut self, filter: TrackableQueryFilter, out: &mut Vec<DetectedPlane>);
    fn plane(&self, id: PlaneId) -> Option<DetectedPlane>;
    fn boundary_polygon(&self, id: PlaneId, out: &mut Vec<Vec3>) -> bool;

    /// Binds an anchor to a plane or a feature point reported by a raycast.
    fn create_anchor(&mut self, trackable: TrackableId, pose: Pose) -> Result<Anchor, BackendError>;
    fn anchor_pose(&self, anchor: AnchorId) -> Option<Pose>;

    fn check_apk_availability(&mut self) -> AsyncTask<ApkAvailability>;
    fn request_apk_installation(&mut self, user_requested: bool) -> AsyncTask<ApkInstallStatus>;

    fn raycast(&mut self, screen: Vec2, filter: HitFlags) -> Option<BackendHit>;
    fn point_cloud(&self, out: &mut Vec<Vec3>) -> bool;
}

pub struct LiveBackend {
    device: Box<dyn DeviceSession>,
}

impl LiveBackend {
    pub fn new(device: Box<dyn DeviceSession>) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &dyn DeviceSession {
        self.device.as_ref()
    }
}

impl ArBackend for LiveBackend {
    fn label(&self) -> &'static str {
        self.device.label()
    }

    fn mode(&self) -> SessionMode {
        SessionMode::Live
    }

    fn status(&self) -> SessionStatus {
        self.device.status()
    }

    fn set_status(&mut self, status: SessionStatus) {
        log::debug!("[session] ignoring status {status:?}; live status is owned by the device");
    }

    fn planes(&mut self, filter: TrackableQueryFilter, out: &mut Vec<DetectedPlane>) {
        self.device.trackables(filter, out);
    }

    fn plane(&self, id: PlaneId) -> Option<DetectedPlane> {
        self.device.plane(id)
    }

    fn boundary_polygon(&self, id: PlaneId, out: &mut Vec<Vec3>) -> bool {
        self.device.boundary_polygon(id, out)
    }

    fn check_apk_availability(&mut self) -> AsyncTask<ApkAvailability> {
        self.device.check_apk_availability()
    }

    fn set_apk_availability(&mut self, availability: ApkAvailability) {
        log::debug!("[session] ignoring apk availability {availability:?}; the device reports it");
    }

    fn request_apk_installation(
        &mut self,
        user_requested: bool,
    ) -> Option<AsyncTask<ApkInstallStatus>> {
        Some(self.device.request_apk_installation(user_requested))
    }

    fn create_anchor(&mut self, trackable: Option<TrackableId>, pose: Pose) -> ArResult<Anchor> {
        let trackable = trackable.ok_or(BackendError::MissingTrackable)?;
        let anchor = self.device.create_anchor(trackable, pose)?;
        log::debug!("[session] anchor {:?} created on {trackable}", anchor.id());
        Ok(anchor)
    }

    fn anchor_pose(&self, anchor: &Anchor) -> Pose {
        self.device.anchor_pose(anchor.id()).unwrap_or(anchor.pose)
    }

    fn raycast(
        &mut self,
        query: &RaycastQuery,
        filter: HitFlags,
        _colliders: &dyn ColliderSource,
    ) -> Option<RaycastHit> {
        self.device
            .raycast(query.screen, filter)
            .map(RaycastHit::from_backend)
    }

    fn point_cloud(&self, out: &mut Vec<Vec3>) -> bool {
        self.device.point_cloud(out)
    }
}
