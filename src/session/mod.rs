//! The AR session: one explicitly constructed object per app lifetime, backed by
//! either a simulated backend or a live device.
//!
//! The mode is chosen once in [`Session::start`]. Everything downstream talks to
//! the [`ArBackend`] trait and never branches on the mode itself.

pub mod live;
pub mod simulated;
pub mod task;

pub use live::{DeviceSession, LiveBackend};
pub use simulated::SimulatedBackend;
pub use task::{AsyncTask, TaskCompleter};

use crate::anchor::Anchor;
use crate::config::ArConfig;
use crate::error::{ArResult, ConfigError};
use crate::plane::{DetectedPlane, PlaneId, TrackableId};
use crate::pose::Pose;
use crate::raycast::{ColliderSource, HitFlags, RaycastHit, RaycastQuery};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionMode {
    Simulated,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    None,
    Initializing,
    Tracking,
    LostTracking,
    NotTracking,
    FatalError,
    ErrorApkNotAvailable,
    ErrorPermissionNotGranted,
    ErrorSessionConfigurationNotSupported,
    ErrorCameraNotAvailable,
    ErrorIllegalState,
}

impl SessionStatus {
    pub fn is_not_initialized(self) -> bool {
        matches!(self, SessionStatus::None | SessionStatus::Initializing)
    }

    pub fn is_valid(self) -> bool {
        matches!(
            self,
            SessionStatus::Tracking | SessionStatus::LostTracking | SessionStatus::NotTracking
        )
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            SessionStatus::FatalError
                | SessionStatus::ErrorApkNotAvailable
                | SessionStatus::ErrorPermissionNotGranted
                | SessionStatus::ErrorSessionConfigurationNotSupported
                | SessionStatus::ErrorCameraNotAvailable
                | SessionStatus::ErrorIllegalState
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApkAvailability {
    UnknownError,
    UnknownChecking,
    UnknownTimedOut,
    UnsupportedDeviceNotCapable,
    SupportedNotInstalled,
    SupportedApkTooOld,
    SupportedInstalled,
}

impl ApkAvailability {
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            ApkAvailability::SupportedNotInstalled
                | ApkAvailability::SupportedApkTooOld
                | ApkAvailability::SupportedInstalled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApkInstallStatus {
    Uninitialized,
    Requested,
    Success,
    Error,
    ErrorDeviceNotCompatible,
    ErrorUserDeclined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackableQueryFilter {
    All,
    /// Only trackables first reported since the previous query.
    New,
}

/// Uniform surface over the simulated and live implementations.
pub trait ArBackend: Send {
    fn label(&self) -> &'static str;
    fn mode(&self) -> SessionMode;

    fn status(&self) -> SessionStatus;
    fn set_status(&mut self, status: SessionStatus);

    fn is_not_initialized(&self) -> bool {
        self.status().is_not_initialized()
    }

    fn is_valid(&self) -> bool {
        self.status().is_valid()
    }

    fn is_error(&self) -> bool {
        self.status().is_error()
    }

    /// Clears `out` and fills it with the planes matching `filter`.
    fn planes(&mut self, filter: TrackableQueryFilter, out: &mut Vec<DetectedPlane>);
    fn plane(&self, id: PlaneId) -> Option<DetectedPlane>;
    /// Clears `out` and fills it with the plane's boundary. False when the plane has none.
    fn boundary_polygon(&self, id: PlaneId, out: &mut Vec<Vec3>) -> bool;

    fn check_apk_availability(&mut self) -> AsyncTask<ApkAvailability>;
    fn set_apk_availability(&mut self, availability: ApkAvailability);
    fn request_apk_installation(
        &mut self,
        user_requested: bool,
    ) -> Option<AsyncTask<ApkInstallStatus>>;

    fn create_anchor(&mut self, trackable: Option<TrackableId>, pose: Pose) -> ArResult<Anchor>;
    fn anchor_pose(&self, anchor: &Anchor) -> Pose;

    fn raycast(
        &mut self,
        query: &RaycastQuery,
        filter: HitFlags,
        colliders: &dyn ColliderSource,
    ) -> Option<RaycastHit>;

    /// Clears `out` and fills it with feature points. False unless the cloud changed this frame.
    fn point_cloud(&self, out: &mut Vec<Vec3>) -> bool;
}

pub struct Session {
    backend: Box<dyn ArBackend>,
}

impl Session {
    /// Selects the backend for `config.mode`. A live session needs a device.
    pub fn start(
        config: &ArConfig,
        device: Option<Box<dyn DeviceSession>>,
    ) -> Result<Self, ConfigError> {
        let session = match (config.mode, device) {
            (SessionMode::Simulated, device) => {
                if device.is_some() {
                    log::warn!("[session] simulated mode configured; ignoring provided device");
                }
                Self::simulated(config)
            }
            (SessionMode::Live, Some(device)) => Self::live(device),
            (SessionMode::Live, None) => return Err(ConfigError::MissingDevice),
        };
        log::info!("[session] started with {} backend", session.backend.label());
        Ok(session)
    }

    pub fn simulated(config: &ArConfig) -> Self {
        Self::with_backend(Box::new(SimulatedBackend::new(
            config.simulated_status,
            config.simulated_apk_availability,
        )))
    }

    pub fn live(device: Box<dyn DeviceSession>) -> Self {
        Self::with_backend(Box::new(LiveBackend::new(device)))
    }

    pub fn with_backend(backend: Box<dyn ArBackend>) -> Self {
        Self { backend }
    }

    pub fn shutdown(self) {
        log::info!("[session] {} backend shut down", self.backend.label());
    }

    pub fn mode(&self) -> SessionMode {
        self.backend.mode()
    }

    pub fn is_simulated(&self) -> bool {
        self.mode() == SessionMode::Simulated
    }

    pub fn backend_label(&self) -> &'static str {
        self.backend.label()
    }

    pub fn status(&self) -> SessionStatus {
        self.backend.status()
    }

    /// Only takes effect on simulated sessions; live status belongs to the device.
    pub fn set_status(&mut self, status: SessionStatus) {
        self.backend.set_status(status);
    }

    /// Changes what the next availability check reports. Simulated sessions only.
    pub fn set_apk_availability(&mut self, availability: ApkAvailability) {
        self.backend.set_apk_availability(availability);
    }

    /// Simulated sessions always report themselves initialized.
    pub fn is_not_initialized(&self) -> bool {
        self.backend.is_not_initialized()
    }

    /// Simulated sessions always report themselves valid.
    pub fn is_valid(&self) -> bool {
        self.backend.is_valid()
    }

    /// Simulated sessions never report an error.
    pub fn is_error(&self) -> bool {
        self.backend.is_error()
    }

    pub fn planes(&mut self, filter: TrackableQueryFilter, out: &mut Vec<DetectedPlane>) {
        self.backend.planes(filter, out);
    }

    pub fn plane(&self, id: PlaneId) -> Option<DetectedPlane> {
        self.backend.plane(id)
    }

    pub fn boundary_polygon(&self, id: PlaneId, out: &mut Vec<Vec3>) -> bool {
        self.backend.boundary_polygon(id, out)
    }

    pub fn check_apk_availability(&mut self) -> AsyncTask<ApkAvailability> {
        self.backend.check_apk_availability()
    }

    /// `None` on simulated sessions, which have nothing to install.
    pub fn request_apk_installation(
        &mut self,
        user_requested: bool,
    ) -> Option<AsyncTask<ApkInstallStatus>> {
        self.backend.request_apk_installation(user_requested)
    }

    pub fn create_anchor(
        &mut self,
        trackable: Option<TrackableId>,
        pose: Pose,
    ) -> ArResult<Anchor> {
        self.backend.create_anchor(trackable, pose)
    }

    /// Pulls the device's latest estimate of the anchor's pose.
    pub fn refresh_anchor(&self, anchor: &mut Anchor) {
        anchor.pose = self.backend.anchor_pose(anchor);
    }

    pub fn raycast(
        &mut self,
        query: &RaycastQuery,
        filter: HitFlags,
        colliders: &dyn ColliderSource,
    ) -> Option<RaycastHit> {
        self.backend.raycast(query, filter, colliders)
    }

    pub fn point_cloud(&self, out: &mut Vec<Vec3>) -> bool {
        self.backend.point_cloud(out)
    }
}
