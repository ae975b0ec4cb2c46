#![allow(dead_code)]

use glam::{Vec2, Vec3};
use planar_ar::anchor::{Anchor, AnchorId};
use planar_ar::error::BackendError;
use planar_ar::plane::{DetectedPlane, PlaneId, TrackableId, TrackingState};
use planar_ar::pose::Pose;
use planar_ar::raycast::{BackendHit, HitFlags, Ray, RaycastQuery};
use planar_ar::session::{
    ApkAvailability, ApkInstallStatus, AsyncTask, DeviceSession, SessionStatus, TaskCompleter,
    TrackableQueryFilter,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Device state a test scripts frame by frame.
pub struct DeviceState {
    pub status: SessionStatus,
    pub planes: Vec<DetectedPlane>,
    pub polygons: HashMap<PlaneId, Vec<Vec3>>,
    pub invalid_trackables: HashSet<TrackableId>,
    pub hit: Option<BackendHit>,
    pub anchors: HashMap<AnchorId, Pose>,
    /// Consumed by the next point cloud query.
    pub points: Option<Vec<Vec3>>,
    pub apk: ApkAvailability,
    pub pending_install: Option<TaskCompleter<ApkInstallStatus>>,
    reported: HashSet<PlaneId>,
    next_anchor: u64,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Tracking,
            planes: Vec::new(),
            polygons: HashMap::new(),
            invalid_trackables: HashSet::new(),
            hit: None,
            anchors: HashMap::new(),
            points: None,
            apk: ApkAvailability::SupportedInstalled,
            pending_install: None,
            reported: HashSet::new(),
            next_anchor: 1,
        }
    }
}

impl DeviceState {
    pub fn add_plane(&mut self, plane: DetectedPlane, polygon: Vec<Vec3>) {
        self.polygons.insert(plane.id, polygon);
        self.planes.push(plane);
    }

    pub fn plane_mut(&mut self, id: PlaneId) -> &mut DetectedPlane {
        self.planes
            .iter_mut()
            .find(|plane| plane.id == id)
            .expect("scripted plane")
    }

    pub fn remove_plane(&mut self, id: PlaneId) {
        self.planes.retain(|plane| plane.id != id);
        self.polygons.remove(&id);
    }
}

#[derive(Clone, Default)]
pub struct DeviceHandle {
    state: Arc<Mutex<DeviceState>>,
}

impl DeviceHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(&self) -> Box<dyn DeviceSession> {
        Box::new(ScriptedDevice {
            state: Arc::clone(&self.state),
        })
    }

    pub fn with<R>(&self, script: impl FnOnce(&mut DeviceState) -> R) -> R {
        script(&mut self.state.lock().unwrap())
    }
}

struct ScriptedDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl DeviceSession for ScriptedDevice {
    fn label(&self) -> &'static str {
        "scripted"
    }

    fn status(&self) -> SessionStatus {
        self.state.lock().unwrap().status
    }

    fn trackables(&mut self, filter: TrackableQueryFilter, out: &mut Vec<DetectedPlane>) {
        let mut state = self.state.lock().unwrap();
        out.clear();
        let planes = state.planes.clone();
        for plane in planes {
            let first_report = state.reported.insert(plane.id);
            if filter == TrackableQueryFilter::All || first_report {
                out.push(plane);
            }
        }
    }

    fn plane(&self, id: PlaneId) -> Option<DetectedPlane> {
        let state = self.state.lock().unwrap();
        state.planes.iter().find(|plane| plane.id == id).cloned()
    }

    fn boundary_polygon(&self, id: PlaneId, out: &mut Vec<Vec3>) -> bool {
        let state = self.state.lock().unwrap();
        out.clear();
        match state.polygons.get(&id) {
            Some(polygon) => {
                out.extend_from_slice(polygon);
                true
            }
            None => false,
        }
    }

    fn create_anchor(
        &mut self,
        trackable: TrackableId,
        pose: Pose,
    ) -> Result<Anchor, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.invalid_trackables.contains(&trackable) {
            return Err(BackendError::InvalidTrackable(trackable));
        }
        let id = AnchorId(state.next_anchor);
        state.next_anchor += 1;
        state.anchors.insert(id, pose);
        Ok(Anchor::new(id, Some(trackable), pose))
    }

    fn anchor_pose(&self, anchor: AnchorId) -> Option<Pose> {
        self.state.lock().unwrap().anchors.get(&anchor).copied()
    }

    fn check_apk_availability(&mut self) -> AsyncTask<ApkAvailability> {
        AsyncTask::ready(self.state.lock().unwrap().apk)
    }

    fn request_apk_installation(&mut self, _user_requested: bool) -> AsyncTask<ApkInstallStatus> {
        let (task, completer) = AsyncTask::pending();
        self.state.lock().unwrap().pending_install = Some(completer);
        task
    }

    fn raycast(&mut self, _screen: Vec2, filter: HitFlags) -> Option<BackendHit> {
        let state = self.state.lock().unwrap();
        state.hit.filter(|hit| filter.intersects(hit.flags))
    }

    fn point_cloud(&self, out: &mut Vec<Vec3>) -> bool {
        let mut state = self.state.lock().unwrap();
        out.clear();
        match state.points.take() {
            Some(points) => {
                out.extend(points);
                true
            }
            None => false,
        }
    }
}

/// A tracking plane centered at `center` with a square boundary of `half` extent.
pub fn square_plane(id: u64, center: Vec3, half: f32) -> (DetectedPlane, Vec<Vec3>) {
    let plane = DetectedPlane {
        id: PlaneId(id),
        center_pose: Pose::new(center, glam::Quat::IDENTITY),
        extent_x: half * 2.0,
        extent_z: half * 2.0,
        tracking_state: TrackingState::Tracking,
        subsumed_by: None,
    };
    let polygon = vec![
        center + Vec3::new(-half, 0.0, -half),
        center + Vec3::new(half, 0.0, -half),
        center + Vec3::new(half, 0.0, half),
        center + Vec3::new(-half, 0.0, half),
    ];
    (plane, polygon)
}

/// A downward tap at `(x, z)` from two units up.
pub fn tap_down(x: f32, z: f32) -> RaycastQuery {
    RaycastQuery {
        screen: Vec2::new(540.0, 960.0),
        ray: Ray::new(Vec3::new(x, 2.0, z), Vec3::NEG_Y),
    }
}
