use crate::pose::Pose;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rotation beyond which a plane no longer counts as level.
const VERTICAL_THRESHOLD_DEGREES: f32 = 45.0;

/// Stable identifier of a plane in the backend's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaneId(pub u64);

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plane#{}", self.0)
    }
}

/// Anything the device can bind an anchor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackableId {
    Plane(PlaneId),
    FeaturePoint(u64),
}

impl TrackableId {
    pub fn plane(self) -> Option<PlaneId> {
        match self {
            TrackableId::Plane(id) => Some(id),
            TrackableId::FeaturePoint(_) => None,
        }
    }
}

impl From<PlaneId> for TrackableId {
    fn from(id: PlaneId) -> Self {
        TrackableId::Plane(id)
    }
}

impl fmt::Display for TrackableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackableId::Plane(id) => id.fmt(f),
            TrackableId::FeaturePoint(id) => write!(f, "point#{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingState {
    Tracking,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneDirection {
    Horizontal,
    Vertical,
}

/// Snapshot of a planar surface as reported by the backend this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPlane {
    pub id: PlaneId,
    pub center_pose: Pose,
    pub extent_x: f32,
    pub extent_z: f32,
    pub tracking_state: TrackingState,
    /// The plane that replaced this one, if any. Only the subsuming plane should be rendered.
    pub subsumed_by: Option<PlaneId>,
}

impl DetectedPlane {
    /// A plane as synthesized by a simulated session: tracking, no extents, never subsumed.
    pub fn simulated(id: PlaneId, center_pose: Pose) -> Self {
        Self {
            id,
            center_pose,
            extent_x: 0.0,
            extent_z: 0.0,
            tracking_state: TrackingState::Tracking,
            subsumed_by: None,
        }
    }

    pub fn direction(&self) -> PlaneDirection {
        let [x, _, z] = self.center_pose.euler_degrees();
        if x.abs() > VERTICAL_THRESHOLD_DEGREES || z.abs() > VERTICAL_THRESHOLD_DEGREES {
            PlaneDirection::Vertical
        } else {
            PlaneDirection::Horizontal
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking_state == TrackingState::Tracking
    }

    pub fn is_subsumed(&self) -> bool {
        self.subsumed_by.is_some()
    }
}
