use crate::plane::{PlaneId, TrackableId};
use crate::pose::Pose;
use crate::scene::NodeId;
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr};

const PARALLEL_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HitFlags(u32);

impl HitFlags {
    pub const NONE: HitFlags = HitFlags(0);
    pub const PLANE_WITHIN_POLYGON: HitFlags = HitFlags(1 << 0);
    pub const PLANE_WITHIN_BOUNDS: HitFlags = HitFlags(1 << 1);
    pub const PLANE_WITHIN_INFINITY: HitFlags = HitFlags(1 << 2);
    pub const FEATURE_POINT: HitFlags = HitFlags(1 << 3);
    pub const FEATURE_POINT_WITH_SURFACE_NORMAL: HitFlags = HitFlags(1 << 4);

    /// The filter the runtime uses for tap-to-place.
    pub const PLACEMENT: HitFlags =
        HitFlags(Self::PLANE_WITHIN_POLYGON.0 | Self::FEATURE_POINT_WITH_SURFACE_NORMAL.0);

    pub fn contains(self, other: HitFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn intersects(self, other: HitFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for HitFlags {
    type Output = HitFlags;

    fn bitor(self, rhs: HitFlags) -> HitFlags {
        HitFlags(self.0 | rhs.0)
    }
}

impl BitAnd for HitFlags {
    type Output = HitFlags;

    fn bitand(self, rhs: HitFlags) -> HitFlags {
        HitFlags(self.0 & rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Möller–Trumbore; hits from either side count.
    pub fn intersect_triangle(&self, [a, b, c]: [Vec3; 3]) -> Option<f32> {
        let edge_ab = b - a;
        let edge_ac = c - a;
        let p = self.direction.cross(edge_ac);
        let det = edge_ab.dot(p);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let t_vec = self.origin - a;
        let u = t_vec.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = t_vec.cross(edge_ab);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let distance = edge_ac.dot(q) * inv_det;
        (distance >= 0.0).then_some(distance)
    }
}

/// A tap on screen, with the world ray the host camera casts through it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastQuery {
    pub screen: Vec2,
    pub ray: Ray,
}

/// Hit against scene geometry, produced by simulated sessions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub node: NodeId,
    pub node_rotation: Quat,
    pub plane: Option<PlaneId>,
}

/// Hit reported by the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendHit {
    pub pose: Pose,
    pub distance: f32,
    pub flags: HitFlags,
    pub trackable: Option<TrackableId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RaycastHit {
    Geometric(GeometricHit),
    Backend(BackendHit),
}

impl RaycastHit {
    pub fn from_geometric(hit: GeometricHit) -> Self {
        RaycastHit::Geometric(hit)
    }

    pub fn from_backend(hit: BackendHit) -> Self {
        RaycastHit::Backend(hit)
    }

    /// Hit pose. Geometric hits keep the node's orientation tilted onto the hit normal.
    pub fn pose(&self) -> Pose {
        match self {
            RaycastHit::Geometric(hit) => {
                let node_up = hit.node_rotation * Vec3::Y;
                let tilt = Quat::from_rotation_arc(node_up, hit.normal);
                Pose::new(hit.point, tilt * hit.node_rotation)
            }
            RaycastHit::Backend(hit) => hit.pose,
        }
    }

    pub fn flags(&self) -> HitFlags {
        match self {
            RaycastHit::Geometric(_) => HitFlags::PLANE_WITHIN_POLYGON,
            RaycastHit::Backend(hit) => hit.flags,
        }
    }

    /// The trackable to anchor on. Geometric hits never carry one.
    pub fn trackable(&self) -> Option<TrackableId> {
        match self {
            RaycastHit::Geometric(_) => None,
            RaycastHit::Backend(hit) => hit.trackable,
        }
    }

    pub fn distance(&self) -> f32 {
        match self {
            RaycastHit::Geometric(hit) => hit.distance,
            RaycastHit::Backend(hit) => hit.distance,
        }
    }

    pub fn as_geometric(&self) -> Option<&GeometricHit> {
        match self {
            RaycastHit::Geometric(hit) => Some(hit),
            RaycastHit::Backend(_) => None,
        }
    }

    pub fn as_backend(&self) -> Option<&BackendHit> {
        match self {
            RaycastHit::Backend(hit) => Some(hit),
            RaycastHit::Geometric(_) => None,
        }
    }
}

/// Geometry a simulated session can raycast against.
pub trait ColliderSource {
    fn raycast_colliders(&self, ray: &Ray) -> Option<GeometricHit>;
}
