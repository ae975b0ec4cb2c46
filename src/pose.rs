use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Builds a pose from Euler angles in degrees, applied Z first, then X, then Y.
    pub fn from_euler_degrees(position: Vec3, euler: [f32; 3]) -> Self {
        let [x, y, z] = euler;
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            y.to_radians(),
            x.to_radians(),
            z.to_radians(),
        );
        Self { position, rotation }
    }

    /// Euler angles in degrees, each normalized to [-180, 180].
    pub fn euler_degrees(&self) -> [f32; 3] {
        let (y, x, z) = self.rotation.to_euler(EulerRot::YXZ);
        [
            normalize_degrees(x.to_degrees()),
            normalize_degrees(y.to_degrees()),
            normalize_degrees(z.to_degrees()),
        ]
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}
