use crate::error::ConfigError;
use crate::session::{ApkAvailability, SessionMode, SessionStatus};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PLANE_LAYER: &str = "ArTrackedPlane";
pub const DEFAULT_PLANE_TAG: &str = "ArTrackedPlane";
pub const MAX_LAYERS: usize = 32;

const DEFAULT_MAX_FRAMES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneStyle {
    /// Triangulated boundary polygon, suitable for collision.
    Flat,
    /// Two-ring mesh fading out towards the boundary.
    Feathered,
}

/// Visualization and session settings, fixed for the lifetime of a runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    pub mode: SessionMode,
    /// Status reported by a simulated session until the host changes it.
    pub simulated_status: SessionStatus,
    /// Availability a simulated APK check resolves to.
    pub simulated_apk_availability: ApkAvailability,
    pub visualize_planes: bool,
    pub planes_cast_shadows: bool,
    pub planes_receive_shadows: bool,
    pub allow_plane_collisions: bool,
    pub plane_material: Option<String>,
    pub plane_style: PlaneStyle,
    pub visualize_point_cloud: bool,
    pub point_cloud_material: Option<String>,
    pub plane_layer: String,
    pub plane_tag: String,
    pub max_frames: u32,
    pub target_frame_time: f32,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::Simulated,
            simulated_status: SessionStatus::Tracking,
            simulated_apk_availability: ApkAvailability::SupportedInstalled,
            visualize_planes: true,
            planes_cast_shadows: false,
            planes_receive_shadows: true,
            allow_plane_collisions: false,
            plane_material: Some("plane_grid".to_string()),
            plane_style: PlaneStyle::Flat,
            visualize_point_cloud: true,
            point_cloud_material: Some("point_cloud".to_string()),
            plane_layer: DEFAULT_PLANE_LAYER.to_string(),
            plane_tag: DEFAULT_PLANE_TAG.to_string(),
            max_frames: DEFAULT_MAX_FRAMES,
            target_frame_time: 1.0 / 60.0,
        }
    }
}

impl ArConfig {
    pub fn simulated() -> Self {
        Self::default()
    }

    pub fn live() -> Self {
        Self {
            mode: SessionMode::Live,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}

/// Named collision/render layers, indexed 0..32.
#[derive(Debug, Clone)]
pub struct LayerRegistry {
    names: [Option<String>; MAX_LAYERS],
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self {
            names: std::array::from_fn(|_| None),
        }
    }
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in layers and the plane layer.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (index, name) in ["Default", "TransparentFX", "Ignore Raycast", "", "Water", "UI"]
            .iter()
            .enumerate()
        {
            if !name.is_empty() {
                registry.names[index] = Some((*name).to_string());
            }
        }
        registry.names[8] = Some(DEFAULT_PLANE_LAYER.to_string());
        registry
    }

    /// Registers `name` in the first free slot, returning its index.
    pub fn register(&mut self, name: &str) -> Result<u8, ConfigError> {
        if let Some(index) = self.index_of(name) {
            return Ok(index);
        }
        let slot = self
            .names
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| ConfigError::LayerRegistryFull(name.to_string()))?;
        self.names[slot] = Some(name.to_string());
        Ok(slot as u8)
    }

    pub fn index_of(&self, name: &str) -> Option<u8> {
        self.names
            .iter()
            .position(|entry| entry.as_deref() == Some(name))
            .map(|index| index as u8)
    }

    pub fn resolve(&self, name: &str) -> Result<u8, ConfigError> {
        self.index_of(name)
            .ok_or_else(|| ConfigError::LayerNotRegistered(name.to_string()))
    }

    pub fn name(&self, index: u8) -> Option<&str> {
        self.names.get(index as usize)?.as_deref()
    }

    pub fn named_layers(&self) -> impl Iterator<Item = (u8, &str)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| name.as_deref().map(|name| (index as u8, name)))
    }
}

/// Layer pairs the host physics engine should not collide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionMatrix {
    ignored: Vec<(u8, u8)>,
}

impl CollisionMatrix {
    /// Ignores collisions between `layer` and every named layer, itself included.
    pub fn isolate(layer: u8, registry: &LayerRegistry) -> Self {
        let ignored = registry
            .named_layers()
            .map(|(other, _)| ordered_pair(layer, other))
            .collect();
        Self { ignored }
    }

    pub fn ignores(&self, a: u8, b: u8) -> bool {
        self.ignored.contains(&ordered_pair(a, b))
    }

    pub fn ignored_pairs(&self) -> &[(u8, u8)] {
        &self.ignored
    }
}

fn ordered_pair(a: u8, b: u8) -> (u8, u8) {
    if a <= b { (a, b) } else { (b, a) }
}
