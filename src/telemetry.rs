use crate::engine::schedule::{FrameProfile, Stage};
use crate::session::SessionStatus;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSample {
    pub stage: &'static str,
    pub total_ms: f32,
    pub systems: usize,
}

/// Per-frame summary of what the runtime did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameTelemetry {
    pub frame: u64,
    pub average_frame_time: f32,
    pub status: SessionStatus,
    pub searching_for_planes: bool,
    pub tracked_planes: usize,
    pub active_visuals: usize,
    pub hidden_visuals: usize,
    pub mesh_rebuilds: usize,
    pub teardowns: usize,
    pub placements: usize,
    pub point_count: usize,
    pub stage_samples: Vec<StageSample>,
}

impl FrameTelemetry {
    /// Fills `stage_samples` from the scheduler's last profile, in stage order.
    pub fn with_profile(mut self, profile: &FrameProfile) -> Self {
        self.stage_samples = Stage::ordered()
            .iter()
            .map(|stage| {
                let (total_ms, systems) = profile
                    .stage(*stage)
                    .map(|sample| (sample.total_ms(), sample.systems.len()))
                    .unwrap_or_default();
                StageSample {
                    stage: stage.label(),
                    total_ms,
                    systems,
                }
            })
            .collect();
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Default)]
pub struct TelemetrySurface {
    latest: Option<FrameTelemetry>,
    last_frame: Option<u64>,
}

impl TelemetrySurface {
    /// Stores `telemetry` as the latest sample. Returns true when it is for a new frame.
    pub fn record(&mut self, telemetry: FrameTelemetry) -> bool {
        let frame = telemetry.frame;
        let changed = self.last_frame.is_none_or(|last| last != frame);
        self.last_frame = Some(frame);
        self.latest = Some(telemetry);
        changed
    }

    pub fn latest(&self) -> Option<&FrameTelemetry> {
        self.latest.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(frame: u64) -> FrameTelemetry {
        FrameTelemetry {
            frame,
            average_frame_time: 0.016,
            status: SessionStatus::Tracking,
            searching_for_planes: false,
            tracked_planes: 2,
            active_visuals: 2,
            hidden_visuals: 0,
            mesh_rebuilds: 0,
            teardowns: 0,
            placements: 0,
            point_count: 0,
            stage_samples: Vec::new(),
        }
    }

    #[test]
    fn record_reports_new_frames_only() {
        let mut surface = TelemetrySurface::default();
        assert!(surface.record(sample(1)));
        assert!(!surface.record(sample(1)));
        assert!(surface.record(sample(2)));
        assert_eq!(surface.latest().map(|t| t.frame), Some(2));
    }

    #[test]
    fn json_lists_every_stage() {
        let telemetry = sample(4).with_profile(&FrameProfile::default());
        let json: serde_json::Value =
            serde_json::from_str(&telemetry.to_json().expect("encode")).expect("decode");

        assert_eq!(json["frame"], 4);
        assert_eq!(json["status"], "Tracking");
        let stages = json["stage_samples"].as_array().expect("stages");
        assert_eq!(stages.len(), Stage::count());
        assert_eq!(stages[0]["stage"], "Session");
    }
}
