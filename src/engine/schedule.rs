use super::ArWorld;
use crate::error::ArResult;
use std::time::{Duration, Instant};

pub trait System: Send {
    fn run(&mut self, world: &mut ArWorld, delta_seconds: f32) -> ArResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Session status and search prompt.
    Session,
    /// Plane discovery and per-plane visual upkeep.
    Planes,
    /// Touch placement.
    Interaction,
    Diagnostics,
}

impl Stage {
    pub const fn ordered() -> [Stage; 4] {
        [
            Stage::Session,
            Stage::Planes,
            Stage::Interaction,
            Stage::Diagnostics,
        ]
    }

    pub const fn count() -> usize {
        4
    }

    pub fn index(self) -> usize {
        match self {
            Stage::Session => 0,
            Stage::Planes => 1,
            Stage::Interaction => 2,
            Stage::Diagnostics => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Session => "Session",
            Stage::Planes => "Planes",
            Stage::Interaction => "Interaction",
            Stage::Diagnostics => "Diagnostics",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameProfile {
    stages: Vec<StageProfile>,
}

impl FrameProfile {
    pub fn stages(&self) -> &[StageProfile] {
        &self.stages
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageProfile> {
        self.stages.iter().find(|profile| profile.stage == stage)
    }
}

#[derive(Debug, Clone)]
pub struct StageProfile {
    pub stage: Stage,
    pub total: Duration,
    pub systems: Vec<SystemProfile>,
}

impl StageProfile {
    pub fn total_ms(&self) -> f32 {
        self.total.as_secs_f64() as f32 * 1000.0
    }
}

#[derive(Debug, Clone)]
pub struct SystemProfile {
    pub name: &'static str,
    pub duration: Duration,
}

impl SystemProfile {
    pub fn duration_ms(&self) -> f32 {
        self.duration.as_secs_f64() as f32 * 1000.0
    }
}

const SLOW_SYSTEM_THRESHOLD_MS: f32 = 4.0;
const SLOW_STAGE_THRESHOLD_MS: f32 = 12.0;

struct SystemEntry {
    name: &'static str,
    system: Box<dyn System>,
}

struct StageBucket {
    stage: Stage,
    systems: Vec<SystemEntry>,
}

impl StageBucket {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            systems: Vec::new(),
        }
    }
}

/// Runs registered systems stage by stage, in registration order, on one thread.
pub struct Scheduler {
    buckets: [StageBucket; Stage::count()],
    last_profile: FrameProfile,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            buckets: Stage::ordered().map(StageBucket::new),
            last_profile: FrameProfile::default(),
        }
    }

    pub fn last_profile(&self) -> &FrameProfile {
        &self.last_profile
    }

    pub fn system_names(&self, stage: Stage) -> Vec<&'static str> {
        self.buckets[stage.index()]
            .systems
            .iter()
            .map(|entry| entry.name)
            .collect()
    }

    pub fn add_system<S>(&mut self, stage: Stage, name: &'static str, system: S)
    where
        S: System + 'static,
    {
        self.buckets[stage.index()].systems.push(SystemEntry {
            name,
            system: Box::new(system),
        });
    }

    pub fn add_system_fn<F>(&mut self, stage: Stage, name: &'static str, func: F)
    where
        F: FnMut(&mut ArWorld, f32) -> ArResult<()> + Send + 'static,
    {
        self.add_system(stage, name, FnSystem { func });
    }

    /// Runs one frame. The first failing system aborts the rest of the frame.
    pub fn tick(&mut self, world: &mut ArWorld, delta_seconds: f32) -> ArResult<()> {
        let mut frame_profile = FrameProfile::default();

        for bucket in &mut self.buckets {
            let stage_start = Instant::now();
            let mut system_profiles = Vec::with_capacity(bucket.systems.len());

            for entry in &mut bucket.systems {
                log::trace!("[scheduler::{:?}] running system {}", bucket.stage, entry.name);
                let system_start = Instant::now();
                let outcome = entry.system.run(world, delta_seconds);
                let duration = system_start.elapsed();
                system_profiles.push(SystemProfile {
                    name: entry.name,
                    duration,
                });

                if let Err(err) = outcome {
                    log::error!(
                        "[scheduler::{:?}] system {} failed: {err}",
                        bucket.stage,
                        entry.name
                    );
                    self.last_profile = frame_profile;
                    return Err(err);
                }

                if duration.as_secs_f32() * 1000.0 > SLOW_SYSTEM_THRESHOLD_MS {
                    log::warn!(
                        "[scheduler::{:?}] system {} took {:.3} ms",
                        bucket.stage,
                        entry.name,
                        duration.as_secs_f64() * 1000.0,
                    );
                }
            }

            let total = stage_start.elapsed();
            if total.as_secs_f32() * 1000.0 > SLOW_STAGE_THRESHOLD_MS {
                log::warn!(
                    "[scheduler::{:?}] stage took {:.3} ms",
                    bucket.stage,
                    total.as_secs_f64() * 1000.0
                );
            }

            frame_profile.stages.push(StageProfile {
                stage: bucket.stage,
                total,
                systems: system_profiles,
            });
        }

        self.last_profile = frame_profile;
        Ok(())
    }
}

struct FnSystem<F> {
    func: F,
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut ArWorld, f32) -> ArResult<()> + Send + 'static,
{
    fn run(&mut self, world: &mut ArWorld, delta_seconds: f32) -> ArResult<()> {
        (self.func)(world, delta_seconds)
    }
}
