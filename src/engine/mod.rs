pub mod schedule;

use crate::anchor::AnchorId;
use crate::config::{ArConfig, CollisionMatrix, LayerRegistry};
use crate::error::ArResult;
use crate::mesh::builder_for;
use crate::plane::{DetectedPlane, PlaneId, TrackableId};
use crate::pose::Pose;
use crate::raycast::{HitFlags, RaycastQuery};
use crate::scene::{NodeId, NodeKind, Scene, SceneNode};
use crate::session::{ApkAvailability, DeviceSession, Session, SessionStatus, TrackableQueryFilter};
use crate::telemetry::{FrameTelemetry, TelemetrySurface};
use crate::visual::{PlaneVisual, PointCloudVisual, VisualEvent, VisualSettings, VisualState};
use glam::{Mat3, Quat, Vec3};
use schedule::{Scheduler, Stage, System};
use std::time::Instant;

/// Below this the camera is treated as straight above or below the hit.
const FACING_EPSILON: f32 = 1e-6;

/// A tap waiting to be consumed by the next tracking frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInput {
    pub query: RaycastQuery,
    pub camera: Vec3,
}

/// Content placed by a touch, parented to an anchor node.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub anchor: AnchorId,
    pub node: NodeId,
    pub hit_pose: Pose,
    /// Hit rotation, turned about the hit's up axis to face the camera when the
    /// hit landed inside a plane polygon.
    pub content_rotation: Quat,
    pub trackable: Option<TrackableId>,
    pub frame: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameCounters {
    pub frame: u64,
    pub total_time: f32,
    pub average_frame_time: f32,
    pub tracking: bool,
    pub searching_for_planes: bool,
    pub spawned: usize,
    pub rebuilds: usize,
    pub teardowns: usize,
    pub active: usize,
    pub hidden: usize,
}

impl FrameCounters {
    fn begin_frame(&mut self) {
        self.spawned = 0;
        self.rebuilds = 0;
        self.teardowns = 0;
        self.active = 0;
        self.hidden = 0;
    }

    fn record(&mut self, event: VisualEvent) {
        match event {
            VisualEvent::Rebuilt => self.rebuilds += 1,
            VisualEvent::Destroyed { .. } => self.teardowns += 1,
            VisualEvent::Unchanged | VisualEvent::Hidden | VisualEvent::Idle => {}
        }
    }
}

/// Everything the per-frame systems read and write.
pub struct ArWorld {
    session: Session,
    scene: Scene,
    config: ArConfig,
    plane_layer: u8,
    new_planes: Vec<DetectedPlane>,
    all_planes: Vec<DetectedPlane>,
    pending_touch: Option<TouchInput>,
    counters: FrameCounters,
    placements: Vec<Placement>,
    point_cloud: NodeId,
}

impl ArWorld {
    /// Resolves the plane layer and starts the session. Both failures are fatal.
    pub fn new(
        config: ArConfig,
        layers: &LayerRegistry,
        device: Option<Box<dyn DeviceSession>>,
    ) -> ArResult<Self> {
        let plane_layer = layers.resolve(&config.plane_layer)?;
        let session = Session::start(&config, device)?;

        let mut scene = Scene::new();
        let point_cloud = scene.spawn(SceneNode::new(
            "PointCloud",
            NodeKind::PointCloud(PointCloudVisual::new(
                config.visualize_point_cloud,
                config.point_cloud_material.is_some(),
            )),
        ));

        Ok(Self {
            session,
            scene,
            config,
            plane_layer,
            new_planes: Vec::new(),
            all_planes: Vec::new(),
            pending_touch: None,
            counters: FrameCounters::default(),
            placements: Vec::new(),
            point_cloud,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &ArConfig {
        &self.config
    }

    pub fn plane_layer(&self) -> u8 {
        self.plane_layer
    }

    /// Planes first reported this frame. Overwritten every tracking frame.
    pub fn new_planes(&self) -> &[DetectedPlane] {
        &self.new_planes
    }

    /// Every plane the session reported this frame. Overwritten every tracking frame.
    pub fn all_planes(&self) -> &[DetectedPlane] {
        &self.all_planes
    }

    pub fn counters(&self) -> &FrameCounters {
        &self.counters
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn searching_for_planes(&self) -> bool {
        self.counters.searching_for_planes
    }

    pub fn plane_visual(&self, plane: PlaneId) -> Option<(NodeId, &PlaneVisual)> {
        self.scene
            .planes()
            .find(|(_, visual)| visual.plane_id() == Some(plane))
    }

    pub fn point_cloud(&self) -> Option<&PointCloudVisual> {
        self.scene.get(self.point_cloud)?.point_cloud()
    }

    fn spawn_plane_visual(&mut self, plane: &DetectedPlane) -> ArResult<NodeId> {
        let mut visual = PlaneVisual::new(
            builder_for(self.config.plane_style),
            VisualSettings::from_config(&self.config),
        );
        let event = visual.initialize(plane, &self.session)?;
        self.counters.record(event);

        let label = visual.builder_label();
        let transform = visual.transform();
        let mut node = SceneNode::new(format!("Plane {}", plane.id), NodeKind::Plane(visual));
        node.transform = transform;
        node.layer = self.plane_layer;
        node.tag = self.config.plane_tag.clone();

        let id = self.scene.spawn(node);
        self.counters.spawned += 1;
        log::info!(
            "[planes] spawned {label} visual for {} ({:?}) as {id}",
            plane.id,
            plane.direction()
        );
        Ok(id)
    }
}

/// Drives a session and its plane visuals one frame at a time.
pub struct ArRuntime {
    scheduler: Scheduler,
    world: ArWorld,
    telemetry: TelemetrySurface,
    collision_matrix: CollisionMatrix,
    target_frame_time: f32,
    max_frames: u32,
}

impl ArRuntime {
    pub fn new(
        config: ArConfig,
        layers: &LayerRegistry,
        device: Option<Box<dyn DeviceSession>>,
    ) -> ArResult<Self> {
        let target_frame_time = config.target_frame_time;
        let max_frames = config.max_frames.max(1);
        let allow_plane_collisions = config.allow_plane_collisions;
        let world = ArWorld::new(config, layers, device)?;

        let collision_matrix = if allow_plane_collisions {
            CollisionMatrix::default()
        } else {
            CollisionMatrix::isolate(world.plane_layer, layers)
        };

        let mut runtime = Self {
            scheduler: Scheduler::new(),
            world,
            telemetry: TelemetrySurface::default(),
            collision_matrix,
            target_frame_time,
            max_frames,
        };
        runtime.register_core_systems();
        log::info!(
            "[runtime] ready: {} session, plane layer {}",
            runtime.world.session.backend_label(),
            runtime.world.plane_layer
        );
        Ok(runtime)
    }

    pub fn add_system<S>(&mut self, stage: Stage, name: &'static str, system: S)
    where
        S: System + 'static,
    {
        self.scheduler.add_system(stage, name, system);
    }

    pub fn add_system_fn<F>(&mut self, stage: Stage, name: &'static str, func: F)
    where
        F: FnMut(&mut ArWorld, f32) -> ArResult<()> + Send + 'static,
    {
        self.scheduler.add_system_fn(stage, name, func);
    }

    pub fn configure_max_frames(&mut self, frames: u32) {
        self.max_frames = frames.max(1);
    }

    pub fn tick(&mut self, delta_seconds: f32) -> ArResult<()> {
        self.scheduler.tick(&mut self.world, delta_seconds)?;
        self.update_frame_diagnostics();
        Ok(())
    }

    /// Ticks `max_frames` times. Backend failures skip the frame; anything else stops the run.
    pub fn run(&mut self) -> ArResult<()> {
        let mut last_frame = Instant::now();
        for _ in 0..self.max_frames {
            let now = Instant::now();
            let raw_delta = now.duration_since(last_frame).as_secs_f32();
            let delta_seconds = if raw_delta == 0.0 {
                self.target_frame_time
            } else {
                raw_delta
            };
            last_frame = now;

            if let Err(err) = self.tick(delta_seconds) {
                if err.is_fatal() {
                    return Err(err);
                }
                log::error!("[runtime] frame failed: {err}");
            }
        }
        Ok(())
    }

    /// Queues a tap for the next tracking frame, replacing any unconsumed one.
    pub fn submit_touch(&mut self, query: RaycastQuery, camera: Vec3) {
        self.world.pending_touch = Some(TouchInput { query, camera });
    }

    /// No effect on live sessions.
    pub fn set_simulated_status(&mut self, status: SessionStatus) {
        self.world.session.set_status(status);
    }

    /// No effect on live sessions.
    pub fn set_simulated_apk_availability(&mut self, availability: ApkAvailability) {
        self.world.session.set_apk_availability(availability);
    }

    pub fn telemetry(&self) -> Option<&FrameTelemetry> {
        self.telemetry.latest()
    }

    pub fn world(&self) -> &ArWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut ArWorld {
        &mut self.world
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Layer pairs the host should stop colliding. Empty when plane collisions are allowed.
    pub fn collision_matrix(&self) -> &CollisionMatrix {
        &self.collision_matrix
    }

    pub fn shutdown(self) {
        log::info!(
            "[runtime] shutting down after {} frames with {} nodes",
            self.world.counters.frame,
            self.world.scene.len()
        );
        self.world.session.shutdown();
    }

    fn register_core_systems(&mut self) {
        self.add_system_fn(Stage::Session, "track_session", track_session);
        self.add_system_fn(Stage::Planes, "spawn_new_planes", spawn_new_planes);
        self.add_system_fn(Stage::Planes, "refresh_plane_search", refresh_plane_search);
        self.add_system_fn(Stage::Planes, "update_plane_visuals", update_plane_visuals);
        self.add_system_fn(Stage::Planes, "update_point_cloud", update_point_cloud);
        self.add_system_fn(Stage::Interaction, "refresh_anchors", refresh_anchors);
        self.add_system_fn(Stage::Interaction, "place_on_touch", place_on_touch);
        self.add_system_fn(Stage::Diagnostics, "frame_stats", frame_stats);
    }

    fn update_frame_diagnostics(&mut self) {
        let world = &self.world;
        let counters = &world.counters;
        let sample = FrameTelemetry {
            frame: counters.frame,
            average_frame_time: counters.average_frame_time,
            status: world.session.status(),
            searching_for_planes: counters.searching_for_planes,
            tracked_planes: world
                .all_planes
                .iter()
                .filter(|plane| plane.is_tracking())
                .count(),
            active_visuals: counters.active,
            hidden_visuals: counters.hidden,
            mesh_rebuilds: counters.rebuilds,
            teardowns: counters.teardowns,
            placements: world.placements.len(),
            point_count: world.point_cloud().map_or(0, PointCloudVisual::point_count),
            stage_samples: Vec::new(),
        }
        .with_profile(self.scheduler.last_profile());

        if self.telemetry.record(sample) {
            log::debug!("[runtime] frame {} telemetry recorded", counters.frame);
        }
    }
}

fn track_session(world: &mut ArWorld, _delta: f32) -> ArResult<()> {
    world.counters.begin_frame();
    let status = world.session.status();
    let tracking = status == SessionStatus::Tracking;
    if world.counters.tracking != tracking {
        log::info!("[session] status {status:?}");
    }
    world.counters.tracking = tracking;

    if !tracking {
        if world.session.is_valid() {
            world.counters.searching_for_planes = true;
        }
        if world.pending_touch.take().is_some() {
            log::debug!("[runtime] dropping touch while not tracking");
        }
    }
    Ok(())
}

fn spawn_new_planes(world: &mut ArWorld, _delta: f32) -> ArResult<()> {
    if !world.counters.tracking {
        return Ok(());
    }
    world
        .session
        .planes(TrackableQueryFilter::New, &mut world.new_planes);

    let planes = std::mem::take(&mut world.new_planes);
    let outcome = planes
        .iter()
        .try_for_each(|plane| world.spawn_plane_visual(plane).map(|_| ()));
    world.new_planes = planes;
    outcome
}

fn refresh_plane_search(world: &mut ArWorld, _delta: f32) -> ArResult<()> {
    if !world.counters.tracking {
        return Ok(());
    }
    world
        .session
        .planes(TrackableQueryFilter::All, &mut world.all_planes);
    world.counters.searching_for_planes = !world.all_planes.iter().any(DetectedPlane::is_tracking);
    Ok(())
}

fn update_plane_visuals(world: &mut ArWorld, _delta: f32) -> ArResult<()> {
    let ArWorld {
        session,
        scene,
        counters,
        ..
    } = world;

    let mut destroyed = Vec::new();
    for (id, node) in scene.iter_mut() {
        let Some(visual) = node.plane_mut() else {
            continue;
        };
        let event = visual.update(session)?;
        let state = visual.state();
        let transform = visual.transform();

        counters.record(event);
        match state {
            VisualState::Active => counters.active += 1,
            VisualState::Hidden => counters.hidden += 1,
            VisualState::Destroyed => destroyed.push(id),
            VisualState::Uninitialized => {}
        }
        node.transform = transform;
    }

    for id in destroyed {
        if let Some(node) = scene.despawn(id) {
            log::info!("[planes] despawned {} ({id})", node.name);
        }
    }
    Ok(())
}

fn update_point_cloud(world: &mut ArWorld, _delta: f32) -> ArResult<()> {
    let ArWorld {
        session,
        scene,
        point_cloud,
        ..
    } = world;
    let kind = scene.get_mut(*point_cloud).map(|node| &mut node.kind);
    if let Some(NodeKind::PointCloud(cloud)) = kind {
        cloud.update(session);
    }
    Ok(())
}

fn refresh_anchors(world: &mut ArWorld, _delta: f32) -> ArResult<()> {
    let ArWorld { session, scene, .. } = world;
    for (_, node) in scene.iter_mut() {
        if let NodeKind::Anchor(anchor) = &mut node.kind {
            session.refresh_anchor(anchor);
            node.transform = anchor.pose;
        }
    }
    Ok(())
}

fn place_on_touch(world: &mut ArWorld, _delta: f32) -> ArResult<()> {
    if !world.counters.tracking {
        return Ok(());
    }
    let Some(touch) = world.pending_touch.take() else {
        return Ok(());
    };

    let colliders = world.scene.colliders_on(world.plane_layer);
    let Some(hit) = world
        .session
        .raycast(&touch.query, HitFlags::PLACEMENT, &colliders)
    else {
        log::debug!("[runtime] touch at {:?} hit nothing", touch.query.screen);
        return Ok(());
    };

    let hit_pose = hit.pose();
    let anchor = world.session.create_anchor(hit.trackable(), hit_pose)?;
    let content_rotation = if hit.flags().intersects(HitFlags::PLANE_WITHIN_POLYGON) {
        facing_rotation(hit_pose, touch.camera)
    } else {
        hit_pose.rotation
    };

    let anchor_id = anchor.id();
    let mut node = SceneNode::new("Anchor", NodeKind::Anchor(anchor));
    node.transform = hit_pose;
    let node_id = world.scene.spawn(node);

    world.placements.push(Placement {
        anchor: anchor_id,
        node: node_id,
        hit_pose,
        content_rotation,
        trackable: hit.trackable(),
        frame: world.counters.frame + 1,
    });
    log::info!(
        "[runtime] placed content at {:?} on {node_id}",
        hit_pose.position
    );
    Ok(())
}

fn frame_stats(world: &mut ArWorld, delta: f32) -> ArResult<()> {
    let stats = &mut world.counters;
    stats.frame += 1;
    stats.total_time += delta;
    stats.average_frame_time = stats.total_time / stats.frame as f32;

    log::debug!(
        "[runtime] frame {} avg {:.4}s planes active {} hidden {} rebuilt {} torn down {}",
        stats.frame,
        stats.average_frame_time,
        stats.active,
        stats.hidden,
        stats.rebuilds,
        stats.teardowns
    );
    Ok(())
}

/// Turns `hit.rotation` about its own up axis so its forward points at the
/// camera, projected onto the horizontal plane.
pub fn facing_rotation(hit: Pose, camera: Vec3) -> Quat {
    let direction = (camera - hit.position).normalize_or_zero();
    let forward = direction - Vec3::Y * direction.dot(Vec3::Y);
    if forward.length_squared() < FACING_EPSILON {
        return hit.rotation;
    }
    let forward = forward.normalize();
    let right = Vec3::Y.cross(forward);
    hit.rotation * Quat::from_mat3(&Mat3::from_cols(right, Vec3::Y, forward))
}
