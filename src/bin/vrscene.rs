use vrscene::{
    config::{SceneConfig, SpawnConfig},
    engine::{self, ControllerState, FrameInput, FramePose, Millis},
    game::{Entity, EntityId, Scene, Tracking},
    gfx::{self, DrawCall, RenderTarget, Renderer, Viewport},
    math::{self, Matrix4, Quaternion, Vector3},
    util::{self, BoxedError},
};

use log::LevelFilter;
use rand::{self, Rng};
use std::{
    collections::HashMap,
    env,
    time::{Duration, Instant},
};

/// Stands in for a GPU backend: remembers which buffer generations it has "uploaded" and
/// counts the work it was handed.
#[derive(Default)]
struct CountingTarget {
    uploaded: HashMap<EntityId, u32>,
    draws: usize,
    uploads: usize,
    triangles: usize,
    passes: usize,
}

impl CountingTarget {
    fn reset_stats(&mut self) {
        self.draws = 0;
        self.uploads = 0;
        self.triangles = 0;
        self.passes = 0;
    }
}

impl Renderer for CountingTarget {
    fn draw(&mut self, call: &DrawCall<'_>) {
        let generation = call.buffers.generation();
        if self.uploaded.insert(call.entity, generation) != Some(generation) {
            self.uploads += 1;
        }
        self.draws += 1;
        self.triangles += call.buffers.indices().len() / 3;
    }
}

impl RenderTarget for CountingTarget {
    fn set_viewport(&mut self, viewport: Viewport) {
        log::trace!("Viewport {:?}", viewport);
        self.passes += 1;
    }
}

fn build_scene(config: &SceneConfig) -> Scene {
    let mut scene = Scene::with_config(config);
    let root = scene.root();
    if let Some(root) = scene.get_mut(root) {
        root.set_position(config.scene_offset.into());
    }

    scene.spawn(
        Entity::target()
            .with_position((-2.0, 1.0, -4.0))
            .with_rotation(0.0, Vector3::up())
            .with_angular_rate(1.0)
            .with_tracking(Tracking::Entity),
    );
    scene.spawn(
        Entity::target()
            .with_position((2.0, 1.0, -4.0))
            .with_rotation(math::degrees(30.0), Vector3::new(1.0, 1.0, 0.0).normalized()),
    );
    scene.spawn(
        Entity::new()
            .with_scale((15.0, 0.0, 15.0))
            .with_face_colors(gfx::solid(gfx::GREEN)),
    );
    log::info!("Built scene with {} entities", scene.len());
    scene
}

fn sample_range<R: Rng>(rng: &mut R, [low, high]: [f32; 2]) -> f32 {
    if low < high {
        rng.gen_range(low..high)
    } else {
        low
    }
}

fn spawn_cube<R: Rng>(scene: &mut Scene, spawn: &SpawnConfig, rng: &mut R) -> EntityId {
    let position = Vector3::new(
        sample_range(rng, spawn.x_range),
        sample_range(rng, spawn.y_range),
        sample_range(rng, spawn.z_range),
    );
    let axis = Vector3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    )
    .normalized();
    let color = gfx::PALETTE[rng.gen_range(0..gfx::PALETTE.len())];
    scene.spawn(
        Entity::target()
            .with_position(position)
            .with_rotation(rng.gen_range(-1.0..1.0), axis)
            .with_acceleration((0.0, spawn.gravity, 0.0))
            .with_face_colors(gfx::solid(color)),
    )
}

/// A head slowly looking left and right.
fn head_pose(config: &SceneConfig, seconds: f32) -> FramePose {
    let projection = &config.projection;
    let aspect = (config.driver.width / 2) as f32 / config.driver.height.max(1) as f32;
    let eye = Matrix4::perspective(projection.fov, aspect, projection.near, projection.far);
    FramePose {
        orientation: Quaternion::from_axis_angle(Vector3::up(), (seconds * 0.5).sin() * 0.3),
        left_projection: eye,
        right_projection: eye,
    }
}

/// One controller sweeping across the cubes, trigger held for half of every two seconds.
fn frame_input(now: Millis, seconds: f32) -> FrameInput {
    let aim = Quaternion::from_axis_angle(Vector3::up(), seconds.sin() * 0.6);
    FrameInput::new(now).with_controller(
        ControllerState::connected()
            .with_orientation(aim)
            .with_trigger(now % 2000 < 500),
    )
}

fn main() -> Result<(), BoxedError> {
    env_logger::builder()
        .filter_level(LevelFilter::Error)
        .filter_module("vrscene", LevelFilter::Debug)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => SceneConfig::load_from_file(&path)?,
        None => SceneConfig::default(),
    };
    if config.driver.frame_rate == 0 {
        return util::boxed_err("frame_rate must be positive");
    }

    let driver = &config.driver;
    let dt = 1.0 / driver.frame_rate as f32;
    let frames_per_spawn = ((config.spawn.interval_secs * driver.frame_rate as f32).round() as u32).max(1);

    let mut rng = rand::thread_rng();
    let mut scene = build_scene(&config);
    let mut target = CountingTarget::default();
    let wall_clock = Instant::now();
    let mut stats_timer = Instant::now();

    for frame in 0..driver.frames {
        if driver.context_loss_frame == Some(frame) {
            log::info!("Render context lost at frame {}, rebuilding", frame);
            target = CountingTarget::default();
            scene = build_scene(&config);
        }

        let now = u64::from(frame) * 1000 / u64::from(driver.frame_rate);
        let seconds = frame as f32 * dt;

        if frame > 0 && frame % frames_per_spawn == 0 {
            spawn_cube(&mut scene, &config.spawn, &mut rng);
        }

        scene.update(dt, &frame_input(now, seconds));

        if driver.stereo {
            let pose = head_pose(&config, seconds);
            engine::render_stereo(&mut scene, &pose, &mut target, driver.width, driver.height);
        } else {
            engine::render_mono(&scene, &mut target, Viewport::full(driver.width, driver.height));
        }

        if (frame + 1) % driver.frame_rate == 0 {
            let flagged = scene
                .entities()
                .filter(|entity| entity.appearance().is_flagged())
                .count();
            log::info!(
                "t={:.1}s entities={} flagged={} passes={} draws={} uploads={} triangles={} ({:?} wall)",
                seconds + dt,
                scene.len(),
                flagged,
                target.passes,
                target.draws,
                target.uploads,
                target.triangles,
                stats_timer.elapsed(),
            );
            target.reset_stats();
            stats_timer = Instant::now();
        }
    }

    let elapsed = wall_clock.elapsed();
    log::info!(
        "Simulated {} frames in {:?} ({:.1} fps)",
        driver.frames,
        elapsed,
        driver.frames as f64 / elapsed.max(Duration::from_millis(1)).as_secs_f64()
    );
    Ok(())
}
