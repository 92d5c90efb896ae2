//! Headless frame loop.

use quasar_core::math::Mat4;
use quasar_ecs::Entity;
use quasar_scene::components::MeshRenderer;
use quasar_scene::{CameraView, PointLightData, RenderSink, Scene};

use crate::args::AppArgs;
use crate::config::{ConfigError, RuntimeConfig};
use crate::context::AppContext;
use crate::handler::AppHandler;

/// Draw statistics of one frame, collected in place of a renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub camera: Option<Entity>,
    pub draw_calls: usize,
    pub point_lights: usize,
}

impl RenderSink for FrameStats {
    fn begin_scene(&mut self, camera: Option<&CameraView>, point_lights: &[PointLightData]) {
        *self = Self {
            camera: camera.map(|c| c.entity),
            draw_calls: 0,
            point_lights: point_lights.len(),
        };
    }

    fn submit(&mut self, _entity: Entity, _transform: &Mat4, _mesh: &MeshRenderer) {
        self.draw_calls += 1;
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub frames: u64,
    pub elapsed_time: f32,
    pub entities: u32,
    pub last_frame: FrameStats,
}

/// Runs a scene frame by frame without a window.
///
/// # Example
///
/// ```ignore
/// use quasar_app::{App, AppArgs, DefaultAppArgs};
///
/// fn main() -> Result<(), quasar_app::ConfigError> {
///     let args = DefaultAppArgs::parse();
///     App::run(MyApp, args)?;
///     Ok(())
/// }
/// ```
pub struct App<H, A>
where
    H: AppHandler,
    A: AppArgs,
{
    handler: H,
    args: A,
    config: RuntimeConfig,
}

impl<H, A> App<H, A>
where
    H: AppHandler,
    A: AppArgs,
{
    pub fn new(handler: H, args: A, config: RuntimeConfig) -> Self {
        Self {
            handler,
            args,
            config,
        }
    }

    /// Loads the config, installs the logger and runs until the frame limit
    /// or until the handler stops.
    pub fn run(handler: H, args: A) -> Result<RunReport, ConfigError> {
        let config = match args.config_path() {
            Some(path) => RuntimeConfig::load(path)?,
            None => RuntimeConfig::default(),
        };

        let filter = args
            .log_filter()
            .or(config.log_filter.as_deref())
            .unwrap_or("info");
        // A logger may already be installed (tests, embedding hosts).
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
            .try_init();

        quasar_core::init();
        crate::init();

        let mut app = Self::new(handler, args, config);
        app.run_frames()
    }

    /// Runs the frame loop with the already loaded config.
    pub fn run_frames(&mut self) -> Result<RunReport, ConfigError> {
        let delta_time = self.args.timestep().unwrap_or(self.config.timestep);
        if !(delta_time > 0.0) || !delta_time.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "timestep must be positive, got {delta_time}"
            )));
        }
        let max_frames = self.args.max_frames().unwrap_or(self.config.frames);

        let scene = Scene::with_settings(self.args.scene_name(), self.config.scene.clone());
        let mut ctx = AppContext::new(scene, delta_time);
        self.handler.on_init(&mut ctx);
        ctx.scene.on_runtime_start();
        log::info!(
            "Running scene '{}' ({} entities, dt = {delta_time:.4}s)",
            ctx.scene.name(),
            ctx.scene.entity_count()
        );

        let mut stats = FrameStats::default();
        while max_frames == 0 || ctx.frame_number < max_frames {
            if !self.handler.on_update(&mut ctx) {
                log::info!("Handler requested exit at frame {}", ctx.frame_number);
                break;
            }
            ctx.scene.on_update(delta_time);
            ctx.scene.on_render(&mut stats);
            self.handler.on_draw(&ctx, &stats);

            ctx.frame_number += 1;
            ctx.elapsed_time += delta_time;
        }

        ctx.scene.on_runtime_stop();
        self.handler.on_shutdown(&mut ctx);
        log::info!(
            "Finished after {} frames ({:.2}s simulated)",
            ctx.frame_number,
            ctx.elapsed_time
        );

        Ok(RunReport {
            frames: ctx.frame_number,
            elapsed_time: ctx.elapsed_time,
            entities: ctx.scene.entity_count(),
            last_frame: stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::DefaultAppArgs;
    use quasar_core::math::Vec3;
    use quasar_scene::components::{BoxCollider, Camera, RigidBody, Transform};

    struct Dropper {
        body: Option<Entity>,
        stop_at: Option<u64>,
        draws: usize,
        shutdown_height: Option<f32>,
    }

    impl Dropper {
        fn new(stop_at: Option<u64>) -> Self {
            Self {
                body: None,
                stop_at,
                draws: 0,
                shutdown_height: None,
            }
        }
    }

    impl AppHandler for Dropper {
        fn on_init(&mut self, ctx: &mut AppContext) {
            let scene = ctx.scene_mut();
            let camera = scene.create_entity("Camera");
            scene.add_component(camera, Camera::default());
            let e = scene.create_entity("Crate");
            scene.get_component_mut::<Transform>(e).position = Vec3::new(0.0, 10.0, 0.0);
            scene.add_component(e, BoxCollider::default());
            scene.add_component(e, RigidBody::default());
            scene.add_component(e, MeshRenderer::new("cube", "default"));
            self.body = Some(e);
        }

        fn on_update(&mut self, ctx: &mut AppContext) -> bool {
            self.stop_at != Some(ctx.frame_number())
        }

        fn on_draw(&mut self, _ctx: &AppContext, stats: &FrameStats) {
            self.draws += stats.draw_calls;
        }

        fn on_shutdown(&mut self, ctx: &mut AppContext) {
            self.shutdown_height = self
                .body
                .map(|e| ctx.scene().get_component::<Transform>(e).position.y);
        }
    }

    #[test]
    fn runs_configured_number_of_frames() {
        let mut handler = Dropper::new(None);
        let args = DefaultAppArgs::default().with_max_frames(30);
        let mut app = App::new(&mut handler, args, RuntimeConfig::default());
        let report = app.run_frames().unwrap();

        assert_eq!(report.frames, 30);
        assert_eq!(report.entities, 2);
        assert_eq!(report.last_frame.draw_calls, 1);
        assert!(report.last_frame.camera.is_some());
        approx::assert_relative_eq!(report.elapsed_time, 0.5, epsilon = 1e-4);
        drop(app);

        assert_eq!(handler.draws, 30);
        assert!(handler.shutdown_height.unwrap() < 10.0);
    }

    #[test]
    fn handler_can_stop_early() {
        let args = DefaultAppArgs::default().with_max_frames(100);
        let mut app = App::new(Dropper::new(Some(5)), args, RuntimeConfig::default());
        let report = app.run_frames().unwrap();
        assert_eq!(report.frames, 5);
    }

    #[test]
    fn args_override_config_timestep() {
        let args = DefaultAppArgs::default()
            .with_max_frames(4)
            .with_timestep(0.25);
        let mut app = App::new(Dropper::new(None), args, RuntimeConfig::default());
        let report = app.run_frames().unwrap();
        approx::assert_relative_eq!(report.elapsed_time, 1.0);
    }
}
