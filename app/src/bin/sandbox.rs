//! # Sandbox
//!
//! Headless demo scene: a ground plane, a pyramid of crates, falling balls,
//! a moving kinematic platform and two native scripts.

use quasar_app::{App, AppArgs, AppContext, AppHandler, DefaultAppArgs, FrameStats};
use quasar_core::math::Vec3;
use quasar_ecs::{Entity, FieldValue};
use quasar_scene::components::{
    BodyType, BoxCollider, Camera, MeshRenderer, PointLight, RigidBody, Script, SphereCollider,
    Transform,
};
use quasar_scene::{ScriptContext, ScriptError, ScriptHost, ScriptInstance};

// ---------------------------------------------------------------------------
// Native scripts
// ---------------------------------------------------------------------------

/// Spins the entity around Y.
struct Spinner {
    degrees_per_second: f32,
}

impl ScriptInstance for Spinner {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) -> Result<(), ScriptError> {
        let mut rotation = ctx.rotation();
        rotation.y = (rotation.y + self.degrees_per_second * dt) % 360.0;
        ctx.set_rotation(rotation);
        Ok(())
    }

    fn set_variable(&mut self, name: &str, value: &FieldValue) {
        if let ("speed", FieldValue::F32(speed)) = (name, value) {
            self.degrees_per_second = *speed;
        }
    }
}

/// Destroys the entity once it falls below `floor`.
struct Despawner {
    floor: f32,
}

impl ScriptInstance for Despawner {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, _dt: f32) -> Result<(), ScriptError> {
        if ctx.position().y < self.floor {
            log::info!("{} fell out of the world", ctx.name());
            let me = ctx.entity();
            ctx.destroy_entity(me);
        }
        Ok(())
    }
}

/// Drops a copy of its prefab every `interval` seconds.
struct Dropper {
    prefab: Option<Entity>,
    interval: f32,
    timer: f32,
}

impl ScriptInstance for Dropper {
    fn on_create(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        self.prefab = ctx.find_entity_by_name("Ball");
        if self.prefab.is_none() {
            return Err(ScriptError::Runtime {
                entity: ctx.entity(),
                message: "no entity named `Ball` to drop".to_string(),
            });
        }
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) -> Result<(), ScriptError> {
        self.timer += dt;
        if self.timer < self.interval {
            return Ok(());
        }
        self.timer = 0.0;
        let Some(copy) = self.prefab.and_then(|prefab| ctx.instantiate(prefab)) else {
            return Ok(());
        };
        let spawn = ctx.position();
        ctx.get_component_mut::<Transform>(copy).position = spawn;
        Ok(())
    }
}

struct NativeScripts;

impl ScriptHost for NativeScripts {
    fn name(&self) -> &str {
        "native"
    }

    fn instantiate(
        &mut self,
        _entity: Entity,
        script: &Script,
    ) -> Result<Option<Box<dyn ScriptInstance>>, ScriptError> {
        let instance: Box<dyn ScriptInstance> = match script.class_name.as_str() {
            "" => return Ok(None),
            "Spinner" => Box::new(Spinner {
                degrees_per_second: 90.0,
            }),
            "Despawner" => Box::new(Despawner { floor: -20.0 }),
            "Dropper" => Box::new(Dropper {
                prefab: None,
                interval: 1.0,
                timer: 0.0,
            }),
            other => return Err(ScriptError::UnknownClass(other.to_string())),
        };
        Ok(Some(instance))
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Sandbox {
    platform: Option<Entity>,
    crates: Vec<Entity>,
    last_stats: FrameStats,
}

impl Sandbox {
    fn spawn_body(
        ctx: &mut AppContext,
        name: &str,
        position: Vec3,
        body_type: BodyType,
        sphere: bool,
    ) -> Entity {
        let scene = ctx.scene_mut();
        let e = scene.create_entity(name);
        scene.get_component_mut::<Transform>(e).position = position;
        if sphere {
            scene.add_component(e, SphereCollider::new(0.5));
            scene.add_component(e, MeshRenderer::new("sphere", "rubber"));
        } else {
            scene.add_component(e, BoxCollider::default());
            scene.add_component(e, MeshRenderer::new("cube", "wood"));
        }
        scene.add_component(e, RigidBody::new(body_type));
        e
    }
}

impl AppHandler for Sandbox {
    fn on_init(&mut self, ctx: &mut AppContext) {
        ctx.scene_mut().register_script_host(Box::new(NativeScripts));

        let ground = Self::spawn_body(ctx, "Ground", Vec3::new(0.0, -0.5, 0.0), BodyType::Static, false);
        ctx.scene_mut().get_component_mut::<Transform>(ground).scale = Vec3::new(40.0, 1.0, 40.0);

        let layers = 5;
        let step = 1.05f32;
        for layer in 0..layers {
            let count = layers - layer;
            let offset = count as f32 * step / 2.0 - step / 2.0;
            for i in 0..count {
                let position = Vec3::new(i as f32 * step - offset, 0.5 + layer as f32 * step, 0.0);
                let e = Self::spawn_body(ctx, "Crate", position, BodyType::Dynamic, false);
                self.crates.push(e);
            }
        }

        let ball = Self::spawn_body(ctx, "Ball", Vec3::new(0.3, 12.0, 0.0), BodyType::Dynamic, true);
        ctx.scene_mut()
            .add_component(ball, Script::from_class("Despawner"));

        let platform = Self::spawn_body(ctx, "Platform", Vec3::new(-6.0, 1.0, 3.0), BodyType::Kinematic, false);
        ctx.scene_mut().get_component_mut::<Transform>(platform).scale = Vec3::new(3.0, 0.2, 3.0);
        ctx.scene_mut().add_component(
            platform,
            Script::from_class("Spinner").with_variable("speed", FieldValue::F32(45.0)),
        );
        self.platform = Some(platform);

        let scene = ctx.scene_mut();
        let spawner = scene.create_entity("Spawner");
        scene.get_component_mut::<Transform>(spawner).position = Vec3::new(0.0, 15.0, 0.0);
        scene.add_component(spawner, Script::from_class("Dropper"));

        let camera = scene.create_entity("Camera");
        scene.get_component_mut::<Transform>(camera).position = Vec3::new(0.0, 6.0, 18.0);
        scene.add_component(camera, Camera::default());

        let lamp = scene.create_entity("Lamp");
        scene.get_component_mut::<Transform>(lamp).position = Vec3::new(2.0, 8.0, 4.0);
        scene.add_component(
            lamp,
            PointLight {
                radius: 20.0,
                ..PointLight::default()
            },
        );
    }

    fn on_update(&mut self, ctx: &mut AppContext) -> bool {
        let t = ctx.elapsed_time();
        if let Some(platform) = self.platform {
            ctx.scene_mut().get_component_mut::<Transform>(platform).position.x = -6.0 + 3.0 * t.sin();
        }
        if ctx.frame_number() % 120 == 0 {
            let scene = ctx.scene();
            let resting = self
                .crates
                .iter()
                .filter(|&&e| scene.get_component::<RigidBody>(e).linear_velocity.norm() < 0.05)
                .count();
            log::info!(
                "t = {t:.2}s: {} entities, {} bodies, {resting}/{} crates at rest",
                scene.entity_count(),
                scene.physics().body_count(),
                self.crates.len()
            );
        }
        true
    }

    fn on_draw(&mut self, _ctx: &AppContext, stats: &FrameStats) {
        self.last_stats = stats.clone();
    }

    fn on_shutdown(&mut self, ctx: &mut AppContext) {
        let scene = ctx.scene();
        let top = self
            .crates
            .iter()
            .map(|&e| scene.get_component::<Transform>(e).position.y)
            .fold(f32::MIN, f32::max);
        log::info!(
            "Top crate at y = {top:.3}; last frame drew {} meshes with {} point lights",
            self.last_stats.draw_calls,
            self.last_stats.point_lights
        );
        match scene.save().to_ron() {
            Ok(text) => log::debug!("Final scene:\n{text}"),
            Err(err) => log::warn!("Could not serialize scene: {err}"),
        }
    }
}

fn main() {
    let args = DefaultAppArgs::parse();
    if let Err(err) = App::run(Sandbox::default(), args) {
        eprintln!("quasar-sandbox: {err}");
        std::process::exit(1);
    }
}
