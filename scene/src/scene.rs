//! Scene orchestration: entity lifetime, runtime state and the frame loop.

use std::any::TypeId;
use std::collections::BTreeMap;

use log::{debug, error, info, warn};
use quasar_core::math::{Vec3, isometry_from_parts};
use quasar_ecs::{Entity, FieldMap, Registry};

use crate::audio::AudioEngine;
use crate::commands::CommandQueue;
use crate::components::{
    AudioListener, AudioSource, BoxCollider, Camera, MeshRenderer, PointLight, RigidBody, Script,
    SphereCollider, Tag, Transform, register_scene_components,
};
use crate::error::PhysicsError;
use crate::physics::{ColliderKind, PhysicsWorld, SyncDirection, sync};
use crate::render::{CameraView, PointLightData, RenderSink};
use crate::script::{ScriptContext, ScriptHost, ScriptInstance, starts_runtime};
use crate::settings::SceneSettings;
use crate::snapshot::{EntitySnapshot, SceneSnapshot};

/// Rounds of deferred commands applied per frame. Commands queued by the
/// last round wait for the next frame.
const MAX_COMMAND_ROUNDS: usize = 8;

/// A set of entities with their physics world and runtime state.
///
/// Every entity created through the scene has a [`Transform`] and a [`Tag`].
/// Handles from another scene are rejected with a panic.
///
/// # Frame order
///
/// [`on_update`](Self::on_update) runs script updates, registers or rebuilds
/// rigid bodies, steps the simulation, synchronizes poses, pushes audio
/// positions, applies deferred commands and advances the change tick.
pub struct Scene {
    name: String,
    settings: SceneSettings,
    registry: Registry,
    physics: PhysicsWorld,
    commands: CommandQueue,
    script_hosts: Vec<Box<dyn ScriptHost>>,
    scripts: BTreeMap<Entity, Vec<Box<dyn ScriptInstance>>>,
    audio: Option<Box<dyn AudioEngine>>,
    point_lights: Vec<PointLightData>,
    running: bool,
    /// Tick of the last completed frame; 0 before the first one.
    last_sync_tick: u64,
}

impl Scene {
    pub fn new(name: &str) -> Self {
        Self::with_settings(name, SceneSettings::default())
    }

    pub fn with_settings(name: &str, settings: SceneSettings) -> Self {
        let mut registry = Registry::new();
        register_scene_components(&mut registry);
        let physics = PhysicsWorld::new(&settings.physics);
        debug!("Scene '{name}' created");
        Self {
            name: name.to_string(),
            settings,
            registry,
            physics,
            commands: CommandQueue::new(),
            script_hosts: Vec::new(),
            scripts: BTreeMap::new(),
            audio: None,
            point_lights: Vec::new(),
            running: false,
            last_sync_tick: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    fn assert_owned(&self, entity: Entity) {
        assert_eq!(
            entity.owner(),
            self.registry.id(),
            "{entity} belongs to another scene"
        );
    }

    // ---- Entities ----

    /// Creates an entity with a default [`Transform`] and a [`Tag`].
    pub fn create_entity(&mut self, name: &str) -> Entity {
        spawn_entity(&mut self.registry, name)
    }

    /// Destroys an entity immediately.
    ///
    /// Script instances get `on_destroy` while the runtime is running; the
    /// body, collider shapes and audio source are released before the
    /// components are dropped. Returns `false` if the entity was dead.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.assert_owned(entity);
        if !self.registry.is_alive(entity) {
            return false;
        }
        self.stop_scripts(entity);
        if let Err(err) = self.physics.remove_rigid_body(&mut self.registry, entity) {
            debug!("{entity}: {err}");
        }
        if let Err(err) = self.physics.remove_collider(&mut self.registry, entity) {
            debug!("{entity}: {err}");
        }
        self.release_audio(entity);
        self.registry.destroy_entity(entity)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    pub fn entity_count(&self) -> u32 {
        self.registry.entity_count()
    }

    pub fn get_all_entities(&self) -> Vec<Entity> {
        self.registry.get_all_entities()
    }

    pub fn view<T: 'static>(&self) -> Vec<Entity> {
        self.registry.view::<T>()
    }

    /// First entity (in slot order) whose tag is `name`.
    pub fn find_entity_by_name(&self, name: &str) -> Option<Entity> {
        find_by_name(&self.registry, name)
    }

    /// Copies every reflected component of `prefab` onto a new entity named
    /// `"<name> (Clone)"`. Runtime handles are not copied; bodies and shapes
    /// are built on the next update.
    pub fn instantiate(&mut self, prefab: Entity) -> Option<Entity> {
        self.assert_owned(prefab);
        let entity = clone_entity(&mut self.registry, prefab)?;
        if self.running && !self.start_entity(entity) {
            self.fail_runtime();
        }
        Some(entity)
    }

    // ---- Components ----

    /// # Panics
    ///
    /// Panics if the entity is dead or already has a `T`.
    pub fn add_component<T: Send + Sync + 'static>(&mut self, entity: Entity, value: T) -> &mut T {
        self.assert_owned(entity);
        if self.running && starts_runtime::<T>() {
            let component = self.registry.add_component(entity, value);
            self.commands.start(entity);
            component
        } else {
            self.registry.add_component(entity, value)
        }
    }

    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        self.registry.has_component::<T>(entity)
    }

    /// # Panics
    ///
    /// Panics if the entity does not have a `T`.
    pub fn get_component<T: 'static>(&self, entity: Entity) -> &T {
        self.registry.get_component::<T>(entity)
    }

    /// # Panics
    ///
    /// Panics if the entity does not have a `T`.
    pub fn get_component_mut<T: 'static>(&mut self, entity: Entity) -> &mut T {
        self.registry.get_component_mut::<T>(entity)
    }

    pub fn try_get_component<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.registry.try_get_component::<T>(entity)
    }

    pub fn try_get_component_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.registry.try_get_component_mut::<T>(entity)
    }

    /// Detaches a component, releasing the engine resources it owns first.
    ///
    /// [`Transform`] and [`Tag`] cannot be removed; the call logs a warning
    /// and returns `None`.
    pub fn remove_component<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        self.assert_owned(entity);
        let ty = TypeId::of::<T>();
        if ty == TypeId::of::<Transform>() || ty == TypeId::of::<Tag>() {
            warn!(
                "{entity}: `{}` is required and cannot be removed",
                std::any::type_name::<T>()
            );
            return None;
        }
        if !self.registry.has_component::<T>(entity) {
            return None;
        }

        let released = if ty == TypeId::of::<RigidBody>() {
            self.physics.remove_rigid_body(&mut self.registry, entity)
        } else if ty == TypeId::of::<BoxCollider>() {
            self.physics.remove_box_collider(&mut self.registry, entity)
        } else if ty == TypeId::of::<SphereCollider>() {
            self.physics.remove_sphere_collider(&mut self.registry, entity)
        } else {
            Ok(())
        };
        if let Err(err) = released {
            debug!("{entity}: {err}");
        }
        if ty == TypeId::of::<Script>() {
            self.stop_scripts(entity);
        } else if ty == TypeId::of::<AudioSource>() {
            self.release_audio(entity);
        }
        self.registry.try_remove_component::<T>(entity)
    }

    // ---- Runtime ----

    pub fn register_script_host(&mut self, host: Box<dyn ScriptHost>) {
        debug!("Scene '{}': script host `{}` registered", self.name, host.name());
        self.script_hosts.push(host);
    }

    /// Installs the audio engine. Sources are created at runtime start, or
    /// when an AudioSource is added while running.
    pub fn set_audio_engine(&mut self, engine: Box<dyn AudioEngine>) {
        if self.running {
            warn!("Scene '{}': audio engine replaced while running", self.name);
        }
        self.audio = Some(engine);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of live script instances.
    pub fn script_instance_count(&self) -> usize {
        self.scripts.values().map(Vec::len).sum()
    }

    /// Instantiates scripts (calling `on_create`) and audio sources.
    pub fn on_runtime_start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        info!(
            "Scene '{}': runtime started with {} scripts and {} rigid bodies",
            self.name,
            self.registry.component_count::<Script>(),
            self.registry.component_count::<RigidBody>()
        );

        for entity in self.registry.view::<RigidBody>() {
            if ColliderKind::preferred(&self.registry, entity).is_none() {
                warn!("{entity}: RigidBody without BoxCollider or SphereCollider is not simulated");
            }
        }

        for entity in self.registry.get_all_entities() {
            if !self.start_entity(entity) {
                self.fail_runtime();
                return;
            }
        }
        self.apply_commands();
    }

    /// Calls `on_destroy` on every script instance, drops them and releases
    /// audio sources.
    pub fn on_runtime_stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        let scripts = std::mem::take(&mut self.scripts);
        for (entity, mut instances) in scripts {
            if !self.registry.is_alive(entity) {
                continue;
            }
            let mut ctx = ScriptContext::new(
                entity,
                &mut self.registry,
                &mut self.physics,
                &mut self.commands,
            );
            for instance in instances.iter_mut() {
                if let Err(err) = instance.on_destroy(&mut ctx) {
                    error!("{err}");
                }
            }
        }

        if let Some(audio) = self.audio.as_mut() {
            for entity in self.registry.view::<AudioSource>() {
                if let Some(id) = self.registry.get_component_mut::<AudioSource>(entity).source.take() {
                    audio.destroy_source(id);
                }
            }
        }

        self.apply_commands();
        info!("Scene '{}': runtime stopped", self.name);
    }

    fn fail_runtime(&mut self) {
        error!("Scene '{}': stopping runtime after script error", self.name);
        self.on_runtime_stop();
    }

    /// Advances the scene by `dt` seconds.
    pub fn on_update(&mut self, dt: f32) {
        if self.running && !self.update_scripts(dt) {
            self.fail_runtime();
        }
        self.register_bodies();
        self.physics.step(dt);
        self.sync_bodies();
        self.update_audio();
        self.apply_commands();

        self.last_sync_tick = self.registry.current_tick();
        self.registry.advance_tick();
    }

    /// Returns false if a script failed.
    fn update_scripts(&mut self, dt: f32) -> bool {
        for (entity, instances) in self.scripts.iter_mut() {
            if !self.registry.is_alive(*entity) {
                continue;
            }
            let mut ctx = ScriptContext::new(
                *entity,
                &mut self.registry,
                &mut self.physics,
                &mut self.commands,
            );
            for instance in instances.iter_mut() {
                if let Err(err) = instance.on_update(&mut ctx, dt) {
                    error!("{err}");
                    return false;
                }
            }
        }
        true
    }

    /// Installs missing bodies, rebuilds bodies whose settings or collider
    /// kind changed, and refreshes shapes whose size or scale drifted.
    fn register_bodies(&mut self) {
        for entity in self.registry.view::<RigidBody>() {
            if !self.registry.has_component::<Transform>(entity) {
                continue;
            }
            let Some(kind) = ColliderKind::preferred(&self.registry, entity) else {
                continue;
            };

            if sync::body_needs_rebuild(&self.registry, entity) {
                debug!("{entity}: rebuilding rigid body");
                if let Err(err) = self.physics.remove_rigid_body(&mut self.registry, entity) {
                    warn!("{err}");
                    continue;
                }
            }

            let result = if self.registry.get_component::<RigidBody>(entity).is_registered() {
                self.refresh_shape(entity, kind)
            } else {
                self.physics
                    .create_rigid_body_for_entity(&mut self.registry, entity)
            };
            if let Err(err) = result {
                warn!("{err}");
            }
        }
    }

    fn refresh_shape(&mut self, entity: Entity, kind: ColliderKind) -> Result<(), PhysicsError> {
        let scale = self.registry.get_component::<Transform>(entity).scale;
        match kind {
            ColliderKind::Box
                if self
                    .registry
                    .get_component::<BoxCollider>(entity)
                    .needs_rebuild(&scale) =>
            {
                self.physics.add_box_collider(&mut self.registry, entity)
            }
            ColliderKind::Sphere
                if self
                    .registry
                    .get_component::<SphereCollider>(entity)
                    .needs_rebuild(&scale) =>
            {
                self.physics.add_sphere_collider(&mut self.registry, entity)
            }
            _ => Ok(()),
        }
    }

    fn sync_bodies(&mut self) {
        let since = self.last_sync_tick;
        for entity in self.registry.view::<RigidBody>() {
            let Some(direction) = sync::direction_of(&self.registry, entity) else {
                continue;
            };
            if direction == SyncDirection::AuthoringToSimulation
                && !sync::authoring_changed_since(&self.registry, entity, since)
            {
                continue;
            }
            if let Err(err) = self.physics.sync(&mut self.registry, entity, direction) {
                warn!("{err}");
            }
        }
    }

    fn update_audio(&mut self) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        let registry = &self.registry;

        let listener = registry
            .view::<AudioListener>()
            .into_iter()
            .find(|&e| registry.get_component::<AudioListener>(e).active);
        if let Some(transform) = listener.and_then(|e| registry.try_get_component::<Transform>(e)) {
            let rotation = transform.rotation_quat();
            audio.set_listener_pose(
                transform.position,
                rotation * -Vec3::z(),
                rotation * Vec3::y(),
            );
        }

        for entity in registry.view::<AudioSource>() {
            let Some(id) = registry.get_component::<AudioSource>(entity).source else {
                continue;
            };
            if let Some(transform) = registry.try_get_component::<Transform>(entity) {
                audio.set_source_position(id, transform.position);
            }
        }
    }

    /// Applies queued destroys, then starts scripts of queued entities.
    fn apply_commands(&mut self) {
        for _ in 0..MAX_COMMAND_ROUNDS {
            if self.commands.is_empty() {
                return;
            }
            let (destroys, starts) = self.commands.drain();
            for entity in destroys {
                if self.registry.is_alive(entity) {
                    self.destroy_entity(entity);
                }
            }
            if !self.running {
                continue;
            }
            for entity in starts {
                if self.registry.is_alive(entity) && !self.start_entity(entity) {
                    self.fail_runtime();
                    return;
                }
            }
        }
        if !self.commands.is_empty() {
            debug!(
                "Scene '{}': {} commands deferred to the next frame",
                self.name,
                self.commands.len()
            );
        }
    }

    /// Returns false if a script failed in `on_create`.
    fn start_entity(&mut self, entity: Entity) -> bool {
        self.start_audio(entity);
        self.start_scripts(entity)
    }

    fn start_scripts(&mut self, entity: Entity) -> bool {
        if self.scripts.contains_key(&entity) {
            return true;
        }
        let Some(script) = self.registry.try_get_component::<Script>(entity).cloned() else {
            return true;
        };
        if script.class_name.is_empty() && script.script_paths.is_empty() {
            return true;
        }

        let mut instances = Vec::new();
        for host in self.script_hosts.iter_mut() {
            match host.instantiate(entity, &script) {
                Ok(Some(mut instance)) => {
                    for (name, value) in &script.variables {
                        instance.set_variable(name, value);
                    }
                    instances.push(instance);
                }
                Ok(None) => {}
                Err(err) => warn!("{entity}: {err}"),
            }
        }
        if instances.is_empty() {
            warn!("{entity}: no script host accepted its Script component");
            return true;
        }
        debug!("{entity}: {} script instance(s) created", instances.len());

        let mut ok = true;
        let mut ctx = ScriptContext::new(
            entity,
            &mut self.registry,
            &mut self.physics,
            &mut self.commands,
        );
        for instance in instances.iter_mut() {
            if let Err(err) = instance.on_create(&mut ctx) {
                error!("{err}");
                ok = false;
                break;
            }
        }
        self.scripts.insert(entity, instances);
        ok
    }

    /// Calls `on_destroy` and drops the entity's script instances.
    fn stop_scripts(&mut self, entity: Entity) {
        let Some(mut instances) = self.scripts.remove(&entity) else {
            return;
        };
        let mut ctx = ScriptContext::new(
            entity,
            &mut self.registry,
            &mut self.physics,
            &mut self.commands,
        );
        for instance in instances.iter_mut() {
            if let Err(err) = instance.on_destroy(&mut ctx) {
                error!("{err}");
            }
        }
    }

    fn start_audio(&mut self, entity: Entity) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        let Some(source) = self.registry.try_get_component::<AudioSource>(entity) else {
            return;
        };
        if source.source.is_some() {
            return;
        }
        let Some(id) = audio.create_source(source) else {
            warn!("{entity}: audio clip `{}` could not be loaded", source.clip);
            return;
        };
        let play = source.play_on_awake;
        self.registry.get_component_mut::<AudioSource>(entity).source = Some(id);
        if play {
            audio.play(id);
        }
    }

    fn release_audio(&mut self, entity: Entity) {
        let Some(audio) = self.audio.as_mut() else {
            return;
        };
        let id = self
            .registry
            .try_get_component_mut::<AudioSource>(entity)
            .and_then(|source| source.source.take());
        if let Some(id) = id {
            audio.destroy_source(id);
        }
    }

    // ---- Rendering ----

    /// Refreshes the point-light list and submits every drawable mesh.
    pub fn on_render(&mut self, sink: &mut dyn RenderSink) {
        self.refresh_point_lights();
        let camera = self.primary_camera().and_then(|e| self.camera_view(e));
        sink.begin_scene(camera.as_ref(), &self.point_lights);

        for entity in self.registry.view::<MeshRenderer>() {
            let mesh = self.registry.get_component::<MeshRenderer>(entity);
            if !mesh.is_drawable() {
                continue;
            }
            if let Some(transform) = self.registry.try_get_component::<Transform>(entity) {
                sink.submit(entity, &transform.matrix(), mesh);
            }
        }
        sink.end_scene();
    }

    /// Point lights as of the last [`on_render`](Self::on_render).
    pub fn point_lights(&self) -> &[PointLightData] {
        &self.point_lights
    }

    fn refresh_point_lights(&mut self) {
        self.point_lights.clear();
        for entity in self.registry.view::<PointLight>() {
            let Some(transform) = self.registry.try_get_component::<Transform>(entity) else {
                continue;
            };
            let light = self.registry.get_component::<PointLight>(entity);
            self.point_lights.push(PointLightData {
                entity,
                position: transform.position,
                color: light.color,
                intensity: light.intensity,
                radius: light.radius,
            });
        }
    }

    /// First entity (in slot order) with a primary camera.
    pub fn primary_camera(&self) -> Option<Entity> {
        self.registry.get_all_entities().into_iter().find(|&e| {
            self.registry
                .try_get_component::<Camera>(e)
                .is_some_and(|camera| camera.primary)
        })
    }

    pub fn camera_view(&self, entity: Entity) -> Option<CameraView> {
        let camera = self.registry.try_get_component::<Camera>(entity)?;
        let transform = self.registry.try_get_component::<Transform>(entity)?;
        let pose = isometry_from_parts(transform.position, transform.rotation_quat());
        Some(CameraView {
            entity,
            position: transform.position,
            view: pose.inverse().to_homogeneous(),
            camera: camera.clone(),
        })
    }

    // ---- Snapshots ----

    pub fn save_entity(&self, entity: Entity) -> EntitySnapshot {
        self.assert_owned(entity);
        EntitySnapshot {
            components: save_components(&self.registry, entity)
                .into_iter()
                .map(|(name, fields)| (name.to_string(), fields))
                .collect(),
        }
    }

    pub fn save(&self) -> SceneSnapshot {
        SceneSnapshot {
            name: self.name.clone(),
            settings: self.settings.clone(),
            entities: self
                .registry
                .get_all_entities()
                .into_iter()
                .map(|entity| self.save_entity(entity))
                .collect(),
        }
    }

    /// Builds a scene from a snapshot. Bodies and shapes are created on the
    /// first update.
    pub fn load(snapshot: &SceneSnapshot) -> Self {
        let mut scene = Self::with_settings(&snapshot.name, snapshot.settings.clone());
        for data in &snapshot.entities {
            let entity = scene.create_entity("");
            for (name, fields) in &data.components {
                match scene.registry.restore_by_name(entity, name, fields) {
                    Ok(true) => {}
                    Ok(false) => warn!(
                        "Scene '{}': unknown component `{name}` skipped",
                        snapshot.name
                    ),
                    Err(err) => warn!("{entity}: {err}"),
                }
            }
        }
        debug!(
            "Scene '{}' loaded with {} entities",
            snapshot.name,
            snapshot.entities.len()
        );
        scene
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.on_runtime_stop();
    }
}

// ---------------------------------------------------------------------------
// Registry helpers shared with ScriptContext
// ---------------------------------------------------------------------------

pub(crate) fn spawn_entity(registry: &mut Registry, name: &str) -> Entity {
    let entity = registry.create_entity();
    registry.add_component(entity, Transform::default());
    registry.add_component(entity, Tag::new(name));
    entity
}

pub(crate) fn clone_entity(registry: &mut Registry, prefab: Entity) -> Option<Entity> {
    if !registry.is_alive(prefab) {
        warn!("Cannot instantiate {prefab}: entity is not alive");
        return None;
    }
    let saved = save_components(registry, prefab);
    let entity = spawn_entity(registry, "");
    for (name, fields) in &saved {
        if let Err(err) = registry.restore_by_name(entity, name, fields) {
            warn!("{entity}: {err}");
        }
    }
    let tag = registry.get_component_mut::<Tag>(entity);
    tag.name = format!("{} (Clone)", tag.name);
    Some(entity)
}

pub(crate) fn find_by_name(registry: &Registry, name: &str) -> Option<Entity> {
    registry.get_all_entities().into_iter().find(|&e| {
        registry
            .try_get_component::<Tag>(e)
            .is_some_and(|tag| tag.name == name)
    })
}

fn save_components(registry: &Registry, entity: Entity) -> Vec<(&'static str, FieldMap)> {
    registry
        .reflected_components_of(entity)
        .into_iter()
        .filter_map(|name| registry.save_by_name(entity, name).map(|fields| (name, fields)))
        .collect()
}
