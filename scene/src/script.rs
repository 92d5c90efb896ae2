//! Script host contract.
//!
//! A [`ScriptHost`] turns a [`Script`] component into zero or one
//! [`ScriptInstance`]. Instances receive a [`ScriptContext`] in every
//! callback; the context borrows the scene's registry and physics world for
//! the duration of the call and queues structural changes in the scene's
//! [`CommandQueue`].

use std::any::TypeId;

use quasar_core::math::Vec3;
use quasar_ecs::{Entity, FieldValue, Registry};

use crate::commands::CommandQueue;
use crate::components::{AudioSource, RigidBody, Script, Tag, Transform};
use crate::error::{PhysicsError, ScriptError};
use crate::physics::{PhysicsWorld, RaycastHit};
use crate::scene::{clone_entity, spawn_entity};

/// Component types whose runtime side starts once the component is attached.
pub(crate) fn starts_runtime<T: 'static>() -> bool {
    let ty = TypeId::of::<T>();
    ty == TypeId::of::<Script>() || ty == TypeId::of::<AudioSource>()
}

/// Behavior attached to one entity.
pub trait ScriptInstance {
    fn on_create(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) -> Result<(), ScriptError> {
        Ok(())
    }

    fn on_destroy(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        Ok(())
    }

    /// Receives an authored variable before `on_create`.
    fn set_variable(&mut self, _name: &str, _value: &FieldValue) {}
}

/// Creates script instances for a scripting backend.
pub trait ScriptHost {
    fn name(&self) -> &str;

    /// Returns `Ok(None)` if this host does not handle `script`.
    fn instantiate(
        &mut self,
        entity: Entity,
        script: &Script,
    ) -> Result<Option<Box<dyn ScriptInstance>>, ScriptError>;
}

/// View of the scene handed to script callbacks, centered on one entity.
pub struct ScriptContext<'a> {
    entity: Entity,
    registry: &'a mut Registry,
    physics: &'a mut PhysicsWorld,
    commands: &'a mut CommandQueue,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        entity: Entity,
        registry: &'a mut Registry,
        physics: &'a mut PhysicsWorld,
        commands: &'a mut CommandQueue,
    ) -> Self {
        Self {
            entity,
            registry,
            physics,
            commands,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Read-only registry access for queries the accessors below do not
    /// cover. Structural changes go through [`destroy_entity`] and
    /// [`add_component`] so physics and audio resources stay paired with
    /// their components.
    ///
    /// [`destroy_entity`]: Self::destroy_entity
    /// [`add_component`]: Self::add_component
    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    // ---- Components ----

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

    /// Attaches a component. A new [`Script`] or [`AudioSource`] starts at
    /// the end of the frame; bodies and shapes are built on the next update.
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or already has a `T`.
    pub fn add_component<T: Send + Sync + 'static>(&mut self, entity: Entity, value: T) -> &mut T {
        if starts_runtime::<T>() {
            let component = self.registry.add_component(entity, value);
            self.commands.start(entity);
            component
        } else {
            self.registry.add_component(entity, value)
        }
    }

    // ---- Transform ----

    pub fn position(&self) -> Vec3 {
        self.transform().map(|t| t.position).unwrap_or_default()
    }

    pub fn set_position(&mut self, position: Vec3) {
        if let Some(t) = self.transform_mut() {
            t.position = position;
        }
    }

    /// Euler angles in degrees.
    pub fn rotation(&self) -> Vec3 {
        self.transform().map(|t| t.rotation).unwrap_or_default()
    }

    pub fn set_rotation(&mut self, degrees: Vec3) {
        if let Some(t) = self.transform_mut() {
            t.rotation = degrees;
        }
    }

    pub fn scale(&self) -> Vec3 {
        self.transform()
            .map(|t| t.scale)
            .unwrap_or_else(|| Vec3::new(1.0, 1.0, 1.0))
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        if let Some(t) = self.transform_mut() {
            t.scale = scale;
        }
    }

    fn transform(&self) -> Option<&Transform> {
        self.registry.try_get_component::<Transform>(self.entity)
    }

    fn transform_mut(&mut self) -> Option<&mut Transform> {
        self.registry.try_get_component_mut::<Transform>(self.entity)
    }

    // ---- Tag ----

    pub fn name(&self) -> &str {
        self.registry
            .try_get_component::<Tag>(self.entity)
            .map_or(Tag::DEFAULT_NAME, |tag| tag.name.as_str())
    }

    pub fn set_name(&mut self, name: &str) {
        if let Some(tag) = self.registry.try_get_component_mut::<Tag>(self.entity) {
            *tag = Tag::new(name);
        }
    }

    /// Checks for a reflected component by its type name (e.g. `"RigidBody"`).
    pub fn has_component(&self, component: &str) -> bool {
        self.registry.has_by_name(self.entity, component)
    }

    // ---- Physics ----

    pub fn apply_force(&mut self, force: Vec3) -> Result<(), PhysicsError> {
        self.physics.apply_force(self.registry, self.entity, force)
    }

    /// Simulated velocity when a body is installed, authored otherwise.
    pub fn linear_velocity(&self) -> Result<Vec3, PhysicsError> {
        let rb = self.rigid_body()?;
        if rb.is_registered() {
            self.physics.linear_velocity(self.registry, self.entity)
        } else {
            Ok(rb.linear_velocity)
        }
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) -> Result<(), PhysicsError> {
        if self.rigid_body()?.is_registered() {
            self.physics
                .set_linear_velocity(self.registry, self.entity, velocity)
        } else {
            self.registry.get_component_mut::<RigidBody>(self.entity).linear_velocity = velocity;
            Ok(())
        }
    }

    pub fn angular_velocity(&self) -> Result<Vec3, PhysicsError> {
        let rb = self.rigid_body()?;
        if rb.is_registered() {
            self.physics.angular_velocity(self.registry, self.entity)
        } else {
            Ok(rb.angular_velocity)
        }
    }

    pub fn set_angular_velocity(&mut self, velocity: Vec3) -> Result<(), PhysicsError> {
        if self.rigid_body()?.is_registered() {
            self.physics
                .set_angular_velocity(self.registry, self.entity, velocity)
        } else {
            self.registry.get_component_mut::<RigidBody>(self.entity).angular_velocity = velocity;
            Ok(())
        }
    }

    /// Authored mass.
    pub fn mass(&self) -> Result<f32, PhysicsError> {
        Ok(self.rigid_body()?.mass)
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<(), PhysicsError> {
        self.physics.set_mass(self.registry, self.entity, mass)
    }

    pub fn gravity(&self) -> Vec3 {
        self.physics.gravity()
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.physics.set_gravity(gravity);
    }

    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        self.physics.raycast(origin, direction, max_distance)
    }

    fn rigid_body(&self) -> Result<&RigidBody, PhysicsError> {
        self.registry
            .try_get_component::<RigidBody>(self.entity)
            .ok_or(PhysicsError::MissingComponent {
                entity: self.entity,
                component: "RigidBody",
            })
    }

    // ---- Scene ----

    pub fn find_entity_by_name(&self, name: &str) -> Option<Entity> {
        crate::scene::find_by_name(self.registry, name)
    }

    /// Creates an entity with a Transform and a Tag. It can be configured
    /// right away; its scripts start at the end of the frame.
    pub fn create_entity(&mut self, name: &str) -> Entity {
        let entity = spawn_entity(self.registry, name);
        self.commands.start(entity);
        entity
    }

    /// Queues `entity` for destruction at the end of the frame.
    pub fn destroy_entity(&mut self, entity: Entity) {
        self.commands.destroy(entity);
    }

    /// Clones `prefab`; the copy's scripts start at the end of the frame.
    pub fn instantiate(&mut self, prefab: Entity) -> Option<Entity> {
        let entity = clone_entity(self.registry, prefab)?;
        self.commands.start(entity);
        Some(entity)
    }
}
