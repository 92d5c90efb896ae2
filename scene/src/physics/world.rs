//! Rigid-body simulation owned by a scene.
//!
//! Wraps the rapier3d pipeline and a slot-map arena of collision shapes.
//! Every operation addresses entities through the scene's [`Registry`]:
//! shapes and bodies are created from authoring components and their handles
//! are stored back into those components.

use log::{debug, warn};
use quasar_core::math::{Isometry3, Vec3};
use quasar_ecs::{Entity, Registry};
use rapier3d::prelude::{
    Ball, CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    QueryFilter, QueryPipeline, Ray, RigidBodyBuilder, RigidBodySet, SharedShape,
};
use slotmap::SlotMap;

use super::conversions::{authoring_pose, body_pose};
use super::handles::{BodyHandle, BodySettings, ColliderKind, ShapeHandle, ShapeKey};
use super::shapes::{box_half_extents, clamp_scale, sphere_radius};
use crate::components::{BodyType, BoxCollider, RigidBody, SphereCollider, Transform};
use crate::error::PhysicsError;
use crate::settings::PhysicsSettings;

/// Mass used for dynamic bodies authored with a non-positive mass.
pub const MIN_DYNAMIC_MASS: f32 = 1.0e-3;

/// Closest hit of a ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// rapier state. Fields drop in declaration order: pipeline first,
/// integration parameters last.
struct Simulation {
    pipeline: PhysicsPipeline,
    query_pipeline: QueryPipeline,
    ccd_solver: CCDSolver,
    multibody_joints: MultibodyJointSet,
    impulse_joints: ImpulseJointSet,
    colliders: ColliderSet,
    bodies: RigidBodySet,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    integration_parameters: IntegrationParameters,
}

impl Simulation {
    fn new(fixed_timestep: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: fixed_timestep,
            ..IntegrationParameters::default()
        };
        let narrow_phase = NarrowPhase::new();
        let broad_phase = DefaultBroadPhase::new();
        let islands = IslandManager::new();
        let bodies = RigidBodySet::new();
        let colliders = ColliderSet::new();
        let impulse_joints = ImpulseJointSet::new();
        let multibody_joints = MultibodyJointSet::new();
        let ccd_solver = CCDSolver::new();
        let query_pipeline = QueryPipeline::new();
        let pipeline = PhysicsPipeline::new();
        Self {
            pipeline,
            query_pipeline,
            ccd_solver,
            multibody_joints,
            impulse_joints,
            colliders,
            bodies,
            islands,
            broad_phase,
            narrow_phase,
            integration_parameters,
        }
    }

    fn step(&mut self, gravity: &Vec3) {
        self.pipeline.step(
            gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}

/// Rigid-body world of a scene.
///
/// Created initialized; [`shutdown`](Self::shutdown) (also run on drop)
/// releases every collider, body and shape. After shutdown all operations
/// are logged no-ops returning [`PhysicsError::NotInitialized`].
///
/// # Example
///
/// ```
/// use quasar_ecs::Registry;
/// use quasar_scene::components::{BoxCollider, RigidBody, Transform};
/// use quasar_scene::physics::PhysicsWorld;
/// use quasar_scene::settings::PhysicsSettings;
///
/// let mut registry = Registry::new();
/// let mut physics = PhysicsWorld::new(&PhysicsSettings::default());
///
/// let crate_entity = registry.create_entity();
/// registry.add_component(crate_entity, Transform::default());
/// registry.add_component(crate_entity, BoxCollider::default());
/// registry.add_component(crate_entity, RigidBody::default());
///
/// physics.create_rigid_body_for_entity(&mut registry, crate_entity).unwrap();
/// physics.step(1.0 / 60.0);
/// physics.sync_transform_from_physics(&mut registry, crate_entity).unwrap();
/// assert!(registry.get_component::<Transform>(crate_entity).position.y < 0.0);
/// ```
pub struct PhysicsWorld {
    settings: PhysicsSettings,
    gravity: Vec3,
    accumulator: f32,
    sim: Option<Simulation>,
    shapes: SlotMap<ShapeKey, SharedShape>,
    shape_rebuilds: u64,
}

impl PhysicsWorld {
    pub fn new(settings: &PhysicsSettings) -> Self {
        let mut settings = settings.clone();
        if !(settings.fixed_timestep > 0.0) {
            warn!(
                "Invalid fixed timestep {}, using the default",
                settings.fixed_timestep
            );
            settings.fixed_timestep = PhysicsSettings::default().fixed_timestep;
        }
        if settings.max_substeps == 0 {
            warn!("max_substeps is 0, physics would never advance; using 1");
            settings.max_substeps = 1;
        }

        let gravity = settings.gravity_vector();
        let sim = Simulation::new(settings.fixed_timestep);
        debug!(
            "Physics world initialized (dt = {:.4}s, gravity = {:?})",
            settings.fixed_timestep, settings.gravity
        );
        Self {
            settings,
            gravity,
            accumulator: 0.0,
            sim: Some(sim),
            shapes: SlotMap::with_key(),
            shape_rebuilds: 0,
        }
    }

    /// Releases every collider, body and shape, then the pipeline.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        let Some(mut sim) = self.sim.take() else {
            return;
        };

        let colliders: Vec<_> = sim.colliders.iter().map(|(h, _)| h).collect();
        for handle in colliders {
            sim.colliders
                .remove(handle, &mut sim.islands, &mut sim.bodies, false);
        }
        let bodies: Vec<_> = sim.bodies.iter().map(|(h, _)| h).collect();
        for handle in bodies {
            sim.bodies.remove(
                handle,
                &mut sim.islands,
                &mut sim.colliders,
                &mut sim.impulse_joints,
                &mut sim.multibody_joints,
                false,
            );
        }
        self.shapes.clear();
        drop(sim);
        self.accumulator = 0.0;
        debug!("Physics world shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.sim.is_some()
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    fn sim(&self) -> Result<&Simulation, PhysicsError> {
        match &self.sim {
            Some(sim) => Ok(sim),
            None => {
                warn!("Physics world used after shutdown");
                Err(PhysicsError::NotInitialized)
            }
        }
    }

    fn sim_mut(&mut self) -> Result<&mut Simulation, PhysicsError> {
        match &mut self.sim {
            Some(sim) => Ok(sim),
            None => {
                warn!("Physics world used after shutdown");
                Err(PhysicsError::NotInitialized)
            }
        }
    }

    // ---- Stepping ----

    /// Advances the simulation by `dt` seconds in fixed sub-steps.
    ///
    /// Runs at most `max_substeps` sub-steps; time beyond that is dropped.
    /// Forces applied since the previous call are cleared afterward.
    /// Returns the number of sub-steps taken.
    pub fn step(&mut self, dt: f32) -> u32 {
        if !(dt > 0.0) || !dt.is_finite() {
            return 0;
        }
        let Some(sim) = self.sim.as_mut() else {
            warn!("Physics world used after shutdown");
            return 0;
        };

        let fixed = self.settings.fixed_timestep;
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= fixed && substeps < self.settings.max_substeps {
            sim.step(&self.gravity);
            self.accumulator -= fixed;
            substeps += 1;
        }
        if self.accumulator >= fixed {
            debug!("Physics is behind, dropping {:.4}s", self.accumulator);
            self.accumulator = 0.0;
        }

        for (_, body) in sim.bodies.iter_mut() {
            body.reset_forces(false);
        }
        substeps
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
        if let Some(sim) = self.sim.as_mut() {
            for (_, body) in sim.bodies.iter_mut() {
                body.wake_up(false);
            }
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    // ---- Colliders ----

    /// Builds (or rebuilds) the entity's box shape from `size × scale`.
    ///
    /// If a body is installed with this collider, the new shape replaces the
    /// old one on the body.
    pub fn add_box_collider(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        self.build_shape(registry, entity, ColliderKind::Box)
    }

    /// Builds (or rebuilds) the entity's sphere shape from
    /// `radius × max(|scale|)`.
    pub fn add_sphere_collider(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        self.build_shape(registry, entity, ColliderKind::Sphere)
    }

    /// Frees both collider shapes of the entity. An installed body is removed
    /// first.
    pub fn remove_collider(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        self.remove_shape(registry, entity, ColliderKind::Box)?;
        self.remove_shape(registry, entity, ColliderKind::Sphere)
    }

    pub fn remove_box_collider(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        self.remove_shape(registry, entity, ColliderKind::Box)
    }

    pub fn remove_sphere_collider(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        self.remove_shape(registry, entity, ColliderKind::Sphere)
    }

    fn build_shape(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
        kind: ColliderKind,
    ) -> Result<(), PhysicsError> {
        self.sim()?;
        let raw_scale = registry
            .try_get_component::<Transform>(entity)
            .map(|t| t.scale)
            .ok_or(PhysicsError::MissingComponent {
                entity,
                component: "Transform",
            })?;
        let (scale, clamped) = clamp_scale(&raw_scale);
        if clamped {
            warn!("{entity}: degenerate scale {raw_scale:?} clamped to {scale:?}");
        }

        let (shape, old) = match kind {
            ColliderKind::Box => {
                let collider = registry.try_get_component_mut::<BoxCollider>(entity).ok_or(
                    PhysicsError::MissingComponent {
                        entity,
                        component: "BoxCollider",
                    },
                )?;
                let he = box_half_extents(&collider.size, &scale);
                let shape = SharedShape::cuboid(he.x, he.y, he.z);
                let key = self.shapes.insert(shape.clone());
                collider.last_size = collider.size;
                collider.last_scale = raw_scale;
                (shape, collider.shape.replace(ShapeHandle { key }))
            }
            ColliderKind::Sphere => {
                let collider = registry
                    .try_get_component_mut::<SphereCollider>(entity)
                    .ok_or(PhysicsError::MissingComponent {
                        entity,
                        component: "SphereCollider",
                    })?;
                let shape = SharedShape::ball(sphere_radius(collider.radius, &scale));
                let key = self.shapes.insert(shape.clone());
                collider.last_radius = collider.radius;
                collider.last_scale = raw_scale;
                (shape, collider.shape.replace(ShapeHandle { key }))
            }
        };
        if let Some(old) = old {
            self.shapes.remove(old.key);
        }
        self.shape_rebuilds += 1;
        debug!("{entity}: built {kind:?} shape");

        self.reinstall_shape(registry, entity, kind, shape)
    }

    /// Swaps the shape on an installed body that uses `kind`.
    fn reinstall_shape(
        &mut self,
        registry: &Registry,
        entity: Entity,
        kind: ColliderKind,
        shape: SharedShape,
    ) -> Result<(), PhysicsError> {
        let Some(handle) = registry
            .try_get_component::<RigidBody>(entity)
            .and_then(|rb| rb.body.as_ref())
        else {
            return Ok(());
        };
        if handle.shape != kind {
            return Ok(());
        }

        let sim = self.sim_mut()?;
        if let Some(collider) = sim.colliders.get_mut(handle.collider) {
            collider.set_shape(shape);
        }
        if handle.settings.body_type == BodyType::Dynamic {
            if let Some(body) = sim.bodies.get_mut(handle.body) {
                body.recompute_mass_properties_from_colliders(&sim.colliders);
            }
        }
        Ok(())
    }

    fn remove_shape(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
        kind: ColliderKind,
    ) -> Result<(), PhysicsError> {
        self.sim()?;
        let has_shape = match kind {
            ColliderKind::Box => registry
                .try_get_component::<BoxCollider>(entity)
                .is_some_and(|c| c.shape.is_some()),
            ColliderKind::Sphere => registry
                .try_get_component::<SphereCollider>(entity)
                .is_some_and(|c| c.shape.is_some()),
        };
        if !has_shape {
            return Ok(());
        }

        self.remove_rigid_body(registry, entity)?;

        let old = match kind {
            ColliderKind::Box => {
                let collider = registry.get_component_mut::<BoxCollider>(entity);
                collider.last_size = Vec3::zeros();
                collider.last_scale = Vec3::zeros();
                collider.shape.take()
            }
            ColliderKind::Sphere => {
                let collider = registry.get_component_mut::<SphereCollider>(entity);
                collider.last_radius = 0.0;
                collider.last_scale = Vec3::zeros();
                collider.shape.take()
            }
        };
        if let Some(old) = old {
            self.shapes.remove(old.key);
        }
        debug!("{entity}: released {kind:?} shape");
        Ok(())
    }

    fn shape_needs_rebuild(registry: &Registry, entity: Entity, kind: ColliderKind) -> bool {
        let Some(scale) = registry
            .try_get_component::<Transform>(entity)
            .map(|t| t.scale)
        else {
            return false;
        };
        match kind {
            ColliderKind::Box => registry
                .try_get_component::<BoxCollider>(entity)
                .is_some_and(|c| c.needs_rebuild(&scale)),
            ColliderKind::Sphere => registry
                .try_get_component::<SphereCollider>(entity)
                .is_some_and(|c| c.needs_rebuild(&scale)),
        }
    }

    /// Installed shape and offset of the collider of `kind`.
    fn collider_shape(
        &self,
        registry: &Registry,
        entity: Entity,
        kind: ColliderKind,
    ) -> Result<(SharedShape, Vec3), PhysicsError> {
        let (handle, offset) = match kind {
            ColliderKind::Box => registry
                .try_get_component::<BoxCollider>(entity)
                .map(|c| (c.shape.as_ref(), c.offset)),
            ColliderKind::Sphere => registry
                .try_get_component::<SphereCollider>(entity)
                .map(|c| (c.shape.as_ref(), c.offset)),
        }
        .ok_or(PhysicsError::MissingCollider(entity))?;

        let shape = handle
            .and_then(|h| self.shapes.get(h.key))
            .cloned()
            .ok_or(PhysicsError::MissingCollider(entity))?;
        Ok((shape, offset))
    }

    fn collider_offset(registry: &Registry, entity: Entity, kind: ColliderKind) -> Option<Vec3> {
        match kind {
            ColliderKind::Box => registry
                .try_get_component::<BoxCollider>(entity)
                .map(|c| c.offset),
            ColliderKind::Sphere => registry
                .try_get_component::<SphereCollider>(entity)
                .map(|c| c.offset),
        }
    }

    // ---- Rigid bodies ----

    /// Creates and installs a rigid body for the entity.
    ///
    /// Needs a Transform, a RigidBody and a collider (box preferred over
    /// sphere). Does nothing if a body is already installed.
    pub fn create_rigid_body_for_entity(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        self.sim()?;
        if !registry.has_component::<Transform>(entity) {
            return Err(PhysicsError::MissingComponent {
                entity,
                component: "Transform",
            });
        }
        let Some(rb) = registry.try_get_component::<RigidBody>(entity) else {
            return Err(PhysicsError::MissingComponent {
                entity,
                component: "RigidBody",
            });
        };
        if rb.body.is_some() {
            return Ok(());
        }
        let Some(kind) = ColliderKind::preferred(registry, entity) else {
            warn!("{entity}: RigidBody requires a BoxCollider or SphereCollider");
            return Err(PhysicsError::MissingCollider(entity));
        };

        if Self::shape_needs_rebuild(registry, entity, kind) {
            self.build_shape(registry, entity, kind)?;
        }
        let (shape, offset) = self.collider_shape(registry, entity, kind)?;

        let rb = registry.get_component::<RigidBody>(entity);
        let settings = BodySettings::from_component(rb);
        let mass = effective_mass(entity, &settings);
        let pose = body_pose(registry.get_component::<Transform>(entity), &offset);
        let user_data = entity.to_bits();

        let mut builder = match settings.body_type {
            BodyType::Static => RigidBodyBuilder::fixed(),
            BodyType::Dynamic => RigidBodyBuilder::dynamic()
                .linvel(rb.linear_velocity)
                .angvel(rb.angular_velocity),
            BodyType::Kinematic => RigidBodyBuilder::kinematic_position_based().can_sleep(false),
        }
        .position(pose)
        .linear_damping(settings.linear_drag)
        .angular_damping(settings.angular_drag)
        .gravity_scale(if settings.use_gravity { 1.0 } else { 0.0 })
        .user_data(user_data);
        if settings.freeze_rotation {
            builder = builder.lock_rotations();
        }

        let sim = self.sim_mut()?;
        let body = sim.bodies.insert(builder.build());
        let collider = sim.colliders.insert_with_parent(
            ColliderBuilder::new(shape)
                .mass(mass)
                .user_data(user_data)
                .build(),
            body,
            &mut sim.bodies,
        );

        registry.get_component_mut::<RigidBody>(entity).body = Some(BodyHandle {
            body,
            collider,
            shape: kind,
            offset,
            settings,
        });
        debug!(
            "{entity}: created {:?} body (mass {mass})",
            settings.body_type
        );
        Ok(())
    }

    /// Detaches and frees the entity's body. The collider shape stays with
    /// the collider component. No-op if no body is installed.
    pub fn remove_rigid_body(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        let sim = self.sim_mut()?;
        let installed = registry
            .try_get_component::<RigidBody>(entity)
            .is_some_and(RigidBody::is_registered);
        if !installed {
            return Ok(());
        }
        let Some(handle) = registry.get_component_mut::<RigidBody>(entity).body.take() else {
            return Ok(());
        };

        sim.bodies.remove(
            handle.body,
            &mut sim.islands,
            &mut sim.colliders,
            &mut sim.impulse_joints,
            &mut sim.multibody_joints,
            true,
        );
        debug!("{entity}: removed rigid body");
        Ok(())
    }

    /// Pushes the authoring pose into an authoring-driven body.
    ///
    /// Static bodies are teleported; kinematic bodies get a next kinematic
    /// position and are woken. Scale or size drift since the shape was built
    /// rebuilds the shape in place. Dynamic bodies are rejected with
    /// [`PhysicsError::SyncDirectionMismatch`].
    pub fn update_rigid_body_transform(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        self.sim()?;
        let (body_type, kind) = {
            let rb = registry.try_get_component::<RigidBody>(entity).ok_or(
                PhysicsError::MissingComponent {
                    entity,
                    component: "RigidBody",
                },
            )?;
            let handle = rb.body.as_ref().ok_or(PhysicsError::NotRegistered(entity))?;
            (handle.settings.body_type, handle.shape)
        };
        super::sync::check_direction(
            entity,
            body_type,
            super::SyncDirection::AuthoringToSimulation,
        )?;

        if Self::shape_needs_rebuild(registry, entity, kind) {
            self.build_shape(registry, entity, kind)?;
        }
        let offset = Self::collider_offset(registry, entity, kind)
            .ok_or(PhysicsError::MissingCollider(entity))?;
        let transform = registry.try_get_component::<Transform>(entity).ok_or(
            PhysicsError::MissingComponent {
                entity,
                component: "Transform",
            },
        )?;
        let pose = body_pose(transform, &offset);

        let sim = self.sim_mut()?;
        let handle = registry
            .get_component_mut::<RigidBody>(entity)
            .body
            .as_mut()
            .ok_or(PhysicsError::NotRegistered(entity))?;
        handle.offset = offset;
        let body = sim
            .bodies
            .get_mut(handle.body)
            .ok_or(PhysicsError::NotRegistered(entity))?;
        match body_type {
            BodyType::Kinematic => {
                body.set_next_kinematic_position(pose);
                body.wake_up(true);
            }
            _ => body.set_position(pose, true),
        }
        Ok(())
    }

    /// Pulls the body pose into the Transform and mirrors its velocities into
    /// the RigidBody component.
    pub fn sync_transform_from_physics(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
    ) -> Result<(), PhysicsError> {
        let sim = self.sim()?;
        let rb = registry.try_get_component::<RigidBody>(entity).ok_or(
            PhysicsError::MissingComponent {
                entity,
                component: "RigidBody",
            },
        )?;
        let handle = rb.body.as_ref().ok_or(PhysicsError::NotRegistered(entity))?;
        let body = sim
            .bodies
            .get(handle.body)
            .ok_or(PhysicsError::NotRegistered(entity))?;

        let (position, rotation) = authoring_pose(body.position(), &handle.offset);
        let linvel = *body.linvel();
        let angvel = *body.angvel();

        let transform = registry.try_get_component_mut::<Transform>(entity).ok_or(
            PhysicsError::MissingComponent {
                entity,
                component: "Transform",
            },
        )?;
        transform.position = position;
        transform.rotation = rotation;

        let rb = registry.get_component_mut::<RigidBody>(entity);
        rb.linear_velocity = linvel;
        rb.angular_velocity = angvel;
        Ok(())
    }

    // ---- Script-facing body operations ----

    fn installed_body_mut(
        &mut self,
        registry: &Registry,
        entity: Entity,
    ) -> Result<(&mut rapier3d::prelude::RigidBody, BodyType), PhysicsError> {
        let sim = self.sim_mut()?;
        let handle = registry
            .try_get_component::<RigidBody>(entity)
            .and_then(|rb| rb.body.as_ref())
            .ok_or(PhysicsError::NotRegistered(entity))?;
        let body_type = handle.settings.body_type;
        let body = sim
            .bodies
            .get_mut(handle.body)
            .ok_or(PhysicsError::NotRegistered(entity))?;
        Ok((body, body_type))
    }

    fn installed_body(
        &self,
        registry: &Registry,
        entity: Entity,
    ) -> Result<&rapier3d::prelude::RigidBody, PhysicsError> {
        let sim = self.sim()?;
        let handle = registry
            .try_get_component::<RigidBody>(entity)
            .and_then(|rb| rb.body.as_ref())
            .ok_or(PhysicsError::NotRegistered(entity))?;
        sim.bodies
            .get(handle.body)
            .ok_or(PhysicsError::NotRegistered(entity))
    }

    /// Applies a force for the next `step` call. Ignored for bodies that are
    /// not dynamic.
    pub fn apply_force(
        &mut self,
        registry: &Registry,
        entity: Entity,
        force: Vec3,
    ) -> Result<(), PhysicsError> {
        let (body, body_type) = self.installed_body_mut(registry, entity)?;
        if body_type == BodyType::Dynamic {
            body.add_force(force, true);
        } else {
            debug!("{entity}: force ignored on {body_type:?} body");
        }
        Ok(())
    }

    pub fn set_linear_velocity(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
        velocity: Vec3,
    ) -> Result<(), PhysicsError> {
        let (body, _) = self.installed_body_mut(registry, entity)?;
        body.set_linvel(velocity, true);
        registry.get_component_mut::<RigidBody>(entity).linear_velocity = velocity;
        Ok(())
    }

    pub fn linear_velocity(&self, registry: &Registry, entity: Entity) -> Result<Vec3, PhysicsError> {
        Ok(*self.installed_body(registry, entity)?.linvel())
    }

    pub fn set_angular_velocity(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
        velocity: Vec3,
    ) -> Result<(), PhysicsError> {
        let (body, _) = self.installed_body_mut(registry, entity)?;
        body.set_angvel(velocity, true);
        registry.get_component_mut::<RigidBody>(entity).angular_velocity = velocity;
        Ok(())
    }

    pub fn angular_velocity(
        &self,
        registry: &Registry,
        entity: Entity,
    ) -> Result<Vec3, PhysicsError> {
        Ok(*self.installed_body(registry, entity)?.angvel())
    }

    /// Sets the authored mass and, for dynamic bodies, the simulated mass.
    pub fn set_mass(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
        mass: f32,
    ) -> Result<(), PhysicsError> {
        let sim = self.sim_mut()?;
        let rb = registry.try_get_component_mut::<RigidBody>(entity).ok_or(
            PhysicsError::MissingComponent {
                entity,
                component: "RigidBody",
            },
        )?;
        rb.mass = mass;
        let Some(handle) = rb.body.as_mut() else {
            return Ok(());
        };
        handle.settings.mass = mass;
        if handle.settings.body_type != BodyType::Dynamic {
            return Ok(());
        }

        let effective = effective_mass(entity, &handle.settings);
        if let Some(collider) = sim.colliders.get_mut(handle.collider) {
            collider.set_mass(effective);
        }
        if let Some(body) = sim.bodies.get_mut(handle.body) {
            body.recompute_mass_properties_from_colliders(&sim.colliders);
        }
        Ok(())
    }

    /// Simulated mass: 0 for static and kinematic bodies.
    pub fn mass(&self, registry: &Registry, entity: Entity) -> Result<f32, PhysicsError> {
        let body = self.installed_body(registry, entity)?;
        if body.is_dynamic() {
            Ok(body.mass())
        } else {
            Ok(0.0)
        }
    }

    // ---- Queries ----

    /// Closest hit along a ray, from the state of the last step.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let sim = self.sim.as_ref()?;
        let direction = direction.try_normalize(f32::EPSILON)?;
        let ray = Ray::new(origin.into(), direction);
        let (handle, hit) = sim.query_pipeline.cast_ray_and_get_normal(
            &sim.bodies,
            &sim.colliders,
            &ray,
            max_distance,
            true,
            QueryFilter::default(),
        )?;
        let collider = sim.colliders.get(handle)?;
        Some(RaycastHit {
            entity: Entity::from_bits(collider.user_data),
            point: ray.point_at(hit.time_of_impact).coords,
            normal: hit.normal,
            distance: hit.time_of_impact,
        })
    }

    /// Entities whose colliders intersect a sphere, from the state of the
    /// last step.
    pub fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        let Some(sim) = self.sim.as_ref() else {
            return Vec::new();
        };
        let ball = Ball::new(radius.abs());
        let pose = Isometry3::translation(center.x, center.y, center.z);
        let mut hits = Vec::new();
        sim.query_pipeline.intersections_with_shape(
            &sim.bodies,
            &sim.colliders,
            &pose,
            &ball,
            QueryFilter::default(),
            |handle| {
                if let Some(collider) = sim.colliders.get(handle) {
                    hits.push(Entity::from_bits(collider.user_data));
                }
                true
            },
        );
        hits.sort();
        hits.dedup();
        hits
    }

    // ---- Diagnostics ----

    pub fn body_count(&self) -> usize {
        self.sim.as_ref().map_or(0, |sim| sim.bodies.len())
    }

    pub fn collider_count(&self) -> usize {
        self.sim.as_ref().map_or(0, |sim| sim.colliders.len())
    }

    /// Number of live shapes in the shape arena.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Total number of shape builds so far.
    pub fn shape_rebuilds(&self) -> u64 {
        self.shape_rebuilds
    }

    pub fn is_body_sleeping(&self, registry: &Registry, entity: Entity) -> Option<bool> {
        self.sim.as_ref()?;
        self.installed_body(registry, entity)
            .ok()
            .map(|body| body.is_sleeping())
    }

    /// Simulated mass of an installed body.
    pub fn effective_mass(&self, registry: &Registry, entity: Entity) -> Option<f32> {
        self.sim.as_ref()?;
        self.mass(registry, entity).ok()
    }

    /// Half extents of the entity's built box shape.
    pub fn box_half_extents(&self, registry: &Registry, entity: Entity) -> Option<Vec3> {
        let handle = registry
            .try_get_component::<BoxCollider>(entity)?
            .shape
            .as_ref()?;
        let shape = self.shapes.get(handle.key)?;
        shape.as_cuboid().map(|cuboid| cuboid.half_extents)
    }

    /// Radius of the entity's built sphere shape.
    pub fn sphere_radius(&self, registry: &Registry, entity: Entity) -> Option<f32> {
        let handle = registry
            .try_get_component::<SphereCollider>(entity)?
            .shape
            .as_ref()?;
        let shape = self.shapes.get(handle.key)?;
        shape.as_ball().map(|ball| ball.radius)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&PhysicsSettings::default())
    }
}

impl Drop for PhysicsWorld {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Simulated collider mass for `settings`.
fn effective_mass(entity: Entity, settings: &BodySettings) -> f32 {
    match settings.body_type {
        BodyType::Static | BodyType::Kinematic => 0.0,
        BodyType::Dynamic if !(settings.mass > 0.0) => {
            warn!(
                "{entity}: dynamic body mass {} is not positive, using {MIN_DYNAMIC_MASS}",
                settings.mass
            );
            MIN_DYNAMIC_MASS
        }
        BodyType::Dynamic => settings.mass,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spawn(registry: &mut Registry, transform: Transform, rb: RigidBody) -> Entity {
        let e = registry.create_entity();
        registry.add_component(e, transform);
        registry.add_component(e, BoxCollider::default());
        registry.add_component(e, rb);
        e
    }

    #[test]
    fn physics_world_default() {
        let world = PhysicsWorld::default();
        assert!(world.is_initialized());
        assert_relative_eq!(world.gravity(), Vec3::new(0.0, -9.81, 0.0));
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.shape_count(), 0);
    }

    #[test]
    fn step_substeps_are_capped() {
        let mut world = PhysicsWorld::default();
        assert_eq!(world.step(1.0 / 60.0), 1);
        assert_eq!(world.step(1.0), 10);
        // Leftover time was dropped, not carried over.
        assert_eq!(world.step(1.0 / 120.0), 0);
        assert_eq!(world.step(0.0), 0);
        assert_eq!(world.step(-1.0), 0);
    }

    #[test]
    fn step_moves_dynamic_body() {
        let mut registry = Registry::new();
        let mut world = PhysicsWorld::default();
        let e = spawn(
            &mut registry,
            Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
            RigidBody::default(),
        );
        world.create_rigid_body_for_entity(&mut registry, e).unwrap();

        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }
        world.sync_transform_from_physics(&mut registry, e).unwrap();

        let t = registry.get_component::<Transform>(e);
        assert!(t.position.y < 10.0);
        assert!(registry.get_component::<RigidBody>(e).linear_velocity.y < 0.0);
    }

    #[test]
    fn create_is_idempotent() {
        let mut registry = Registry::new();
        let mut world = PhysicsWorld::default();
        let e = spawn(&mut registry, Transform::default(), RigidBody::default());

        world.create_rigid_body_for_entity(&mut registry, e).unwrap();
        world.create_rigid_body_for_entity(&mut registry, e).unwrap();
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.shape_count(), 1);
    }

    #[test]
    fn create_without_collider_fails() {
        let mut registry = Registry::new();
        let mut world = PhysicsWorld::default();
        let e = registry.create_entity();
        registry.add_component(e, Transform::default());
        registry.add_component(e, RigidBody::default());

        assert_eq!(
            world.create_rigid_body_for_entity(&mut registry, e),
            Err(PhysicsError::MissingCollider(e))
        );
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn non_positive_dynamic_mass_is_clamped() {
        let mut registry = Registry::new();
        let mut world = PhysicsWorld::default();
        let e = spawn(
            &mut registry,
            Transform::default(),
            RigidBody::default().with_mass(0.0),
        );
        world.create_rigid_body_for_entity(&mut registry, e).unwrap();
        assert_relative_eq!(
            world.effective_mass(&registry, e).unwrap(),
            MIN_DYNAMIC_MASS,
            epsilon = 1e-6
        );
    }

    #[test]
    fn set_mass_updates_dynamic_body() {
        let mut registry = Registry::new();
        let mut world = PhysicsWorld::default();
        let e = spawn(&mut registry, Transform::default(), RigidBody::default());
        world.create_rigid_body_for_entity(&mut registry, e).unwrap();

        world.set_mass(&mut registry, e, 5.0).unwrap();
        assert_relative_eq!(world.mass(&registry, e).unwrap(), 5.0, epsilon = 1e-4);
        let rb = registry.get_component::<RigidBody>(e);
        assert_eq!(rb.mass, 5.0);
        assert!(!rb.body.as_ref().unwrap().is_stale(rb));
    }

    #[test]
    fn shutdown_releases_everything_and_is_idempotent() {
        let mut registry = Registry::new();
        let mut world = PhysicsWorld::default();
        let e = spawn(&mut registry, Transform::default(), RigidBody::default());
        world.create_rigid_body_for_entity(&mut registry, e).unwrap();

        world.shutdown();
        world.shutdown();
        assert!(!world.is_initialized());
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.shape_count(), 0);
        assert_eq!(world.step(1.0), 0);
        assert_eq!(
            world.update_rigid_body_transform(&mut registry, e),
            Err(PhysicsError::NotInitialized)
        );
    }

    #[test]
    fn raycast_hits_static_box() {
        let mut registry = Registry::new();
        let mut world = PhysicsWorld::default();
        let e = spawn(
            &mut registry,
            Transform::from_position(Vec3::new(0.0, 0.0, -5.0)),
            RigidBody::new(BodyType::Static),
        );
        world.create_rigid_body_for_entity(&mut registry, e).unwrap();
        world.step(1.0 / 60.0);

        let hit = world
            .raycast(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), 100.0)
            .unwrap();
        assert_eq!(hit.entity, e);
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-3);
        assert_relative_eq!(hit.normal, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-3);

        assert!(world.raycast(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), 100.0).is_none());
        assert_eq!(world.overlap_sphere(Vec3::new(0.0, 0.0, -4.0), 1.0), vec![e]);
        assert!(world.overlap_sphere(Vec3::new(10.0, 0.0, 0.0), 1.0).is_empty());
    }
}
