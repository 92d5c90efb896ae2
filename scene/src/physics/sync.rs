//! Direction policy between authoring components and simulated bodies.
//!
//! Static and kinematic bodies follow their Transform
//! ([`SyncDirection::AuthoringToSimulation`]); dynamic bodies own their pose
//! and write it back ([`SyncDirection::SimulationToAuthoring`]).

use quasar_ecs::{Entity, Registry};

use super::handles::ColliderKind;
use super::world::PhysicsWorld;
use crate::components::{BodyType, BoxCollider, RigidBody, SphereCollider, Transform};
use crate::error::PhysicsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncDirection {
    /// Transform → body.
    AuthoringToSimulation,
    /// Body → Transform.
    SimulationToAuthoring,
}

impl SyncDirection {
    pub fn for_body_type(body_type: BodyType) -> Self {
        match body_type {
            BodyType::Dynamic => SyncDirection::SimulationToAuthoring,
            BodyType::Static | BodyType::Kinematic => SyncDirection::AuthoringToSimulation,
        }
    }
}

pub(crate) fn check_direction(
    entity: Entity,
    body_type: BodyType,
    requested: SyncDirection,
) -> Result<(), PhysicsError> {
    let expected = SyncDirection::for_body_type(body_type);
    if requested == expected {
        Ok(())
    } else {
        Err(PhysicsError::SyncDirectionMismatch {
            entity,
            requested,
            expected,
        })
    }
}

/// Direction the installed body of `entity` is synchronized in.
pub fn direction_of(registry: &Registry, entity: Entity) -> Option<SyncDirection> {
    let handle = registry.try_get_component::<RigidBody>(entity)?.body.as_ref()?;
    Some(SyncDirection::for_body_type(handle.settings().body_type))
}

/// Returns true if the installed body no longer matches its authoring data:
/// body type or settings were edited, or a box collider now takes precedence
/// over the sphere the body was built from (or the reverse).
pub fn body_needs_rebuild(registry: &Registry, entity: Entity) -> bool {
    let Some(rb) = registry.try_get_component::<RigidBody>(entity) else {
        return false;
    };
    let Some(handle) = rb.body.as_ref() else {
        return false;
    };
    handle.is_stale(rb)
        || ColliderKind::preferred(registry, entity).is_some_and(|kind| kind != handle.collider_kind())
}

/// Returns true if anything an authoring-driven body depends on changed
/// strictly after `since_tick`.
pub fn authoring_changed_since(registry: &Registry, entity: Entity, since_tick: u64) -> bool {
    registry.changed_since::<Transform>(entity, since_tick)
        || registry.changed_since::<RigidBody>(entity, since_tick)
        || registry.changed_since::<BoxCollider>(entity, since_tick)
        || registry.changed_since::<SphereCollider>(entity, since_tick)
}

impl PhysicsWorld {
    /// Synchronizes one entity in the requested direction.
    ///
    /// Fails with [`PhysicsError::SyncDirectionMismatch`] if the body type
    /// implies the other direction.
    pub fn sync(
        &mut self,
        registry: &mut Registry,
        entity: Entity,
        direction: SyncDirection,
    ) -> Result<(), PhysicsError> {
        let body_type = registry
            .try_get_component::<RigidBody>(entity)
            .and_then(|rb| rb.body.as_ref())
            .map(|handle| handle.settings().body_type)
            .ok_or(PhysicsError::NotRegistered(entity))?;
        check_direction(entity, body_type, direction)?;

        match direction {
            SyncDirection::AuthoringToSimulation => {
                self.update_rigid_body_transform(registry, entity)
            }
            SyncDirection::SimulationToAuthoring => {
                self.sync_transform_from_physics(registry, entity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quasar_core::math::Vec3;

    #[test]
    fn direction_follows_body_type() {
        assert_eq!(
            SyncDirection::for_body_type(BodyType::Dynamic),
            SyncDirection::SimulationToAuthoring
        );
        assert_eq!(
            SyncDirection::for_body_type(BodyType::Static),
            SyncDirection::AuthoringToSimulation
        );
        assert_eq!(
            SyncDirection::for_body_type(BodyType::Kinematic),
            SyncDirection::AuthoringToSimulation
        );
    }

    #[test]
    fn wrong_direction_is_rejected() {
        let mut registry = Registry::new();
        let mut physics = PhysicsWorld::default();
        let e = registry.create_entity();
        registry.add_component(e, Transform::default());
        registry.add_component(e, BoxCollider::default());
        registry.add_component(e, RigidBody::default());
        physics.create_rigid_body_for_entity(&mut registry, e).unwrap();

        assert_eq!(
            physics.sync(&mut registry, e, SyncDirection::AuthoringToSimulation),
            Err(PhysicsError::SyncDirectionMismatch {
                entity: e,
                requested: SyncDirection::AuthoringToSimulation,
                expected: SyncDirection::SimulationToAuthoring,
            })
        );
        assert!(
            physics
                .sync(&mut registry, e, SyncDirection::SimulationToAuthoring)
                .is_ok()
        );
        assert!(matches!(
            physics.update_rigid_body_transform(&mut registry, e),
            Err(PhysicsError::SyncDirectionMismatch { .. })
        ));
    }

    #[test]
    fn type_change_marks_body_for_rebuild() {
        let mut registry = Registry::new();
        let mut physics = PhysicsWorld::default();
        let e = registry.create_entity();
        registry.add_component(e, Transform::default());
        registry.add_component(e, SphereCollider::default());
        registry.add_component(e, RigidBody::default());
        physics.create_rigid_body_for_entity(&mut registry, e).unwrap();
        assert!(!body_needs_rebuild(&registry, e));

        registry.add_component(e, BoxCollider::new(Vec3::new(1.0, 1.0, 1.0)));
        assert!(body_needs_rebuild(&registry, e));
        registry.remove_component::<BoxCollider>(e);

        registry.get_component_mut::<RigidBody>(e).body_type = BodyType::Static;
        assert!(body_needs_rebuild(&registry, e));
        assert_eq!(
            direction_of(&registry, e),
            Some(SyncDirection::SimulationToAuthoring)
        );
    }
}
