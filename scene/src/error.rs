use quasar_ecs::Entity;
use thiserror::Error;

use crate::physics::SyncDirection;

/// Errors returned by [`PhysicsWorld`](crate::physics::PhysicsWorld) operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("Physics world is not initialized (or was shut down)")]
    NotInitialized,

    #[error("{entity} has no `{component}` component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("{0} needs a BoxCollider or SphereCollider for its rigid body")]
    MissingCollider(Entity),

    #[error("{0} has no rigid body registered with the physics world")]
    NotRegistered(Entity),

    #[error("{entity}: cannot sync {requested:?}, body is driven {expected:?}")]
    SyncDirectionMismatch {
        entity: Entity,
        requested: SyncDirection,
        expected: SyncDirection,
    },
}

/// Errors reported by script hosts and script instances.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Script class `{0}` is not known to any script host")]
    UnknownClass(String),

    #[error("Script on {entity} failed: {message}")]
    Runtime { entity: Entity, message: String },
}
