//! # Quasar ECS
//!
//! Entity registry with per-type sparse-set storage, change ticks and
//! component reflection.
//!
//! ## Core Types
//!
//! - [`Entity`] - Lightweight entity handle (slot index, spawn tick, owner)
//! - [`Registry`] - Owns entities and their components
//! - [`SparseSet`] - Per-type component storage with change ticks
//!
//! ## Reflection
//!
//! - [`Component`] - Named components with primitive fields, derivable
//! - [`ComponentField`] - Conversion of a field type to [`FieldValue`]
//! - [`FieldInfo`] / [`FieldKind`] - Static field descriptions

// Lets `#[derive(Component)]` resolve `quasar_ecs::` paths inside this crate.
extern crate self as quasar_ecs;

pub mod component;
pub mod component_field;
mod entity;
mod registry;
mod sparse_set;

pub use component::{Component, FieldError, FieldInfo, FieldKind, FieldMap, FieldValue};
pub use component_field::ComponentField;
pub use ecs_macro::Component;
pub use entity::Entity;
pub use registry::Registry;
pub use sparse_set::SparseSet;
