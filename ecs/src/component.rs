//! Runtime reflection for components.
//!
//! The [`Component`] trait exposes a component's persistent state as a flat
//! list of primitive fields ([`FieldValue`]). Serializers, the editor and
//! entity cloning go through this view; runtime-only state (engine handles,
//! rebuild caches) is excluded with `#[runtime]` and never leaves the
//! process.
//!
//! Use `#[derive(Component)]` from [`ecs_macro`] to auto-implement the trait.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Saved fields of one component, keyed by field name.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Primitive kind of a reflected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    F32,
    I32,
    U32,
    Bool,
    Vec3,
    String,
    StringList,
    /// C-like enum stored by variant name.
    Enum,
    /// Nested name → value map (script variables).
    Map,
}

/// A primitive field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    F32(f32),
    I32(i32),
    U32(u32),
    Bool(bool),
    Vec3([f32; 3]),
    String(String),
    StringList(Vec<String>),
    Enum(String),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::F32(_) => FieldKind::F32,
            FieldValue::I32(_) => FieldKind::I32,
            FieldValue::U32(_) => FieldKind::U32,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Vec3(_) => FieldKind::Vec3,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::StringList(_) => FieldKind::StringList,
            FieldValue::Enum(_) => FieldKind::Enum,
            FieldValue::Map(_) => FieldKind::Map,
        }
    }
}

/// Static description of a reflected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Error returned when a reflected field cannot be written.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// The component has no persistent field with this name.
    UnknownField {
        component: &'static str,
        field: String,
    },
    /// The value's kind (or enum variant) does not fit the field.
    TypeMismatch {
        component: &'static str,
        field: &'static str,
        expected: FieldKind,
        found: FieldKind,
    },
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::UnknownField { component, field } => {
                write!(f, "Component `{component}` has no field `{field}`")
            }
            FieldError::TypeMismatch {
                component,
                field,
                expected,
                found,
            } => write!(
                f,
                "Field `{component}.{field}` expects {expected:?}, got {found:?}"
            ),
        }
    }
}

impl std::error::Error for FieldError {}

/// Trait for reflected components.
///
/// # Deriving
///
/// ```ignore
/// #[derive(Default, Component)]
/// struct SphereCollider {
///     radius: f32,
///     offset: Vec3,
///     #[runtime]
///     shape: Option<ShapeHandle>,
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// The struct name as a static string (e.g. `"Transform"`).
    const NAME: &'static str;

    /// Returns the struct name (e.g. `"Transform"`).
    fn component_name(&self) -> &'static str {
        Self::NAME
    }

    /// Persistent fields, in declaration order.
    fn field_infos() -> &'static [FieldInfo]
    where
        Self: Sized;

    /// Reads a persistent field.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Writes a persistent field.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError>;

    /// Reads every persistent field.
    fn save_fields(&self) -> FieldMap
    where
        Self: Sized,
    {
        Self::field_infos()
            .iter()
            .filter_map(|info| self.field(info.name).map(|v| (info.name.to_string(), v)))
            .collect()
    }

    /// Writes every field in `fields`, stopping at the first error.
    fn restore_fields(&mut self, fields: &FieldMap) -> Result<(), FieldError> {
        for (name, value) in fields {
            self.set_field(name, value.clone())?;
        }
        Ok(())
    }
}
