//! Field-level conversion to and from [`FieldValue`].
//!
//! The [`ComponentField`] trait is the single extension point for types used
//! as persistent fields inside `#[derive(Component)]` structs.
//!
//! # Adding a custom field type
//!
//! ```ignore
//! impl ComponentField for BodyType {
//!     const KIND: FieldKind = FieldKind::Enum;
//!
//!     fn to_field_value(&self) -> FieldValue {
//!         FieldValue::Enum(self.as_str().to_string())
//!     }
//!
//!     fn from_field_value(value: &FieldValue) -> Option<Self> {
//!         match value {
//!             FieldValue::Enum(name) => BodyType::from_str(name),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use quasar_core::math::Vec3;

use crate::component::{FieldKind, FieldValue};

/// Conversion between a field type and its primitive representation.
pub trait ComponentField: Sized {
    /// Kind reported in [`FieldInfo`](crate::FieldInfo).
    const KIND: FieldKind;

    fn to_field_value(&self) -> FieldValue;

    /// Returns `None` when `value` has the wrong kind or an invalid payload.
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

impl ComponentField for f32 {
    const KIND: FieldKind = FieldKind::F32;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::F32(*self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::F32(v) => Some(*v),
            FieldValue::I32(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl ComponentField for i32 {
    const KIND: FieldKind = FieldKind::I32;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::I32(*self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::I32(v) => Some(*v),
            _ => None,
        }
    }
}

impl ComponentField for u32 {
    const KIND: FieldKind = FieldKind::U32;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::U32(*self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::U32(v) => Some(*v),
            FieldValue::I32(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl ComponentField for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Vectors and strings
// ---------------------------------------------------------------------------

impl ComponentField for Vec3 {
    const KIND: FieldKind = FieldKind::Vec3;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Vec3([self.x, self.y, self.z])
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Vec3([x, y, z]) => Some(Vec3::new(*x, *y, *z)),
            _ => None,
        }
    }
}

impl ComponentField for String {
    const KIND: FieldKind = FieldKind::String;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl ComponentField for Vec<String> {
    const KIND: FieldKind = FieldKind::StringList;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::StringList(self.clone())
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::StringList(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl ComponentField for BTreeMap<String, FieldValue> {
    const KIND: FieldKind = FieldKind::Map;

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Map(self.clone())
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Map(v) => Some(v.clone()),
            _ => None,
        }
    }
}
