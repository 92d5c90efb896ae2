//! Serializable scene snapshots.
//!
//! A snapshot holds the reflected persistent fields of every entity, keyed by
//! component name. Runtime handles are never part of it; bodies and shapes
//! are rebuilt on the first update after loading.

use std::collections::BTreeMap;

use quasar_ecs::FieldMap;
use serde::{Deserialize, Serialize};

use crate::settings::SceneSettings;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub components: BTreeMap<String, FieldMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub name: String,
    #[serde(default)]
    pub settings: SceneSettings,
    pub entities: Vec<EntitySnapshot>,
}

impl SceneSnapshot {
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}
