use std::collections::BTreeMap;

use quasar_ecs::{Component, FieldValue};

/// Attaches behavior scripts to an entity.
///
/// `class_name` selects a class in a managed script host; `script_paths`
/// names files for an embedded interpreter. Either may be empty. Authored
/// `variables` are handed to each instance when it is created.
#[derive(Debug, Clone, Default, PartialEq, Component)]
pub struct Script {
    pub class_name: String,
    pub script_paths: Vec<String>,
    pub variables: BTreeMap<String, FieldValue>,
}

impl Script {
    pub fn from_class(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script_paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets an authored variable. Only scalar, boolean and vector values are
    /// meaningful to script hosts.
    pub fn with_variable(mut self, name: &str, value: FieldValue) -> Self {
        self.variables.insert(name.to_string(), value);
        self
    }
}
