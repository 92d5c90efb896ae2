use quasar_ecs::Component;

/// Display name of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub const DEFAULT_NAME: &'static str = "Entity";

    /// Creates a tag; an empty name becomes [`Tag::DEFAULT_NAME`].
    pub fn new(name: &str) -> Self {
        let name = if name.is_empty() {
            Self::DEFAULT_NAME
        } else {
            name
        };
        Self {
            name: name.to_string(),
        }
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::new("")
    }
}
