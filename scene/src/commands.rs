//! Deferred scene mutations.
//!
//! Script callbacks run while the scene iterates its script instances, so
//! destruction and script start-up are queued here and applied at the end of
//! the frame.

use quasar_ecs::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SceneCommand {
    Destroy(Entity),
    /// Instantiate scripts and audio for an entity created mid-frame.
    Start(Entity),
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<SceneCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destroy(&mut self, entity: Entity) {
        self.commands.push(SceneCommand::Destroy(entity));
    }

    pub fn start(&mut self, entity: Entity) {
        self.commands.push(SceneCommand::Start(entity));
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Takes every queued command, split into destroys and starts in
    /// request order, without duplicates.
    pub(crate) fn drain(&mut self) -> (Vec<Entity>, Vec<Entity>) {
        let mut destroys = Vec::new();
        let mut starts = Vec::new();
        for command in self.commands.drain(..) {
            let (list, entity) = match command {
                SceneCommand::Destroy(e) => (&mut destroys, e),
                SceneCommand::Start(e) => (&mut starts, e),
            };
            if !list.contains(&entity) {
                list.push(entity);
            }
        }
        (destroys, starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quasar_ecs::Registry;

    #[test]
    fn drain_splits_and_dedups() {
        let mut registry = Registry::new();
        let a = registry.create_entity();
        let b = registry.create_entity();

        let mut queue = CommandQueue::new();
        queue.start(b);
        queue.destroy(a);
        queue.destroy(a);
        queue.destroy(b);
        assert_eq!(queue.len(), 4);

        let (destroys, starts) = queue.drain();
        assert_eq!(destroys, vec![a, b]);
        assert_eq!(starts, vec![b]);
        assert!(queue.is_empty());
    }
}
