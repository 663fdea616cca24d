//! Deferred structural changes
//!
//! Components cannot touch the entity table while the update pass walks it.
//! They queue [`Command`]s instead; the scene applies them as soon as the
//! component that queued them returns. Deletions only mark entities, the
//! actual removal still waits for the end-of-frame sweep.

use std::collections::VecDeque;

use super::component::{Component, ComponentVTable};

/// A structural change requested during the update pass
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Command {
    /// Create a new entity (with its implicit Transform)
    Spawn {
        name: String,
        parent: Option<String>,
    },

    /// Attach a component kind to an existing entity
    AddComponent {
        entity: String,
        vtable: ComponentVTable,
    },

    /// Mark an entity and its descendants for deletion
    Delete(String),

    SetActive { entity: String, active: bool },

    SetVisible { entity: String, visible: bool },

    /// Ask the runtime to load another scene once the tick completes
    SwitchScene(String),
}

/// FIFO of commands queued by the running component
#[derive(Debug, Default)]
pub struct Commands {
    queue: VecDeque<Command>,
}

impl Commands {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    pub fn spawn(&mut self, name: impl Into<String>, parent: Option<&str>) {
        self.push(Command::Spawn {
            name: name.into(),
            parent: parent.map(str::to_string),
        });
    }

    pub fn add_component<T: Component>(&mut self, entity: impl Into<String>) {
        self.push(Command::AddComponent {
            entity: entity.into(),
            vtable: ComponentVTable::of::<T>(),
        });
    }

    pub fn delete(&mut self, entity: impl Into<String>) {
        self.push(Command::Delete(entity.into()));
    }

    pub fn set_active(&mut self, entity: impl Into<String>, active: bool) {
        self.push(Command::SetActive {
            entity: entity.into(),
            active,
        });
    }

    pub fn set_visible(&mut self, entity: impl Into<String>, visible: bool) {
        self.push(Command::SetVisible {
            entity: entity.into(),
            visible,
        });
    }

    pub fn switch_scene(&mut self, scene: impl Into<String>) {
        self.push(Command::SwitchScene(scene.into()));
    }

    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = Command> + '_ {
        self.queue.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::SpriteRenderer;

    #[test]
    fn test_commands_drain_in_order() {
        let mut commands = Commands::new();
        commands.spawn("bullet", Some("player"));
        commands.add_component::<SpriteRenderer>("bullet");
        commands.delete("enemy");
        assert_eq!(commands.len(), 3);

        let drained: Vec<_> = commands.drain().collect();
        assert!(matches!(&drained[0], Command::Spawn { name, parent: Some(p) } if name == "bullet" && p == "player"));
        assert!(matches!(&drained[1], Command::AddComponent { vtable, .. } if vtable.kind() == "SpriteRenderer"));
        assert!(matches!(&drained[2], Command::Delete(name) if name == "enemy"));
        assert!(commands.is_empty());
    }
}
