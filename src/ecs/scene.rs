//! Scene: the entity table and its component arena
//!
//! The scene is the sole owner of every entity. Entities are kept in an
//! insertion-ordered table keyed by name, so the update and draw passes
//! always visit them in creation order (parents before children). Component
//! values live in a [`World`]; each entity record remembers which kinds it
//! carries, in attachment order, as type-erased vtables.
//!
//! Structural changes made from inside the update pass go through
//! [`Commands`]. Deletion is two-phase: [`Scene::delete`] only marks,
//! [`Scene::sweep`] removes.

use glam::Vec2;
use hecs::Entity;
use indexmap::IndexSet;

use super::commands::{Command, Commands};
use super::component::{Component, ComponentInit, ComponentVTable, DrawContext, UpdateTarget};
use super::components::Transform;
use super::entity::{EntityRecord, EntityTable};
use super::hierarchy::{Ancestors, Children};
use super::registry::Registry;
use super::world::World;
use crate::core::Time;
use crate::input::Input;
use crate::render::{LayerError, RenderBatch};
use crate::value::{Mapping, ResourcePath, Value, ValueError};

/// Structural errors raised by the entity-component store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("entity `{0}` already exists")]
    DuplicateEntity(String),

    #[error("entity `{entity}` already has a `{kind}` component")]
    DuplicateComponent { entity: String, kind: &'static str },

    #[error("entity `{0}` not found")]
    EntityNotFound(String),

    #[error("component kind `{0}` is not registered")]
    UnknownComponentKind(String),

    #[error("entity `{entity}` has no `{kind}` component")]
    MissingComponent { entity: String, kind: String },

    /// A persisted attribute could not be applied to a component
    #[error("invalid `{kind}` attribute on entity `{entity}`: {source}")]
    Value {
        entity: String,
        kind: String,
        #[source]
        source: ValueError,
    },
}

/// A named graph of entities and their components
#[derive(Debug)]
pub struct Scene {
    name: String,
    is_main: bool,
    camera: Option<String>,
    world: World,
    entities: EntityTable,
    pending_deletions: Vec<String>,
    switch_request: Option<String>,
}

impl Scene {
    #[must_use]
    pub fn new(name: impl Into<String>, is_main: bool) -> Self {
        Self {
            name: name.into(),
            is_main,
            camera: None,
            world: World::new(),
            entities: EntityTable::new(),
            pending_deletions: Vec::new(),
            switch_request: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_main(&self) -> bool {
        self.is_main
    }

    pub fn set_main(&mut self, is_main: bool) {
        self.is_main = is_main;
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create an entity with a default [`Transform`]
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateEntity`] if the name is taken, or
    /// [`StoreError::EntityNotFound`] if `parent` does not exist yet
    pub fn add_entity(&mut self, name: &str, parent: Option<&str>) -> Result<Entity, StoreError> {
        if self.entities.contains_key(name) {
            return Err(StoreError::DuplicateEntity(name.to_string()));
        }
        if let Some(parent) = parent {
            let record = self
                .entities
                .get_mut(parent)
                .ok_or_else(|| StoreError::EntityNotFound(parent.to_string()))?;
            record.children_mut().add(name);
        }

        let handle = self.world.spawn_empty();
        self.entities.insert(
            name.to_string(),
            EntityRecord::new(handle, parent.map(str::to_string)),
        );
        self.add_component::<Transform>(name)?;

        log::debug!("Created entity {name} in scene {}", self.name);
        Ok(handle)
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityRecord> {
        self.entities.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Entity names in creation order
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    #[must_use]
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    #[must_use]
    pub fn parent(&self, name: &str) -> Option<&str> {
        self.entities.get(name)?.parent()
    }

    #[must_use]
    pub fn children(&self, name: &str) -> Option<&Children> {
        self.entities.get(name).map(EntityRecord::children)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// # Errors
    ///
    /// [`StoreError::EntityNotFound`] for unknown names
    pub fn set_active(&mut self, name: &str, active: bool) -> Result<(), StoreError> {
        self.record_mut(name)?.is_active = active;
        Ok(())
    }

    /// # Errors
    ///
    /// [`StoreError::EntityNotFound`] for unknown names
    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<(), StoreError> {
        self.record_mut(name)?.is_visible = visible;
        Ok(())
    }

    /// Active flag of the entity and every ancestor, AND-reduced
    ///
    /// False for names not in the scene.
    #[must_use]
    pub fn is_hierarchy_active(&self, name: &str) -> bool {
        self.contains(name) && self.ancestors(name).all(|(_, record)| record.is_active)
    }

    /// Visible flag of the entity and every ancestor, AND-reduced
    #[must_use]
    pub fn is_hierarchy_visible(&self, name: &str) -> bool {
        self.contains(name) && self.ancestors(name).all(|(_, record)| record.is_visible)
    }

    /// The entity itself followed by its parent chain up to the root
    pub fn ancestors<'a>(&'a self, name: &'a str) -> Ancestors<'a> {
        Ancestors::new(&self.entities, name)
    }

    // ------------------------------------------------------------------
    // Camera
    // ------------------------------------------------------------------

    #[must_use]
    pub fn camera(&self) -> Option<&str> {
        self.camera.as_deref()
    }

    /// # Errors
    ///
    /// [`StoreError::EntityNotFound`] if no such entity exists
    pub fn set_camera(&mut self, name: &str) -> Result<(), StoreError> {
        if !self.contains(name) {
            return Err(StoreError::EntityNotFound(name.to_string()));
        }
        self.camera = Some(name.to_string());
        Ok(())
    }

    /// Position of the camera entity's Transform, if a camera is set
    #[must_use]
    pub fn camera_position(&self) -> Option<Vec2> {
        let camera = self.camera.as_deref()?;
        self.get_component::<Transform>(camera).map(|t| t.position)
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Construct and attach a `T`, running its `initialize`
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateComponent`] if the entity already has a `T`;
    /// the existing instance is left untouched
    pub fn add_component<T: Component>(&mut self, entity: &str) -> Result<hecs::RefMut<'_, T>, StoreError> {
        let record = self.record(entity)?;
        if record.has_kind(T::KIND) {
            return Err(StoreError::DuplicateComponent {
                entity: entity.to_string(),
                kind: T::KIND,
            });
        }
        let handle = record.handle();

        let component = T::initialize(&mut ComponentInit::new(self, entity))?;
        self.world
            .insert(handle, component)
            .map_err(|_| StoreError::EntityNotFound(entity.to_string()))?;
        self.record_mut(entity)?
            .push_component(ComponentVTable::of::<T>());

        log::debug!("Added {} to {entity}", T::KIND);
        self.world
            .get_mut::<T>(handle)
            .ok_or_else(|| StoreError::EntityNotFound(entity.to_string()))
    }

    /// Attach a component kind looked up by name
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownComponentKind`] if `kind` is not registered, plus
    /// every failure of [`Scene::add_component`]
    pub fn add_component_kind(&mut self, registry: &Registry, entity: &str, kind: &str) -> Result<(), StoreError> {
        let vtable = registry
            .component(kind)
            .ok_or_else(|| StoreError::UnknownComponentKind(kind.to_string()))?;
        (vtable.add)(self, entity)
    }

    #[must_use]
    pub fn get_component<T: Component>(&self, entity: &str) -> Option<hecs::Ref<'_, T>> {
        self.world.get::<T>(self.entities.get(entity)?.handle())
    }

    #[must_use]
    pub fn get_component_mut<T: Component>(&self, entity: &str) -> Option<hecs::RefMut<'_, T>> {
        self.world.get_mut::<T>(self.entities.get(entity)?.handle())
    }

    #[must_use]
    pub fn has_component<T: Component>(&self, entity: &str) -> bool {
        self.has_kind(entity, T::KIND)
    }

    #[must_use]
    pub fn has_kind(&self, entity: &str, kind: &str) -> bool {
        self.entities
            .get(entity)
            .is_some_and(|record| record.has_kind(kind))
    }

    /// Persisted attributes of one component, `is_active` first
    #[must_use]
    pub fn component_fields(&self, entity: &str, kind: &str) -> Option<Mapping> {
        let record = self.entities.get(entity)?;
        let vtable = record.vtable(kind)?;
        (vtable.save)(&self.world, record.handle())
    }

    /// Apply persisted attributes to an attached component
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingComponent`] if the kind is not attached, or
    /// [`StoreError::Value`] if an attribute does not fit
    pub fn load_component_fields(&mut self, entity: &str, kind: &str, fields: Mapping) -> Result<(), StoreError> {
        let record = self.record(entity)?;
        let vtable = record.vtable(kind).ok_or_else(|| StoreError::MissingComponent {
            entity: entity.to_string(),
            kind: kind.to_string(),
        })?;
        (vtable.load)(&self.world, record.handle(), fields).map_err(|source| StoreError::Value {
            entity: entity.to_string(),
            kind: kind.to_string(),
            source,
        })
    }

    /// Every resource path referenced by persisted component state, deduplicated
    #[must_use]
    pub fn resource_paths(&self) -> Vec<ResourcePath> {
        let mut paths = IndexSet::new();
        for record in self.entities.values() {
            for vtable in record.vtables() {
                if let Some(fields) = (vtable.save)(&self.world, record.handle()) {
                    Value::Map(fields).visit_paths(&mut |path| {
                        paths.insert(path.clone());
                    });
                }
            }
        }
        paths.into_iter().collect()
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // ------------------------------------------------------------------
    // Frame passes
    // ------------------------------------------------------------------

    /// Run `start`/`update` on every active component of hierarchy-active entities
    ///
    /// Entities created during the pass are first visited on the next pass,
    /// as are components attached while their entity is being dispatched.
    ///
    /// # Errors
    ///
    /// Fails if a queued command cannot be applied
    pub fn update_entities(&mut self, time: &Time, input: &Input) -> Result<(), StoreError> {
        let mut commands = Commands::new();
        let count = self.entities.len();

        for index in 0..count {
            let Some((name, record)) = self.entities.get_index(index) else {
                break;
            };
            if !self.is_hierarchy_active(name) {
                continue;
            }
            let name = name.clone();
            let handle = record.handle();
            let slots = record.vtables().to_vec();
            let parent_delta = self.parent_delta(&name);

            for vtable in slots {
                if !self.is_hierarchy_active(&name) {
                    break;
                }
                let target = UpdateTarget {
                    entity: handle,
                    name: &name,
                    parent_delta,
                    time,
                    input,
                };
                (vtable.update)(self, &target, &mut commands);
                self.apply_commands(&mut commands)?;
            }
        }
        Ok(())
    }

    /// Run `draw` on every active component of hierarchy-active, visible entities
    ///
    /// # Errors
    ///
    /// Stops at the first component that fails to register its record
    pub fn draw_entities(&self, batch: &mut RenderBatch) -> Result<(), LayerError> {
        for (name, record) in &self.entities {
            if !self.is_hierarchy_active(name) || !self.is_hierarchy_visible(name) {
                continue;
            }
            for vtable in record.vtables() {
                let mut ctx = DrawContext {
                    world: &self.world,
                    entity: record.handle(),
                    name,
                    batch: &mut *batch,
                };
                (vtable.draw)(&mut ctx)?;
            }
        }
        Ok(())
    }

    fn parent_delta(&self, name: &str) -> Vec2 {
        self.parent(name)
            .and_then(|parent| self.get_component::<Transform>(parent))
            .map_or(Vec2::ZERO, |transform| transform.delta())
    }

    fn apply_commands(&mut self, commands: &mut Commands) -> Result<(), StoreError> {
        let queued: Vec<_> = commands.drain().collect();
        for command in queued {
            match command {
                Command::Spawn { name, parent } => {
                    self.add_entity(&name, parent.as_deref())?;
                }
                Command::AddComponent { entity, vtable } => (vtable.add)(self, &entity)?,
                Command::Delete(entity) => self.delete(&entity)?,
                Command::SetActive { entity, active } => self.set_active(&entity, active)?,
                Command::SetVisible { entity, visible } => self.set_visible(&entity, visible)?,
                Command::SwitchScene(scene) => self.request_switch(scene),
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Deactivate an entity and its descendants and queue them for removal
    ///
    /// Nothing leaves the entity table until [`Scene::sweep`] runs.
    ///
    /// # Errors
    ///
    /// [`StoreError::EntityNotFound`] for unknown names
    pub fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        if !self.contains(name) {
            return Err(StoreError::EntityNotFound(name.to_string()));
        }

        let mut stack = vec![name.to_string()];
        while let Some(current) = stack.pop() {
            let Some(record) = self.entities.get_mut(&current) else {
                continue;
            };
            record.is_active = false;
            for vtable in record.vtables() {
                (vtable.set_active)(&self.world, record.handle(), false);
            }
            stack.extend(record.children().iter().map(str::to_string));

            if !self.pending_deletions.contains(&current) {
                self.pending_deletions.push(current);
            }
        }
        Ok(())
    }

    /// Names queued by [`Scene::delete`] and not yet swept
    #[must_use]
    pub fn pending_deletions(&self) -> &[String] {
        &self.pending_deletions
    }

    /// Remove every entity queued for deletion
    ///
    /// Returns how many entities were removed; zero when nothing was pending.
    pub fn sweep(&mut self, batch: &mut RenderBatch) -> usize {
        let pending = std::mem::take(&mut self.pending_deletions);
        let mut removed = 0;

        for name in pending {
            let Some(record) = self.entities.shift_remove(&name) else {
                continue;
            };
            if let Some(parent) = record.parent()
                && let Some(parent) = self.entities.get_mut(parent)
            {
                parent.children_mut().remove(&name);
            }
            if let Err(e) = self.world.despawn(record.handle()) {
                log::warn!("Entity {name} had no component storage: {e}");
            }
            batch.deregister_entity(&name);
            if self.camera.as_deref() == Some(name.as_str()) {
                self.camera = None;
            }

            log::debug!("Removed entity {name} from scene {}", self.name);
            removed += 1;
        }
        removed
    }

    // ------------------------------------------------------------------
    // Scene switching
    // ------------------------------------------------------------------

    /// Ask the runtime to switch to another scene after the current tick
    pub fn request_switch(&mut self, scene: impl Into<String>) {
        self.switch_request = Some(scene.into());
    }

    pub fn take_switch_request(&mut self) -> Option<String> {
        self.switch_request.take()
    }

    fn record(&self, name: &str) -> Result<&EntityRecord, StoreError> {
        self.entities
            .get(name)
            .ok_or_else(|| StoreError::EntityNotFound(name.to_string()))
    }

    fn record_mut(&mut self, name: &str) -> Result<&mut EntityRecord, StoreError> {
        self.entities
            .get_mut(name)
            .ok_or_else(|| StoreError::EntityNotFound(name.to_string()))
    }
}
