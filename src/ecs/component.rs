//! Component trait and type-erased dispatch
//!
//! Every component kind implements [`Component`]. The scene never names a
//! concrete kind when it dispatches: each attached kind is remembered as a
//! [`ComponentVTable`] of monomorphised function pointers, which is also what
//! the [`Registry`](super::Registry) hands out when a snapshot names a kind.

use std::fmt;

use glam::Vec2;
use hecs::Entity;

use super::commands::Commands;
use super::scene::{Scene, StoreError};
use super::world::World;
use crate::core::Time;
use crate::input::Input;
use crate::render::{LayerError, RenderBatch};
use crate::value::{Mapping, Persist, Value, ValueError, assign};

/// Name of the activation attribute every component persists
pub const IS_ACTIVE: &str = "is_active";

/// Lifecycle flags shared by every component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentState {
    /// Inactive components are skipped by both update and draw
    pub is_active: bool,
    has_started: bool,
}

impl ComponentState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            is_active: true,
            has_started: false,
        }
    }

    /// Whether `start` already ran for this instance
    #[must_use]
    pub const fn has_started(&self) -> bool {
        self.has_started
    }
}

impl Default for ComponentState {
    fn default() -> Self {
        Self::new()
    }
}

/// Behaviour attached to an entity
///
/// `initialize` builds the default instance; `start` runs once right before
/// the first `update`; `draw` runs during the draw pass of visible entities.
pub trait Component: Persist + Send + Sync + Sized + 'static {
    /// Kind tag, unique per registry and written into snapshots
    const KIND: &'static str;

    /// Construct the default instance for a freshly attached component
    ///
    /// # Errors
    ///
    /// Fails if a prerequisite component cannot be added
    fn initialize(init: &mut ComponentInit<'_>) -> Result<Self, StoreError>;

    fn state(&self) -> &ComponentState;

    fn state_mut(&mut self) -> &mut ComponentState;

    fn start(&mut self, _ctx: &mut UpdateContext<'_>) {}

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// # Errors
    ///
    /// Fails if the component registers into an undeclared layer
    fn draw(&mut self, _ctx: &mut DrawContext<'_>) -> Result<(), LayerError> {
        Ok(())
    }
}

/// Access to the owning scene while a component is being constructed
pub struct ComponentInit<'a> {
    scene: &'a mut Scene,
    entity: &'a str,
}

impl<'a> ComponentInit<'a> {
    pub(crate) fn new(scene: &'a mut Scene, entity: &'a str) -> Self {
        Self { scene, entity }
    }

    /// Name of the entity the component is being attached to
    #[must_use]
    pub fn entity(&self) -> &str {
        self.entity
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// Add `T` to the same entity unless it is already present
    ///
    /// # Errors
    ///
    /// Propagates failures from constructing `T`
    pub fn require<T: Component>(&mut self) -> Result<(), StoreError> {
        if !self.scene.has_component::<T>(self.entity) {
            self.scene.add_component::<T>(self.entity)?;
        }
        Ok(())
    }
}

/// The entity and frame one update dispatch runs against
pub(crate) struct UpdateTarget<'a> {
    pub(crate) entity: Entity,
    pub(crate) name: &'a str,
    pub(crate) parent_delta: Vec2,
    pub(crate) time: &'a Time,
    pub(crate) input: &'a Input,
}

/// Everything a component sees during the update pass
///
/// The running component is detached from storage until it returns, so
/// looking up its own kind (on any entity) never conflicts with it. Its own
/// entity reports no component of that kind for the duration.
pub struct UpdateContext<'a> {
    pub(crate) world: &'a World,
    pub(crate) scene: &'a Scene,
    pub(crate) entity: Entity,
    pub(crate) name: &'a str,
    pub(crate) parent_delta: Vec2,
    pub(crate) time: &'a Time,
    pub(crate) input: &'a Input,
    pub(crate) commands: &'a mut Commands,
}

impl<'a> UpdateContext<'a> {
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Name of the entity being updated
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[must_use]
    pub fn time(&self) -> &'a Time {
        self.time
    }

    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.time.delta_seconds()
    }

    #[must_use]
    pub fn input(&self) -> &'a Input {
        self.input
    }

    /// Read-only view of the scene (flags, hierarchy, other entities)
    #[must_use]
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// How far the parent's Transform moved since its previous update
    ///
    /// Zero for root entities.
    #[must_use]
    pub fn parent_delta(&self) -> Vec2 {
        self.parent_delta
    }

    /// Another component of the entity being updated
    #[must_use]
    pub fn component<T: Component>(&self) -> Option<hecs::Ref<'a, T>> {
        self.world.get::<T>(self.entity)
    }

    #[must_use]
    pub fn component_mut<T: Component>(&self) -> Option<hecs::RefMut<'a, T>> {
        self.world.get_mut::<T>(self.entity)
    }

    /// A component of some other entity, looked up by name
    #[must_use]
    pub fn component_of<T: Component>(&self, entity: &str) -> Option<hecs::Ref<'a, T>> {
        let handle = self.scene.entity(entity)?.handle();
        self.world.get::<T>(handle)
    }

    #[must_use]
    pub fn component_of_mut<T: Component>(&self, entity: &str) -> Option<hecs::RefMut<'a, T>> {
        let handle = self.scene.entity(entity)?.handle();
        self.world.get_mut::<T>(handle)
    }

    /// Structural changes, applied as soon as the running component returns
    pub fn commands(&mut self) -> &mut Commands {
        self.commands
    }
}

/// Everything a component sees during the draw pass
pub struct DrawContext<'a> {
    pub(crate) world: &'a World,
    pub(crate) entity: Entity,
    pub(crate) name: &'a str,
    pub(crate) batch: &'a mut RenderBatch,
}

impl<'a> DrawContext<'a> {
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[must_use]
    pub fn component<T: Component>(&self) -> Option<hecs::Ref<'a, T>> {
        self.world.get::<T>(self.entity)
    }

    pub fn batch(&mut self) -> &mut RenderBatch {
        self.batch
    }
}

/// Type-erased entry points for one component kind
#[derive(Clone, Copy)]
pub struct ComponentVTable {
    kind: &'static str,
    pub(crate) add: fn(&mut Scene, &str) -> Result<(), StoreError>,
    pub(crate) update: fn(&mut Scene, &UpdateTarget<'_>, &mut Commands),
    pub(crate) draw: fn(&mut DrawContext<'_>) -> Result<(), LayerError>,
    pub(crate) save: fn(&World, Entity) -> Option<Mapping>,
    pub(crate) load: fn(&World, Entity, Mapping) -> Result<(), ValueError>,
    pub(crate) set_active: fn(&World, Entity, bool),
}

impl ComponentVTable {
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            kind: T::KIND,
            add: add_erased::<T>,
            update: update_erased::<T>,
            draw: draw_erased::<T>,
            save: save_erased::<T>,
            load: load_erased::<T>,
            set_active: set_active_erased::<T>,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }
}

impl fmt::Debug for ComponentVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentVTable").field(&self.kind).finish()
    }
}

fn add_erased<T: Component>(scene: &mut Scene, entity: &str) -> Result<(), StoreError> {
    scene.add_component::<T>(entity).map(|_| ())
}

fn update_erased<T: Component>(scene: &mut Scene, target: &UpdateTarget<'_>, commands: &mut Commands) {
    let active = scene
        .world()
        .get::<T>(target.entity)
        .is_some_and(|component| component.state().is_active);
    if !active {
        return;
    }
    let Some(mut component) = scene.world_mut().take::<T>(target.entity) else {
        return;
    };

    {
        let mut ctx = UpdateContext {
            world: scene.world(),
            scene: &*scene,
            entity: target.entity,
            name: target.name,
            parent_delta: target.parent_delta,
            time: target.time,
            input: target.input,
            commands,
        };
        if !component.state().has_started {
            component.start(&mut ctx);
            component.state_mut().has_started = true;
        }
        component.update(&mut ctx);
    }

    if scene.world_mut().insert(target.entity, component).is_err() {
        log::warn!("Entity {} vanished while its {} was updating", target.name, T::KIND);
    }
}

fn draw_erased<T: Component>(ctx: &mut DrawContext<'_>) -> Result<(), LayerError> {
    let world = ctx.world;
    let Some(mut component) = world.get_mut::<T>(ctx.entity) else {
        return Ok(());
    };
    if !component.state().is_active {
        return Ok(());
    }
    component.draw(ctx)
}

fn save_erased<T: Component>(world: &World, entity: Entity) -> Option<Mapping> {
    let component = world.get::<T>(entity)?;
    let mut fields = Mapping::new();
    fields.insert(IS_ACTIVE.to_string(), Value::Bool(component.state().is_active));
    component.save(&mut fields);
    Some(fields)
}

fn load_erased<T: Component>(world: &World, entity: Entity, fields: Mapping) -> Result<(), ValueError> {
    let Some(mut component) = world.get_mut::<T>(entity) else {
        return Ok(());
    };
    for (field, value) in fields {
        if field == IS_ACTIVE {
            assign(&mut component.state_mut().is_active, value)?;
        } else {
            component.load(&field, value)?;
        }
    }
    Ok(())
}

fn set_active_erased<T: Component>(world: &World, entity: Entity, active: bool) {
    if let Some(mut component) = world.get_mut::<T>(entity) {
        component.state_mut().is_active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Transform;

    #[test]
    fn test_state_defaults() {
        let state = ComponentState::default();
        assert!(state.is_active);
        assert!(!state.has_started());
    }

    #[test]
    fn test_vtable_kind() {
        let vtable = ComponentVTable::of::<Transform>();
        assert_eq!(vtable.kind(), "Transform");
        assert_eq!(format!("{vtable:?}"), "ComponentVTable(\"Transform\")");
    }

    #[test]
    fn test_save_includes_activation_flag_first() {
        let mut scene = Scene::new("test", true);
        scene.add_entity("a", None).unwrap();

        let fields = scene.component_fields("a", Transform::KIND).unwrap();
        assert_eq!(fields.get_index(0), Some((&IS_ACTIVE.to_string(), &Value::Bool(true))));
        assert!(!fields.contains_key("has_started"));
    }
}
