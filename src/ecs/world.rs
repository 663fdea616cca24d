//! Component arena backed by hecs
//!
//! Component values are stored per (entity handle, component type). All
//! lookups take `&self`; hecs checks borrows per column at runtime, so two
//! different component types of one entity can be borrowed mutably at once.
//! A column stays borrowed while any of its values is, which is why the
//! update pass detaches the running component with [`World::take`].

use hecs::Entity;

/// Storage for every component value of a scene
pub struct World {
    inner: hecs::World,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Reserve a handle for a new entity with no components
    pub fn spawn_empty(&mut self) -> Entity {
        self.inner.spawn(())
    }

    /// Drop an entity and every component it owns
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Attach a component value to an entity
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale
    pub fn insert<T: hecs::Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert_one(entity, component)
    }

    /// Detach a component value, leaving the entity without a `T`
    pub fn take<T: hecs::Component>(&mut self, entity: Entity) -> Option<T> {
        self.inner.remove_one::<T>(entity).ok()
    }

    #[must_use]
    pub fn get<T: hecs::Component>(&self, entity: Entity) -> Option<hecs::Ref<'_, T>> {
        self.inner.get::<&T>(entity).ok()
    }

    #[must_use]
    pub fn get_mut<T: hecs::Component>(&self, entity: Entity) -> Option<hecs::RefMut<'_, T>> {
        self.inner.get::<&mut T>(entity).ok()
    }

    #[must_use]
    pub fn has<T: hecs::Component>(&self, entity: Entity) -> bool {
        self.inner
            .entity(entity)
            .is_ok_and(|entity| entity.has::<T>())
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Number of live entity handles
    #[must_use]
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World").field("entities", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_despawn() {
        let mut world = World::new();
        let entity = world.spawn_empty();

        world.insert(entity, 5_u32).unwrap();
        assert!(world.has::<u32>(entity));
        assert!(!world.has::<i64>(entity));
        assert_eq!(*world.get::<u32>(entity).unwrap(), 5);

        *world.get_mut::<u32>(entity).unwrap() = 6;
        assert_eq!(*world.get::<u32>(entity).unwrap(), 6);

        world.despawn(entity).unwrap();
        assert!(!world.contains(entity));
        assert!(world.get::<u32>(entity).is_none());
    }

    #[test]
    fn test_take_and_reinsert() {
        let mut world = World::new();
        let entity = world.spawn_empty();
        world.insert(entity, 7_u32).unwrap();

        assert_eq!(world.take::<u32>(entity), Some(7));
        assert!(!world.has::<u32>(entity));
        assert_eq!(world.take::<u32>(entity), None);

        world.insert(entity, 8_u32).unwrap();
        assert_eq!(*world.get::<u32>(entity).unwrap(), 8);
    }

    #[test]
    fn test_distinct_columns_borrow_together() {
        let mut world = World::new();
        let entity = world.spawn_empty();
        world.insert(entity, 1_u32).unwrap();
        world.insert(entity, 2_i64).unwrap();

        let mut a = world.get_mut::<u32>(entity).unwrap();
        let mut b = world.get_mut::<i64>(entity).unwrap();
        *a += 1;
        *b += 1;
        assert_eq!((*a, *b), (2, 3));
    }
}
