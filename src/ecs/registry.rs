//! Closed registry of component kinds
//!
//! Snapshots name component kinds by string. Only kinds registered here
//! can be rebuilt when a snapshot is read; games add their own kinds before
//! loading any scene.

use rustc_hash::FxHashMap;

use super::animator::{Animation, SpriteAnimator};
use super::component::{Component, ComponentVTable};
use super::components::{Properties, Transform};
use super::sprite::{SpriteCollider, SpriteRenderer};
use crate::value::{PersistObject, TypeRegistry};

/// Component kinds and nested object types known to the runtime
#[derive(Debug, Clone)]
pub struct Registry {
    components: FxHashMap<&'static str, ComponentVTable>,
    types: TypeRegistry,
}

impl Registry {
    /// Registry with no kinds at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            components: FxHashMap::default(),
            types: TypeRegistry::new(),
        }
    }

    /// Registry with every built-in component kind and object type
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register::<Transform>();
        registry.register::<SpriteRenderer>();
        registry.register::<SpriteAnimator>();
        registry.register::<SpriteCollider>();
        registry.register::<Properties>();
        registry.register_type::<Animation>();
        registry
    }

    /// Register a component kind under [`Component::KIND`]
    pub fn register<T: Component>(&mut self) {
        log::debug!("Registered component kind {}", T::KIND);
        self.components.insert(T::KIND, ComponentVTable::of::<T>());
    }

    /// Register a nested object type for snapshot reading
    pub fn register_type<T: PersistObject>(&mut self) {
        self.types.register::<T>();
    }

    #[must_use]
    pub fn component(&self, kind: &str) -> Option<ComponentVTable> {
        self.components.get(kind).copied()
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.components.contains_key(kind)
    }

    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.keys().copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = Registry::default();
        for kind in [
            "Transform",
            "SpriteRenderer",
            "SpriteAnimator",
            "SpriteCollider",
            "Properties",
        ] {
            assert!(registry.contains(kind), "{kind} missing");
        }
        assert!(registry.types().contains("Animation"));
        assert!(registry.component("Rigidbody").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = Registry::empty();
        assert_eq!(registry.kinds().count(), 0);
        assert!(!registry.types().contains("Animation"));
    }
}
