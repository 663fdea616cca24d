//! Entity metadata kept by the scene

use hecs::Entity;
use indexmap::IndexMap;

use super::component::ComponentVTable;
use super::hierarchy::Children;

/// Insertion-ordered table of every entity in a scene, keyed by name
pub type EntityTable = IndexMap<String, EntityRecord>;

/// Flags, links and attached component kinds of one entity
#[derive(Debug, Clone)]
pub struct EntityRecord {
    handle: Entity,
    pub is_active: bool,
    pub is_visible: bool,
    parent: Option<String>,
    children: Children,
    components: Vec<ComponentVTable>,
}

impl EntityRecord {
    pub(crate) fn new(handle: Entity, parent: Option<String>) -> Self {
        Self {
            handle,
            is_active: true,
            is_visible: true,
            parent,
            children: Children::new(),
            components: Vec::new(),
        }
    }

    /// Handle into the scene's component arena
    #[must_use]
    pub const fn handle(&self) -> Entity {
        self.handle
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[must_use]
    pub fn children(&self) -> &Children {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Children {
        &mut self.children
    }

    /// Attached component kinds in attachment order
    pub fn component_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.iter().map(ComponentVTable::kind)
    }

    #[must_use]
    pub fn has_kind(&self, kind: &str) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }

    pub(crate) fn vtables(&self) -> &[ComponentVTable] {
        &self.components
    }

    pub(crate) fn vtable(&self, kind: &str) -> Option<&ComponentVTable> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    pub(crate) fn push_component(&mut self, vtable: ComponentVTable) {
        self.components.push(vtable);
    }
}
