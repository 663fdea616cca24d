//! Entity hierarchy links
//!
//! Parent and child links are plain entity names resolved through the
//! scene's entity table. The scene owns every entity; links never do.

use smallvec::SmallVec;

use super::entity::{EntityRecord, EntityTable};

/// Names of an entity's direct children, in attachment order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(SmallVec<[String; 4]>);

impl Children {
    /// Create an empty children list
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Add a child
    pub fn add(&mut self, child: impl Into<String>) {
        let child = child.into();
        if !self.contains(&child) {
            self.0.push(child);
        }
    }

    /// Remove a child
    pub fn remove(&mut self, child: &str) -> bool {
        if let Some(pos) = self.0.iter().position(|c| c == child) {
            self.0.remove(pos);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn contains(&self, child: &str) -> bool {
        self.0.iter().any(|c| c == child)
    }

    /// Check if this entity has children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of children
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over children
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Walks from an entity up to its root, yielding the entity itself first
pub struct Ancestors<'a> {
    table: &'a EntityTable,
    next: Option<&'a str>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(table: &'a EntityTable, start: &'a str) -> Self {
        Self {
            table,
            next: Some(start),
        }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (&'a str, &'a EntityRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.next.take()?;
        let (name, record) = self.table.get_key_value(name)?;
        self.next = record.parent();
        Some((name.as_str(), record))
    }
}
