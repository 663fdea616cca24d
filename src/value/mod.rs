//! Value model for persisted component state
//!
//! Every persisted attribute is converted into a [`Value`] before it is
//! written to a scene snapshot, and converted back when the snapshot is read.

mod convert;
mod persist;
mod registry;

pub use convert::{FromValue, ToValue};
pub use persist::{Persist, PersistObject, assign};
pub use registry::{ObjectFactory, TypeRegistry};

use std::fmt;

use indexmap::IndexMap;

/// String-keyed mapping that keeps insertion order
pub type Mapping = IndexMap<String, Value>;

/// A dynamically typed persisted value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Two-tuple of numbers
    Pair(f64, f64),
    /// Ordered sequence
    Seq(Vec<Value>),
    /// String-keyed mapping
    Map(Mapping),
    /// Nested typed object, constructible through a [`TypeRegistry`]
    Object(Object),
    /// Handle to an on-disk resource
    Path(ResourcePath),
}

impl Value {
    /// Short name of the variant, used in error messages
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Pair(..) => "pair",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
            Self::Object(_) => "object",
            Self::Path(_) => "path",
        }
    }

    /// Check for [`Value::Null`]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Visit every resource path reachable from this value
    pub fn visit_paths<'a>(&'a self, visit: &mut impl FnMut(&'a ResourcePath)) {
        match self {
            Self::Path(path) => visit(path),
            Self::Seq(items) => items.iter().for_each(|item| item.visit_paths(visit)),
            Self::Map(map) => map.values().for_each(|item| item.visit_paths(visit)),
            Self::Object(object) => object
                .fields
                .values()
                .for_each(|item| item.visit_paths(visit)),
            _ => {}
        }
    }
}

/// A nested typed object: its registered type name and its persisted fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    pub type_name: String,
    pub fields: Mapping,
}

impl Object {
    #[must_use]
    pub fn new(type_name: impl Into<String>, fields: Mapping) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }
}

/// Path to a resource file, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResourcePath(String);

impl ResourcePath {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::path::Path> for ResourcePath {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl From<&str> for ResourcePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ResourcePath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Errors converting between [`Value`] and concrete field types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// The value has the wrong shape for the target field
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A persisted attribute the type does not declare
    #[error("type `{type_name}` has no persisted field `{field}`")]
    UnknownField { type_name: String, field: String },

    /// A typed object whose type name is not in the registry
    #[error("type `{0}` is not registered")]
    TypeNotRegistered(String),

    /// Integer does not fit the target field
    #[error("integer {0} is out of range")]
    OutOfRange(i64),
}

impl ValueError {
    /// Shorthand for a [`ValueError::TypeMismatch`] against `found`
    #[must_use]
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.kind_name(),
        }
    }

    /// Shorthand for a [`ValueError::UnknownField`]
    #[must_use]
    pub fn unknown_field(type_name: &str, field: &str) -> Self {
        Self::UnknownField {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }
    }
}
