//! Closed registry of nested object types
//!
//! Snapshot readers can only rebuild typed objects whose name was registered
//! here at start-up.

use rustc_hash::FxHashMap;

use super::{Mapping, Object, PersistObject, ValueError};

/// Builds a typed object from its named construction parameters
pub type ObjectFactory = fn(Mapping) -> Result<Object, ValueError>;

fn construct<T: PersistObject>(fields: Mapping) -> Result<Object, ValueError> {
    T::from_fields(fields).map(|object| object.to_object())
}

/// Mapping from type name to factory
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    factories: FxHashMap<&'static str, ObjectFactory>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under [`PersistObject::TYPE_NAME`]
    pub fn register<T: PersistObject>(&mut self) {
        log::debug!("Registered object type {}", T::TYPE_NAME);
        self.factories.insert(T::TYPE_NAME, construct::<T>);
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Construct a registered type from its fields
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::TypeNotRegistered`] for unknown names, or the
    /// factory's error if the fields do not fit the type
    pub fn construct(&self, type_name: &str, fields: Mapping) -> Result<Object, ValueError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| ValueError::TypeNotRegistered(type_name.to_string()))?;
        factory(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Persist, Value};

    #[derive(Default)]
    struct Marker {
        weight: i64,
    }

    impl Persist for Marker {
        fn save(&self, fields: &mut Mapping) {
            fields.insert("weight".into(), Value::Int(self.weight));
        }

        fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
            match field {
                "weight" => crate::value::assign(&mut self.weight, value),
                _ => Err(ValueError::unknown_field("Marker", field)),
            }
        }
    }

    impl PersistObject for Marker {
        const TYPE_NAME: &'static str = "Marker";
    }

    #[test]
    fn test_construct_registered() {
        let mut registry = TypeRegistry::new();
        registry.register::<Marker>();

        let mut fields = Mapping::new();
        fields.insert("weight".into(), Value::Int(7));

        let object = registry.construct("Marker", fields).unwrap();
        assert_eq!(object.type_name, "Marker");
        assert_eq!(object.fields["weight"], Value::Int(7));
    }

    #[test]
    fn test_unregistered_type() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.construct("Marker", Mapping::new()),
            Err(ValueError::TypeNotRegistered("Marker".into()))
        );
    }
}
