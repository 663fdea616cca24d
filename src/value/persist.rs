//! Explicit persistence declarations
//!
//! Types list the fields they persist instead of having every attribute
//! inspected at runtime. Fields that only make sense while the scene is
//! running (bookkeeping flags, handles to other live objects) are simply
//! left out of [`Persist::save`].

use super::{FromValue, Mapping, Object, Value, ValueError};

/// A type whose persistent fields can be saved to and loaded from a [`Mapping`]
pub trait Persist {
    /// Append every persistent field, in declaration order
    fn save(&self, fields: &mut Mapping);

    /// Restore a single persistent field
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownField`] for names the type does not
    /// persist, or a conversion error if the value has the wrong shape
    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError>;

    /// Persistent fields as a fresh mapping
    fn to_fields(&self) -> Mapping {
        let mut fields = Mapping::new();
        self.save(&mut fields);
        fields
    }

    /// Restore every field of `fields`
    ///
    /// # Errors
    ///
    /// Stops at the first field that fails to load
    fn load_all(&mut self, fields: Mapping) -> Result<(), ValueError> {
        fields
            .into_iter()
            .try_for_each(|(field, value)| self.load(&field, value))
    }
}

/// A persistable value type that nests inside component state as a typed object
pub trait PersistObject: Persist + Default {
    /// Name written into snapshots and looked up in the type registry
    const TYPE_NAME: &'static str;

    fn to_object(&self) -> Object {
        Object::new(Self::TYPE_NAME, self.to_fields())
    }

    /// Build from named construction parameters
    ///
    /// # Errors
    ///
    /// Fails if any parameter is unknown or has the wrong shape
    fn from_fields(fields: Mapping) -> Result<Self, ValueError> {
        let mut object = Self::default();
        object.load_all(fields)?;
        Ok(object)
    }

    /// Decode from a [`Value::Object`] carrying this type's name
    ///
    /// # Errors
    ///
    /// Fails on any other value or a different type name
    fn from_object_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Object(object) if object.type_name == Self::TYPE_NAME => {
                Self::from_fields(object.fields)
            }
            other => Err(ValueError::mismatch(Self::TYPE_NAME, &other)),
        }
    }
}

/// Read a field through [`FromValue`] into `slot`
///
/// # Errors
///
/// Propagates the conversion error
pub fn assign<T: FromValue>(slot: &mut T, value: Value) -> Result<(), ValueError> {
    *slot = T::from_value(value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ToValue;

    #[derive(Debug, Default, PartialEq)]
    struct Waypoint {
        label: String,
        wait: f64,
    }

    impl Persist for Waypoint {
        fn save(&self, fields: &mut Mapping) {
            fields.insert("label".into(), self.label.to_value());
            fields.insert("wait".into(), self.wait.to_value());
        }

        fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
            match field {
                "label" => assign(&mut self.label, value),
                "wait" => assign(&mut self.wait, value),
                _ => Err(ValueError::unknown_field(Self::TYPE_NAME, field)),
            }
        }
    }

    impl PersistObject for Waypoint {
        const TYPE_NAME: &'static str = "Waypoint";
    }

    #[test]
    fn test_object_roundtrip() {
        let waypoint = Waypoint {
            label: "gate".into(),
            wait: 1.5,
        };

        let object = waypoint.to_object();
        assert_eq!(object.type_name, "Waypoint");
        assert_eq!(object.fields.keys().collect::<Vec<_>>(), ["label", "wait"]);

        let back = Waypoint::from_object_value(Value::Object(object)).unwrap();
        assert_eq!(back, waypoint);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut fields = Mapping::new();
        fields.insert("speed".into(), Value::Int(3));

        let err = Waypoint::from_fields(fields).unwrap_err();
        assert_eq!(err, ValueError::unknown_field("Waypoint", "speed"));
    }

    #[test]
    fn test_wrong_type_name_rejected() {
        let object = Object::new("Other", Mapping::new());
        assert!(Waypoint::from_object_value(Value::Object(object)).is_err());
    }
}
