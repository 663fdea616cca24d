//! Conversions between field types and [`Value`]

use glam::Vec2;
use indexmap::IndexMap;

use super::{Mapping, ResourcePath, Value, ValueError};

/// Encode a field as a [`Value`]
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Decode a field from a [`Value`]
pub trait FromValue: Sized {
    /// # Errors
    ///
    /// Returns an error if the value has the wrong shape for `Self`
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ValueError::mismatch("bool", &other)),
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(i64::try_from(*self).unwrap_or(i64::MAX))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| ValueError::OutOfRange(i)),
                        other => Err(ValueError::mismatch("int", &other)),
                    }
                }
            }
        )*
    };
}

impl_integer!(i32, i64, u32, u64, usize);

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f),
            // Authored snapshots often write whole numbers without a decimal point
            Value::Int(i) => Ok(i as f64),
            other => Err(ValueError::mismatch("float", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(ValueError::mismatch("string", &other)),
        }
    }
}

impl ToValue for (f64, f64) {
    fn to_value(&self) -> Value {
        Value::Pair(self.0, self.1)
    }
}

impl FromValue for (f64, f64) {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Pair(x, y) => Ok((x, y)),
            other => Err(ValueError::mismatch("pair", &other)),
        }
    }
}

impl ToValue for Vec2 {
    fn to_value(&self) -> Value {
        Value::Pair(f64::from(self.x), f64::from(self.y))
    }
}

impl FromValue for Vec2 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let (x, y) = <(f64, f64)>::from_value(value)?;
        Ok(Self::new(x as f32, y as f32))
    }
}

impl ToValue for ResourcePath {
    fn to_value(&self) -> Value {
        Value::Path(self.clone())
    }
}

impl FromValue for ResourcePath {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Path(path) => Ok(path),
            other => Err(ValueError::mismatch("path", &other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::mismatch("sequence", &other)),
        }
    }
}

impl<T: ToValue> ToValue for IndexMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect::<Mapping>(),
        )
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(key, value)| T::from_value(value).map(|value| (key, value)))
                .collect(),
            other => Err(ValueError::mismatch("mapping", &other)),
        }
    }
}
