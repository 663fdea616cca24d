//! Common components

use glam::Vec2;

use super::component::{Component, ComponentInit, ComponentState, UpdateContext};
use super::scene::StoreError;
use crate::value::{Mapping, Persist, ToValue, Value, ValueError, assign};

/// Position and scale of an entity
///
/// Every entity receives one on creation. A child follows its parent by
/// applying the parent's frame-over-frame movement to itself, not by
/// recomputing an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    state: ComponentState,
    /// Position in world space
    pub position: Vec2,
    /// Position at the start of the current update
    pub prev_position: Vec2,
    /// Scale factor applied to the sprite
    pub scale: Vec2,
}

impl Transform {
    /// Create a transform at the origin
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            prev_position: position,
            ..Default::default()
        }
    }

    /// Movement since the previous update
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.position - self.prev_position
    }

    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Translate by a delta
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            state: ComponentState::new(),
            position: Vec2::ZERO,
            prev_position: Vec2::ZERO,
            scale: Vec2::ONE,
        }
    }
}

impl Persist for Transform {
    fn save(&self, fields: &mut Mapping) {
        fields.insert("position".into(), self.position.to_value());
        fields.insert("prev_position".into(), self.prev_position.to_value());
        fields.insert("scale".into(), self.scale.to_value());
    }

    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "position" => assign(&mut self.position, value),
            "prev_position" => assign(&mut self.prev_position, value),
            "scale" => assign(&mut self.scale, value),
            _ => Err(ValueError::unknown_field(Self::KIND, field)),
        }
    }
}

impl Component for Transform {
    const KIND: &'static str = "Transform";

    fn initialize(_init: &mut ComponentInit<'_>) -> Result<Self, StoreError> {
        Ok(Self::default())
    }

    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn start(&mut self, _ctx: &mut UpdateContext<'_>) {
        self.prev_position = self.position;
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.prev_position = self.position;
        let parent_delta = ctx.parent_delta();
        if parent_delta != Vec2::ZERO {
            self.translate(parent_delta);
        }
    }
}

/// Free-form designer data attached to an entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    state: ComponentState,
    pub values: Mapping,
}

impl Properties {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToValue) {
        self.values.insert(key.into(), value.to_value());
    }
}

impl Persist for Properties {
    fn save(&self, fields: &mut Mapping) {
        fields.insert("values".into(), Value::Map(self.values.clone()));
    }

    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "values" => assign(&mut self.values, value),
            _ => Err(ValueError::unknown_field(Self::KIND, field)),
        }
    }
}

impl Component for Properties {
    const KIND: &'static str = "Properties";

    fn initialize(_init: &mut ComponentInit<'_>) -> Result<Self, StoreError> {
        Ok(Self::default())
    }

    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_defaults() {
        let transform = Transform::new();
        assert_eq!(transform.position, Vec2::ZERO);
        assert_eq!(transform.scale, Vec2::ONE);
        assert_eq!(transform.delta(), Vec2::ZERO);
    }

    #[test]
    fn test_transform_delta() {
        let mut transform = Transform::from_position(Vec2::new(1.0, 1.0));
        transform.translate(Vec2::new(2.0, -1.0));
        assert_eq!(transform.delta(), Vec2::new(2.0, -1.0));

        transform.move_to(Vec2::new(0.0, 0.0));
        assert_eq!(transform.delta(), Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn test_transform_persisted_fields() {
        let mut transform = Transform::new();
        transform.set_scale(Vec2::new(2.0, 0.5));

        let fields = transform.to_fields();
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["position", "prev_position", "scale"]);
        assert_eq!(fields["scale"], Value::Pair(2.0, 0.5));

        let mut back = Transform::new();
        back.load_all(fields).unwrap();
        assert_eq!(back, transform);
    }

    #[test]
    fn test_properties_set_get() {
        let mut properties = Properties::default();
        properties.set("hp", 10_i64);
        properties.set("name", "slime");

        assert_eq!(properties.get("hp"), Some(&Value::Int(10)));
        assert_eq!(properties.to_fields()["values"], Value::Map(properties.values.clone()));
    }
}
