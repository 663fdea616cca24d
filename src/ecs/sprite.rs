//! Sprite rendering and collision components

use glam::Vec2;

use super::component::{Component, ComponentInit, ComponentState, DrawContext};
use super::components::Transform;
use super::scene::StoreError;
use crate::assets::{ResourceError, ResourceLoader};
use crate::render::{LayerError, RenderRecord};
use crate::value::{Mapping, Persist, ResourcePath, ToValue, Value, ValueError, assign};

/// Draws an image at its entity's Transform
///
/// The first draw with a sprite set registers one live record into `layer`;
/// later draws are no-ops until the layer changes or the batch is cleared.
#[derive(Debug, Clone, Default)]
pub struct SpriteRenderer {
    state: ComponentState,
    sprite: Option<ResourcePath>,
    layer: String,
    pub flip_x: bool,
    pub flip_y: bool,
    registered_layer: Option<String>,
}

impl SpriteRenderer {
    #[must_use]
    pub fn sprite(&self) -> Option<&ResourcePath> {
        self.sprite.as_ref()
    }

    /// Show the image at `path`, loading it through `loader`
    ///
    /// # Errors
    ///
    /// Propagates [`ResourceError::NotFound`] and decode failures; the
    /// current sprite is kept on error
    pub fn set_sprite(
        &mut self,
        path: impl Into<ResourcePath>,
        loader: &mut impl ResourceLoader,
    ) -> Result<(), ResourceError> {
        let path = path.into();
        loader.load_image(&path)?;
        self.sprite = Some(path);
        Ok(())
    }

    /// Swap the sprite path without touching the loader
    ///
    /// The image must already be cached before the next composite.
    pub fn set_sprite_path(&mut self, path: Option<ResourcePath>) {
        self.sprite = path;
    }

    #[must_use]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn set_layer(&mut self, layer: impl Into<String>) {
        self.layer = layer.into();
    }

    pub fn flip(&mut self, flip_x: bool, flip_y: bool) {
        self.flip_x = flip_x;
        self.flip_y = flip_y;
    }
}

impl Persist for SpriteRenderer {
    fn save(&self, fields: &mut Mapping) {
        fields.insert("sprite".into(), self.sprite.to_value());
        fields.insert("layer".into(), self.layer.to_value());
        fields.insert("flip_x".into(), self.flip_x.to_value());
        fields.insert("flip_y".into(), self.flip_y.to_value());
    }

    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "sprite" => assign(&mut self.sprite, value),
            "layer" => assign(&mut self.layer, value),
            "flip_x" => assign(&mut self.flip_x, value),
            "flip_y" => assign(&mut self.flip_y, value),
            _ => Err(ValueError::unknown_field(Self::KIND, field)),
        }
    }
}

impl Component for SpriteRenderer {
    const KIND: &'static str = "SpriteRenderer";

    fn initialize(_init: &mut ComponentInit<'_>) -> Result<Self, StoreError> {
        Ok(Self::default())
    }

    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<(), LayerError> {
        let (entity, name) = (ctx.entity(), ctx.name());
        if self.sprite.is_none()
            || (self.registered_layer.as_deref() == Some(self.layer.as_str())
                && ctx.batch().is_registered(&self.layer, name))
        {
            return Ok(());
        }

        if let Some(old) = self.registered_layer.take() {
            ctx.batch().deregister(&old, name);
        }
        ctx.batch()
            .register(RenderRecord::new(entity, name, self.layer.clone()))?;
        self.registered_layer = Some(self.layer.clone());
        Ok(())
    }
}

/// Axis-aligned box collider on top of a sprite
///
/// The box spans `offset .. offset + size` in sprite pixels, scaled by the
/// Transform and placed at its position. A zero size never overlaps.
#[derive(Debug, Clone, Default)]
pub struct SpriteCollider {
    state: ComponentState,
    pub size: Vec2,
    pub offset: Vec2,
    contacts: Vec<String>,
}

impl SpriteCollider {
    /// World-space `(min, max)` corners for a Transform
    #[must_use]
    pub fn bounds(&self, transform: &Transform) -> (Vec2, Vec2) {
        let min = transform.position + self.offset * transform.scale;
        (min, min + self.size * transform.scale)
    }

    /// Names of colliders overlapping this one after the last collision pass
    #[must_use]
    pub fn contacts(&self) -> &[String] {
        &self.contacts
    }

    #[must_use]
    pub fn is_touching(&self, other: &str) -> bool {
        self.contacts.iter().any(|c| c == other)
    }

    pub(crate) fn contacts_mut(&mut self) -> &mut Vec<String> {
        &mut self.contacts
    }
}

impl Persist for SpriteCollider {
    fn save(&self, fields: &mut Mapping) {
        fields.insert("size".into(), self.size.to_value());
        fields.insert("offset".into(), self.offset.to_value());
    }

    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "size" => assign(&mut self.size, value),
            "offset" => assign(&mut self.offset, value),
            _ => Err(ValueError::unknown_field(Self::KIND, field)),
        }
    }
}

impl Component for SpriteCollider {
    const KIND: &'static str = "SpriteCollider";

    fn initialize(init: &mut ComponentInit<'_>) -> Result<Self, StoreError> {
        init.require::<SpriteRenderer>()?;
        Ok(Self::default())
    }

    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<(), LayerError> {
        let Some(renderer) = ctx.component::<SpriteRenderer>() else {
            return Ok(());
        };
        if renderer.registered_layer.is_none() {
            return Ok(());
        }
        let layer = renderer.layer.clone();
        drop(renderer);

        let name = ctx.name();
        if !ctx.batch().is_collider(&layer, name) {
            ctx.batch().register_collider(&layer, name)?;
        }
        Ok(())
    }
}
