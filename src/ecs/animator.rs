//! Frame-based sprite animation

use indexmap::IndexMap;

use super::component::{Component, ComponentInit, ComponentState, UpdateContext};
use super::scene::StoreError;
use super::sprite::SpriteRenderer;
use crate::assets::{ResourceError, ResourceLoader};
use crate::value::{
    FromValue, Mapping, Persist, PersistObject, ResourcePath, ToValue, Value, ValueError, assign,
};

/// Errors raised while editing or playing animations
#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    #[error("animation `{0}` already exists")]
    DuplicateKey(String),

    #[error("animation `{0}` not found")]
    KeyNotFound(String),

    #[error("animation `{name}` has invalid fps {fps}")]
    InvalidFps { name: String, fps: f64 },

    #[error("animation `{0}` has no frames")]
    EmptyAnimation(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// A named sequence of sprite frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    pub sprites: Vec<ResourcePath>,
    pub fps: f64,
}

impl Animation {
    /// Seconds each frame stays on screen
    #[must_use]
    pub fn frame_time(&self) -> f64 {
        1.0 / self.fps
    }
}

impl Persist for Animation {
    fn save(&self, fields: &mut Mapping) {
        fields.insert("sprites".into(), self.sprites.to_value());
        fields.insert("fps".into(), self.fps.to_value());
    }

    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "sprites" => assign(&mut self.sprites, value),
            "fps" => assign(&mut self.fps, value),
            _ => Err(ValueError::unknown_field(Self::TYPE_NAME, field)),
        }
    }
}

impl PersistObject for Animation {
    const TYPE_NAME: &'static str = "Animation";
}

impl ToValue for Animation {
    fn to_value(&self) -> Value {
        Value::Object(self.to_object())
    }
}

impl FromValue for Animation {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Self::from_object_value(value)
    }
}

/// Plays [`Animation`]s through the entity's [`SpriteRenderer`]
#[derive(Debug, Clone, Default)]
pub struct SpriteAnimator {
    state: ComponentState,
    animations: IndexMap<String, Animation>,
    current: Option<String>,
    animate: bool,
    frame_time: f64,
    progress: f64,
    current_index: usize,
    repeat: bool,
    default_sprite: Option<ResourcePath>,
    /// Frame to push into the renderer on the next update
    pending_frame: Option<Option<ResourcePath>>,
}

impl SpriteAnimator {
    /// Register an animation, loading every frame through `loader`
    ///
    /// # Errors
    ///
    /// [`AnimationError::DuplicateKey`] if the name is taken,
    /// [`AnimationError::InvalidFps`] unless `fps` is positive and finite,
    /// [`AnimationError::EmptyAnimation`] without frames, and
    /// [`AnimationError::Resource`] if a frame fails to load
    pub fn add_animation<P: Into<ResourcePath>>(
        &mut self,
        name: &str,
        fps: f64,
        paths: impl IntoIterator<Item = P>,
        loader: &mut impl ResourceLoader,
    ) -> Result<(), AnimationError> {
        if self.animations.contains_key(name) {
            return Err(AnimationError::DuplicateKey(name.to_string()));
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(AnimationError::InvalidFps {
                name: name.to_string(),
                fps,
            });
        }

        let sprites: Vec<ResourcePath> = paths.into_iter().map(Into::into).collect();
        if sprites.is_empty() {
            return Err(AnimationError::EmptyAnimation(name.to_string()));
        }
        for sprite in &sprites {
            loader.load_image(sprite)?;
        }

        self.animations
            .insert(name.to_string(), Animation { sprites, fps });
        Ok(())
    }

    /// Start playing `name` from its first frame
    ///
    /// # Errors
    ///
    /// [`AnimationError::KeyNotFound`] for unknown names; playback state is
    /// left unchanged
    pub fn switch_animation(&mut self, name: &str, repeat: bool) -> Result<(), AnimationError> {
        let animation = self
            .animations
            .get(name)
            .ok_or_else(|| AnimationError::KeyNotFound(name.to_string()))?;

        self.frame_time = animation.frame_time();
        self.pending_frame = Some(animation.sprites.first().cloned());
        self.current = Some(name.to_string());
        self.animate = true;
        self.progress = 0.0;
        self.current_index = 0;
        self.repeat = repeat;
        Ok(())
    }

    /// Stop playback and restore the default sprite
    pub fn stop_animation(&mut self) {
        self.current = None;
        self.animate = false;
        self.frame_time = 0.0;
        self.progress = 0.0;
        self.current_index = 0;
        self.repeat = false;
        self.pending_frame = Some(self.default_sprite.clone());
    }

    #[must_use]
    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.animate
    }

    #[must_use]
    pub fn default_sprite(&self) -> Option<&ResourcePath> {
        self.default_sprite.as_ref()
    }

    fn current_frame(&self) -> Option<ResourcePath> {
        let animation = self.animations.get(self.current.as_deref()?)?;
        animation.sprites.get(self.current_index).cloned()
    }

    fn advance(&mut self, delta: f64) {
        if !self.animate {
            return;
        }
        let length = self
            .current
            .as_deref()
            .and_then(|name| self.animations.get(name))
            .map_or(0, |animation| animation.sprites.len());
        if length == 0 {
            self.stop_animation();
            return;
        }

        self.progress += delta;
        if self.progress >= self.frame_time {
            self.progress -= self.frame_time;
            if self.current_index + 1 >= length {
                if self.repeat {
                    self.current_index = 0;
                } else {
                    self.stop_animation();
                    return;
                }
            } else {
                self.current_index += 1;
            }
        }
        self.pending_frame = Some(self.current_frame());
    }
}

impl Persist for SpriteAnimator {
    fn save(&self, fields: &mut Mapping) {
        fields.insert("animations".into(), self.animations.to_value());
        fields.insert("current".into(), self.current.to_value());
        fields.insert("animate".into(), self.animate.to_value());
        fields.insert("frame_time".into(), self.frame_time.to_value());
        fields.insert("progress".into(), self.progress.to_value());
        fields.insert("current_index".into(), self.current_index.to_value());
        fields.insert("repeat".into(), self.repeat.to_value());
        fields.insert("default_sprite".into(), self.default_sprite.to_value());
    }

    fn load(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "animations" => assign(&mut self.animations, value),
            "current" => assign(&mut self.current, value),
            "animate" => assign(&mut self.animate, value),
            "frame_time" => assign(&mut self.frame_time, value),
            "progress" => assign(&mut self.progress, value),
            "current_index" => assign(&mut self.current_index, value),
            "repeat" => assign(&mut self.repeat, value),
            "default_sprite" => assign(&mut self.default_sprite, value),
            _ => Err(ValueError::unknown_field(Self::KIND, field)),
        }
    }
}

impl Component for SpriteAnimator {
    const KIND: &'static str = "SpriteAnimator";

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

    fn start(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.default_sprite.is_none()
            && let Some(renderer) = ctx.component::<SpriteRenderer>()
        {
            self.default_sprite = renderer.sprite().cloned();
        }
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.advance(f64::from(ctx.delta_seconds()));

        if let Some(frame) = self.pending_frame.take()
            && let Some(mut renderer) = ctx.component_mut::<SpriteRenderer>()
        {
            renderer.set_sprite_path(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::assets::ImageCache;
    use crate::core::Time;
    use crate::ecs::Scene;
    use crate::input::Input;
    use image::RgbaImage;

    fn cache() -> ImageCache {
        let mut cache = ImageCache::new();
        for path in ["res/idle.png", "res/walk_0.png", "res/walk_1.png"] {
            cache.insert(path, RgbaImage::new(2, 2));
        }
        cache
    }

    fn walker() -> SpriteAnimator {
        let mut animator = SpriteAnimator::default();
        animator
            .add_animation("walk", 10.0, ["res/walk_0.png", "res/walk_1.png"], &mut cache())
            .unwrap();
        animator
    }

    #[test]
    fn test_add_animation_errors() {
        let mut cache = cache();
        let mut animator = walker();

        let err = animator
            .add_animation("walk", 10.0, ["res/idle.png"], &mut cache)
            .unwrap_err();
        assert!(matches!(err, AnimationError::DuplicateKey(_)));

        let err = animator
            .add_animation("run", 0.0, ["res/idle.png"], &mut cache)
            .unwrap_err();
        assert!(matches!(err, AnimationError::InvalidFps { .. }));

        let err = animator
            .add_animation("jump", 8.0, Vec::<ResourcePath>::new(), &mut cache)
            .unwrap_err();
        assert!(matches!(err, AnimationError::EmptyAnimation(_)));

        let err = animator
            .add_animation("swim", 8.0, ["res/missing.png"], &mut cache)
            .unwrap_err();
        assert!(matches!(err, AnimationError::Resource(ResourceError::NotFound(_))));
        assert!(animator.animation("swim").is_none());
    }

    #[test]
    fn test_switch_to_unknown_leaves_state() {
        let mut animator = walker();
        animator.switch_animation("walk", true).unwrap();
        animator.advance(0.1);
        assert_eq!(animator.current_index(), 1);

        let err = animator.switch_animation("fly", false).unwrap_err();
        assert!(matches!(err, AnimationError::KeyNotFound(name) if name == "fly"));
        assert_eq!(animator.current(), Some("walk"));
        assert_eq!(animator.current_index(), 1);
        assert!(animator.is_playing());
    }

    #[test]
    fn test_repeat_wraps() {
        let mut animator = walker();
        animator.switch_animation("walk", true).unwrap();
        animator.advance(0.1);
        animator.advance(0.1);
        assert_eq!(animator.current_index(), 0);
        assert!(animator.is_playing());
    }

    #[test]
    fn test_plays_through_renderer_and_restores_default() {
        let mut scene = Scene::new("level", true);
        scene.add_entity("hero", None).unwrap();
        scene
            .add_component::<SpriteRenderer>("hero")
            .unwrap()
            .set_sprite_path(Some("res/idle.png".into()));
        {
            let mut animator = scene.add_component::<SpriteAnimator>("hero").unwrap();
            *animator = walker();
            animator.switch_animation("walk", false).unwrap();
        }

        let mut time = Time::new();
        time.advance(Duration::from_millis(100));
        let input = Input::new();
        let sprite = |scene: &Scene| {
            scene
                .get_component::<SpriteRenderer>("hero")
                .unwrap()
                .sprite()
                .map(|p| p.as_str().to_string())
        };

        scene.update_entities(&time, &input).unwrap();
        assert_eq!(sprite(&scene).as_deref(), Some("res/walk_1.png"));
        assert_eq!(
            scene.get_component::<SpriteAnimator>("hero").unwrap().default_sprite(),
            Some(&ResourcePath::new("res/idle.png"))
        );

        scene.update_entities(&time, &input).unwrap();
        assert_eq!(sprite(&scene).as_deref(), Some("res/idle.png"));
        assert!(!scene.get_component::<SpriteAnimator>("hero").unwrap().is_playing());
    }

    #[test]
    fn test_animation_object_roundtrip() {
        let animation = walker().animation("walk").cloned().unwrap();
        let value = animation.to_value();
        assert!(matches!(&value, Value::Object(object) if object.type_name == "Animation"));
        assert_eq!(Animation::from_value(value).unwrap(), animation);
    }
}
