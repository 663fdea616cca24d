//! A 2D sprite game runtime built in Rust
//!
//! This crate provides:
//! - Named entities with ordered, type-erased components over hecs
//! - A line-oriented scene snapshot format
//! - Layered software compositing of sprites
//! - A frame driver and input handling with winit

pub mod assets;
pub mod codec;
pub mod core;
pub mod ecs;
pub mod input;
pub mod render;
pub mod value;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use image;
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::assets::{ImageCache, ImageHandle, ResourceLoader};
    pub use crate::codec::{load_scene, save_scene};
    pub use crate::core::{Engine, EngineConfig, EngineError, Game, Runtime, Time};
    pub use crate::ecs::{
        Animation, Commands, Component, ComponentInit, ComponentState, DrawContext, Properties,
        Registry, Scene, SceneBuilder, SceneManager, SpriteAnimator, SpriteCollider,
        SpriteRenderer, StoreError, Transform, UpdateContext,
    };
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::render::{Color, HeadlessPresenter, Presenter, RenderBatch, Surface, WindowPresenter};
    pub use crate::value::{Mapping, Persist, ResourcePath, ToValue, Value, ValueError, assign};
    pub use glam::Vec2;
}
