//! Entity-component store
//!
//! Component values are stored in hecs; the scene keeps entity names, flags,
//! hierarchy links and the attachment order of component kinds.

mod animator;
mod commands;
mod component;
mod components;
mod entity;
mod hierarchy;
mod manager;
mod registry;
mod scene;
mod sprite;
mod world;

pub use animator::{Animation, AnimationError, SpriteAnimator};
pub use commands::{Command, Commands};
pub use component::{
    Component, ComponentInit, ComponentState, ComponentVTable, DrawContext, IS_ACTIVE,
    UpdateContext,
};
pub use components::{Properties, Transform};
pub use entity::{EntityRecord, EntityTable};
pub use hierarchy::{Ancestors, Children};
pub use manager::{ManagerError, SCENE_EXTENSION, SceneBuilder, SceneManager};
pub use registry::Registry;
pub use scene::{Scene, StoreError};
pub use sprite::{SpriteCollider, SpriteRenderer};
pub use world::World;
