//! Frame driver errors

use crate::assets::ResourceError;
use crate::core::ConfigError;
use crate::ecs::{ManagerError, StoreError};
use crate::render::{LayerError, PresentError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no scene is loaded")]
    NoScene,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Present(#[from] PresentError),

    #[error(transparent)]
    Scene(#[from] ManagerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}
