//! Rendering module
//!
//! Software 2D compositing: sprite renderers register live records into
//! ordered layers, and each frame the batch blits them onto a [`Surface`]
//! that a [`Presenter`] shows, in a window or headless.

mod batch;
mod presenter;
mod surface;
mod window;

pub use batch::{Blit, LayerError, MAX_SPRITE_SIDE, RenderBatch, RenderRecord};
pub use presenter::{HeadlessPresenter, PresentError, Presenter};
pub use surface::{Color, Surface};
pub use window::WindowPresenter;
