//! Resource loading
//!
//! Provides handle-based image storage with:
//! - Shared, cheaply clonable image handles tagged with their path
//! - Path de-duplication
//! - Up-front preloading so the frame loop never reads from disk

mod cache;
mod handle;

pub use cache::{ImageCache, ResourceError, ResourceLoader};
pub use handle::ImageHandle;
