//! Shared image handles

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;

use crate::value::ResourcePath;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// A decoded RGBA image and the resource path it was registered under
///
/// Clones share the pixels. Equality and hashing use the load ID, so
/// reloading the same path yields a distinct handle.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    id: u64,
    path: ResourcePath,
    image: Arc<RgbaImage>,
}

impl ImageHandle {
    #[must_use]
    pub fn new(path: ResourcePath, image: RgbaImage) -> Self {
        Self {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            path,
            image: Arc::new(image),
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    #[must_use]
    pub fn get(&self) -> &RgbaImage {
        &self.image
    }

    /// Pixel dimensions of the image
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageHandle {}

impl Hash for ImageHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::ops::Deref for ImageHandle {
    type Target = RgbaImage;

    fn deref(&self) -> &Self::Target {
        &self.image
    }
}
