//! Image cache and loader
//!
//! Images are keyed by the resource path written into scene snapshots.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use rustc_hash::FxHashMap;

use super::handle::ImageHandle;
use crate::value::ResourcePath;

/// Errors raised while loading resources
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// No file exists at the resolved path
    #[error("resource not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be decoded
    #[error("failed to decode {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },
}

/// Loads images by resource path
pub trait ResourceLoader {
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if the path does not resolve to a
    /// file, or [`ResourceError::Decode`] if it is not a supported image
    fn load_image(&mut self, path: &ResourcePath) -> Result<ImageHandle, ResourceError>;
}

/// De-duplicating image store
#[derive(Debug)]
pub struct ImageCache {
    /// Directory that relative resource paths are resolved against
    root: PathBuf,
    images: FxHashMap<ResourcePath, ImageHandle>,
}

impl ImageCache {
    /// Cache resolving paths against the working directory
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(".")
    }

    #[must_use]
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            images: FxHashMap::default(),
        }
    }

    /// Register an in-memory image under `path`, replacing any previous one
    pub fn insert(&mut self, path: impl Into<ResourcePath>, image: RgbaImage) -> ImageHandle {
        let path = path.into();
        let handle = ImageHandle::new(path.clone(), image);
        self.images.insert(path, handle.clone());
        handle
    }

    /// Look up an already loaded image without touching the disk
    #[must_use]
    pub fn get(&self, path: &ResourcePath) -> Option<&ImageHandle> {
        self.images.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &ResourcePath) -> bool {
        self.images.contains_key(path)
    }

    /// Load every path not yet cached
    ///
    /// Returns the number of images read from disk.
    ///
    /// # Errors
    ///
    /// Stops at the first path that fails to load
    pub fn preload<'a>(
        &mut self,
        paths: impl IntoIterator<Item = &'a ResourcePath>,
    ) -> Result<usize, ResourceError> {
        let mut loaded = 0;
        for path in paths {
            if !self.contains(path) {
                self.load_image(path)?;
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    fn resolve(&self, path: &ResourcePath) -> PathBuf {
        self.root.join(path.as_str())
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader for ImageCache {
    fn load_image(&mut self, path: &ResourcePath) -> Result<ImageHandle, ResourceError> {
        if let Some(handle) = self.images.get(path) {
            return Ok(handle.clone());
        }

        let file = self.resolve(path);
        if !file.is_file() {
            return Err(ResourceError::NotFound(file));
        }

        let image = image::open(&file)
            .map_err(|e| ResourceError::Decode {
                path: file.clone(),
                message: e.to_string(),
            })?
            .to_rgba8();

        log::debug!("Loaded image {} ({}x{})", path, image.width(), image.height());
        Ok(self.insert(path.clone(), image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ImageCache::with_root(dir.path());

        let err = cache.load_image(&"missing.png".into()).unwrap_err();
        assert!(matches!(err, ResourceError::NotFound(_)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_from_disk_is_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(3, 5, Rgba([0, 255, 0, 255]))
            .save(dir.path().join("green.png"))
            .unwrap();

        let mut cache = ImageCache::with_root(dir.path());
        let path = ResourcePath::new("green.png");

        let first = cache.load_image(&path).unwrap();
        let second = cache.load_image(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.size(), (3, 5));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not an image").unwrap();

        let mut cache = ImageCache::with_root(dir.path());
        let err = cache.load_image(&"bad.png".into()).unwrap_err();
        assert!(matches!(err, ResourceError::Decode { .. }));
    }

    #[test]
    fn test_preload_skips_cached() {
        let mut cache = ImageCache::new();
        let path = ResourcePath::new("mem/player.png");
        cache.insert(path.clone(), RgbaImage::new(2, 2));

        assert_eq!(cache.preload([&path]).unwrap(), 0);
        assert!(cache.get(&path).is_some());
    }
}
