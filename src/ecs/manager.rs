//! Scene construction and scene switching
//!
//! [`SceneBuilder`] is the offline side: scenes are assembled in memory and
//! written out as snapshots. [`SceneManager`] is the runtime side: it knows
//! where each snapshot lives and keeps exactly one scene current.

use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::registry::Registry;
use super::scene::Scene;
use crate::codec::{self, SceneLoadError};

/// File extension of scene snapshots
pub const SCENE_EXTENSION: &str = "scene";

/// Errors raised while building, saving or switching scenes
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("scene `{0}` already exists")]
    DuplicateScene(String),

    #[error("scene `{0}` not found")]
    SceneNotFound(String),

    #[error("no main scene")]
    NoMainScene,

    #[error(transparent)]
    Load(#[from] SceneLoadError),

    #[error("failed to write {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// In-memory scenes waiting to be written as snapshots
#[derive(Debug, Default)]
pub struct SceneBuilder {
    scenes: IndexMap<String, Scene>,
}

impl SceneBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new empty scene
    ///
    /// # Errors
    ///
    /// [`ManagerError::DuplicateScene`] if the name is taken
    pub fn create_scene(&mut self, name: &str, is_main: bool) -> Result<&mut Scene, ManagerError> {
        if self.scenes.contains_key(name) {
            return Err(ManagerError::DuplicateScene(name.to_string()));
        }
        let entry = self.scenes.entry(name.to_string());
        Ok(entry.or_insert_with(|| Scene::new(name, is_main)))
    }

    #[must_use]
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    /// Write every scene to `<dir>/<name>.scene`
    ///
    /// Returns the written paths in creation order.
    ///
    /// # Errors
    ///
    /// [`ManagerError::Save`] on the first file that cannot be written
    pub fn save_all(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ManagerError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| ManagerError::Save {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.scenes.len());
        for (name, scene) in &self.scenes {
            let path = dir.join(name).with_extension(SCENE_EXTENSION);
            codec::save_scene(scene, &path).map_err(|source| ManagerError::Save {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }
        log::info!("Saved {} scene(s) to {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Owns the current scene and loads others from their snapshots
#[derive(Debug)]
pub struct SceneManager {
    registry: Registry,
    snapshots: IndexMap<String, PathBuf>,
    current: Option<Scene>,
}

impl SceneManager {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            snapshots: IndexMap::new(),
            current: None,
        }
    }

    /// Register every `*.scene` file in `dir` under its file stem
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be read
    pub fn discover(&mut self, dir: impl AsRef<Path>) -> io::Result<usize> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == SCENE_EXTENSION))
            .collect();
        paths.sort();

        let mut found = 0;
        for path in paths {
            if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
                self.snapshots.insert(name.to_string(), path.clone());
                found += 1;
            }
        }
        Ok(found)
    }

    pub fn add_snapshot(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.snapshots.insert(name.into(), path.into());
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }

    /// Load the first snapshot whose header marks it as the main scene
    ///
    /// # Errors
    ///
    /// [`ManagerError::NoMainScene`] if none does, or the load failure of
    /// the first snapshot that cannot be read
    pub fn load_main(&mut self) -> Result<&mut Scene, ManagerError> {
        let mut main = None;
        for path in self.snapshots.values() {
            let scene = codec::load_scene(path, &self.registry)?;
            if scene.is_main() {
                main = Some(scene);
                break;
            }
        }
        let scene = main.ok_or(ManagerError::NoMainScene)?;
        log::info!("Loaded main scene {}", scene.name());
        Ok(self.current.insert(scene))
    }

    /// Replace the current scene with the snapshot registered as `name`
    ///
    /// # Errors
    ///
    /// [`ManagerError::SceneNotFound`] for unknown names; the current scene
    /// is kept if loading fails
    pub fn switch_scene(&mut self, name: &str) -> Result<&mut Scene, ManagerError> {
        let path = self
            .snapshots
            .get(name)
            .ok_or_else(|| ManagerError::SceneNotFound(name.to_string()))?;
        let scene = codec::load_scene(path, &self.registry)?;
        log::info!("Switched to scene {name}");
        Ok(self.current.insert(scene))
    }

    /// Make an in-memory scene current without a snapshot
    pub fn set_current(&mut self, scene: Scene) -> &mut Scene {
        self.current.insert(scene)
    }

    #[must_use]
    pub fn current(&self) -> Option<&Scene> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Scene> {
        self.current.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::ecs::Transform;

    fn builder() -> SceneBuilder {
        let mut builder = SceneBuilder::new();
        let title = builder.create_scene("title", true).unwrap();
        title.add_entity("logo", None).unwrap();

        let level = builder.create_scene("level", false).unwrap();
        level.add_entity("player", None).unwrap();
        level
            .get_component_mut::<Transform>("player")
            .unwrap()
            .move_to(Vec2::new(8.0, 4.0));
        builder
    }

    #[test]
    fn test_duplicate_scene() {
        let mut builder = builder();
        let err = builder.create_scene("title", false).unwrap_err();
        assert!(matches!(err, ManagerError::DuplicateScene(name) if name == "title"));
        assert!(builder.scene("title").unwrap().is_main());
    }

    #[test]
    fn test_save_discover_and_switch() {
        let dir = tempfile::tempdir().unwrap();
        let written = builder().save_all(dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("title.scene"));

        let mut manager = SceneManager::new(Registry::with_builtins());
        assert_eq!(manager.discover(dir.path()).unwrap(), 2);

        assert_eq!(manager.load_main().unwrap().name(), "title");

        let level = manager.switch_scene("level").unwrap();
        assert_eq!(
            level.get_component::<Transform>("player").unwrap().position,
            Vec2::new(8.0, 4.0)
        );
        assert_eq!(manager.current().unwrap().name(), "level");

        let err = manager.switch_scene("credits").unwrap_err();
        assert!(matches!(err, ManagerError::SceneNotFound(_)));
        assert_eq!(manager.current().unwrap().name(), "level");
    }

    #[test]
    fn test_no_main_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = SceneBuilder::new();
        builder.create_scene("level", false).unwrap();
        builder.save_all(dir.path()).unwrap();

        let mut manager = SceneManager::new(Registry::with_builtins());
        manager.discover(dir.path()).unwrap();
        assert!(matches!(manager.load_main(), Err(ManagerError::NoMainScene)));
    }

    #[test]
    fn test_missing_snapshot_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = SceneManager::new(Registry::with_builtins());
        manager.add_snapshot("ghost", dir.path().join("ghost.scene"));

        let err = manager.switch_scene("ghost").unwrap_err();
        assert!(matches!(err, ManagerError::Load(SceneLoadError::Io { .. })));
    }
}
