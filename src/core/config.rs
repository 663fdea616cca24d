//! Engine configuration
//!
//! Stored as RON; fields missing from a file take their default value.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::render::Color;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("failed to parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Target frames per second (0 for unlimited)
    pub target_fps: u32,
    /// Directory scanned for scene snapshots
    pub scene_dir: PathBuf,
    /// Fill colour of the surface before compositing
    pub clear_color: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("Kestrel"),
            width: 640,
            height: 480,
            target_fps: 60,
            scene_dir: PathBuf::from("scenes"),
            clear_color: Color::BLACK,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    #[must_use]
    pub fn with_scene_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scene_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Time budget of one frame, `None` when unlimited
    #[must_use]
    pub fn frame_duration(&self) -> Option<std::time::Duration> {
        (self.target_fps > 0).then(|| std::time::Duration::from_secs(1) / self.target_fps)
    }

    /// Save the configuration to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a configuration from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ron_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let config = EngineConfig::default()
            .with_title("Meadow")
            .with_size(320, 200)
            .with_clear_color(Color::rgb(10, 20, 30));

        config.save_ron(&path).unwrap();
        assert_eq!(EngineConfig::load_ron(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        std::fs::write(&path, "(title: \"Tiny\", width: 64)").unwrap();

        let config = EngineConfig::load_ron(&path).unwrap();
        assert_eq!(config.title, "Tiny");
        assert_eq!(config.width, 64);
        assert_eq!(config.height, EngineConfig::default().height);
        assert_eq!(config.clear_color, Color::BLACK);
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        std::fs::write(&path, "(width: \"wide\")").unwrap();

        assert!(matches!(
            EngineConfig::load_ron(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_frame_duration() {
        let config = EngineConfig::default().with_target_fps(50);
        assert_eq!(config.frame_duration(), Some(std::time::Duration::from_millis(20)));
        assert_eq!(config.with_target_fps(0).frame_duration(), None);
    }
}
