//! Scene snapshot codec
//!
//! Scenes are persisted as tab-indented, line-oriented text:
//!
//! ```text
//! [scene]
//!     name=level
//!     camera=player
//!     is_main=True
//!     [entity]
//!         name=player
//!         is_active=True
//!         is_visible=True
//!         parent=None
//!         [component]
//!             type=Transform
//!             position=(0.0, 0.0)
//!         [/component]
//!     [/entity]
//! [/scene]
//! ```
//!
//! Attribute values are scalars or nested blocks: `{` .. `}attr` for
//! mappings, `[` .. `]attr` for sequences and `[Type]` .. `[/Type]` for
//! typed objects. Entities are written in creation order so every parent
//! precedes its children.

mod literal;
mod reader;
mod tags;
mod writer;

pub use literal::{LiteralError, decode_scalar, encode_scalar};
pub use reader::read_scene;
pub use writer::write_scene;

use std::io;
use std::path::{Path, PathBuf};

use crate::ecs::{Registry, Scene, StoreError};
use crate::value::ValueError;

/// Errors loading a scene snapshot
///
/// A failed load never yields a partially built scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneLoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected end of snapshot, expected `{expected}`")]
    UnexpectedEnd { expected: String },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: closing tag `{found}` does not match `{expected}`")]
    MismatchedTag {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("line {line}: type `{name}` is not registered")]
    TypeNotRegistered { line: usize, name: String },

    #[error("line {line}: {source}")]
    Value {
        line: usize,
        #[source]
        source: ValueError,
    },

    #[error("line {line}: {source}")]
    Store {
        line: usize,
        #[source]
        source: StoreError,
    },

    #[error("camera entity `{0}` not found")]
    UnresolvedCamera(String),
}

/// Write a scene snapshot to `path`
///
/// # Errors
///
/// Propagates the I/O error
pub fn save_scene(scene: &Scene, path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    std::fs::write(path, write_scene(scene))?;
    log::info!("Saved scene {} to {}", scene.name(), path.display());
    Ok(())
}

/// Read a scene snapshot from `path`
///
/// # Errors
///
/// [`SceneLoadError::Io`] if the file cannot be read, or any parse failure
pub fn load_scene(path: impl AsRef<Path>, registry: &Registry) -> Result<Scene, SceneLoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SceneLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let scene = read_scene(&text, registry)?;
    log::info!(
        "Loaded scene {} ({} entities) from {}",
        scene.name(),
        scene.len(),
        path.display()
    );
    Ok(scene)
}
