//! Core engine module
//!
//! Contains the frame driver, frame timing and configuration

mod config;
mod engine;
mod error;
mod runtime;
mod stats;
mod time;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, Game};
pub use error::EngineError;
pub use runtime::Runtime;
pub use stats::FrameStats;
pub use time::Time;
