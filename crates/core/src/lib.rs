//! Core utilities for the vkengine renderer.
//!
//! This crate provides foundational types shared by every other crate:
//! - Error types and result aliases
//! - Logging initialization
//! - Engine configuration (TOML)
//! - Clock and random services, bundled into an explicit [`EngineContext`]

pub mod config;
mod clock;
mod context;
mod error;
mod logging;
mod random;

pub use clock::Clock;
pub use config::{
    CameraConfig, Config, ConfigError, EngineConfig, RendererConfig, SceneConfig, WindowConfig,
};
pub use context::EngineContext;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use random::Random;
