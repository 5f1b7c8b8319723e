//! Engine configuration loaded from TOML.
//!
//! Every section has defaults matching the demo scene, so a missing file or a
//! partially filled file both produce a usable configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// File-backed configuration.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` file.
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        ensure_toml(path)?;
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a `.toml` file.
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        ensure_toml(path)?;
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn ensure_toml(path: &Path) -> Result<(), ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(()),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub renderer: RendererConfig,
    pub camera: CameraConfig,
    pub scene: SceneConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Loads the file at `path`, or returns defaults if it does not exist.
    ///
    /// Parse errors are still reported.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "vkengine".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Enables the Khronos validation layer when it is installed.
    pub enable_validation: bool,
    pub max_frames_in_flight: usize,
    /// Capacity of the per-frame dynamic object uniform buffer.
    pub max_instance_count: usize,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            max_frames_in_flight: 2,
            max_instance_count: 100,
            vertex_shader: "shaders/scene.vert.spv".to_string(),
            fragment_shader: "shaders/scene.frag.spv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second.
    pub move_speed: f32,
    pub fast_speed_multiplier: f32,
    /// Degrees per second.
    pub turn_speed_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 200.0,
            move_speed: 4.0,
            fast_speed_multiplier: 2.0,
            turn_speed_degrees: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub spawn_count: usize,
    /// Objects spawn inside a cube of this half-extent.
    pub spawn_size: f32,
    pub rotation_speed_degrees: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            spawn_count: 2,
            spawn_size: 3.0,
            rotation_speed_degrees: 20.0,
        }
    }
}
