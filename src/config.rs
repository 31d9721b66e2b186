//! # Engine Configuration
//!
//! Window, camera, culling and world settings, read from a JSON file. Every field
//! has a default, so a file only needs the values it changes and a missing file
//! means "all defaults".
//!
//! ```json
//! {
//!     "frustum_margin": 0.5,
//!     "camera": { "fov_degrees": 60.0 },
//!     "world": { "traversal": "octree", "octree_shape": "sparse" }
//! }
//! ```

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::world::TraversalMode;

/// Environment variable holding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "VOXEL_CULLING_CONFIG";
/// Configuration file read when [`CONFIG_PATH_ENV`] is not set.
pub const DEFAULT_CONFIG_PATH: &str = "culling_config.json";
/// Deepest octree the world builder accepts (8^6 leaves when fully split).
pub const MAX_OCTREE_DEPTH: u32 = 6;

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The values parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How the octree test tree is subdivided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OctreeShape {
    /// Every node split down to the configured depth
    #[default]
    Full,
    /// Only octants 0, 3, 5 and 7 keep splitting
    Sparse,
}

/// Window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Base window title; runtime stats are appended to it
    pub title: String,
    /// Initial inner width in pixels
    pub width: u32,
    /// Initial inner height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("Voxel Engine"),
            width: 1200,
            height: 800,
        }
    }
}

/// Camera start pose, lens and controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Start position in world space
    pub position: [f32; 3],
    /// Start yaw in degrees
    pub yaw_degrees: f32,
    /// Start pitch in degrees
    pub pitch_degrees: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping distance
    pub near: f32,
    /// Far clipping distance
    pub far: f32,
    /// Movement speed in units per second
    pub speed: f32,
    /// Mouse look in degrees per pixel
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [-3.0, 3.0, 3.0],
            yaw_degrees: -44.0,
            pitch_degrees: -29.0,
            fov_degrees: 90.0,
            near: 0.1,
            far: 100.0,
            speed: 3.0,
            sensitivity: 0.1,
        }
    }
}

/// What gets built and how it is traversed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Origin of the single chunk
    pub chunk_origin: [i32; 3],
    /// Traversal used at startup (toggle with T)
    pub traversal: TraversalMode,
    /// Split depth of the octree test tree
    pub octree_depth: u32,
    /// Split pattern of the octree test tree
    pub octree_shape: OctreeShape,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_origin: [0, 0, 0],
            traversal: TraversalMode::Grid,
            octree_depth: 3,
            octree_shape: OctreeShape::Full,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window settings
    pub window: WindowConfig,
    /// WGSL file with `vs_main` and `fs_main`
    pub shader_path: PathBuf,
    /// Outward inflation of every frustum plane, in world units
    pub frustum_margin: f32,
    /// Camera settings
    pub camera: CameraConfig,
    /// World settings
    pub world: WorldConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shader_path: PathBuf::from("assets/shaders/cube_shader.wgsl"),
            frustum_margin: 0.9,
            camera: CameraConfig::default(),
            world: WorldConfig::default(),
        }
    }
}

impl EngineConfig {
    /// The configuration path: [`CONFIG_PATH_ENV`] if set, else [`DEFAULT_CONFIG_PATH`].
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Parses and validates configuration JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Like [`EngineConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid(format!(
                "clip planes need 0 < near < far, got near {} far {}",
                camera.near, camera.far
            )));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "field of view {} must be between 0 and 180 degrees",
                camera.fov_degrees
            )));
        }
        if !self.frustum_margin.is_finite() {
            return Err(ConfigError::Invalid(String::from(
                "frustum margin must be finite",
            )));
        }
        if self.world.octree_depth > MAX_OCTREE_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "octree depth {} exceeds {}",
                self.world.octree_depth, MAX_OCTREE_DEPTH
            )));
        }
        Ok(())
    }
}
