//! Top-level error type returned by [`crate::run`].

use std::path::PathBuf;

use crate::{application_state::graphics_resources_builder::GraphicsError, config::ConfigError};

/// Everything that can stop the engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The configuration file could not be used
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The cube shader could not be read
    #[error("Failed to read shader {path}: {source}")]
    Shader {
        /// Shader file that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Window or GPU bring-up failed
    #[error("Graphics initialization failed: {0}")]
    Graphics(#[from] GraphicsError),

    /// The event loop could not be created or run
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The surface failed in a way the engine cannot recover from
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
