#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Culling
//!
//! Renders a 10×10×10 chunk of unit cubes with wgpu and only draws the cubes inside
//! the camera's view frustum.
//!
//! ## Key Modules
//!
//! * `config` - JSON engine configuration
//! * `engine_state` - frustum, cube hierarchy, traversal, camera and renderer
//! * `application_state` - window lifecycle and graphics bring-up
//!
//! ## Culling
//!
//! Every frame the six frustum planes are extracted from `projection * view`. The
//! chunk's box is tested first; inside it every cube is point-tested. The octree
//! traversal (toggle with T) box-tests split nodes and skips whole subtrees.
//!
//! ```no_run
//! fn main() {
//!     if let Err(err) = voxel_culling::run() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```
//!
//! The culling core needs no GPU:
//!
//! ```
//! use cgmath::{perspective, Deg, Matrix4, Point3, Vector3};
//! use voxel_culling::engine_state::{
//!     culling::{render_chunk, CullingStats, Frustum},
//!     rendering::CubeDrawer,
//!     voxels::chunk::Chunk,
//! };
//!
//! struct Count(u32);
//! impl CubeDrawer for Count {
//!     fn draw(&mut self, _model: &Matrix4<f32>) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let view = Matrix4::look_at_rh(
//!     Point3::new(4.5, 4.5, 30.0),
//!     Point3::new(4.5, 4.5, 4.5),
//!     Vector3::unit_y(),
//! );
//! let frustum = Frustum::from_view_projection(&(perspective(Deg(60.0), 1.0, 0.1, 100.0) * view), 0.9);
//! let mut stats = CullingStats::default();
//! let mut drawer = Count(0);
//! render_chunk(&Chunk::generate(Point3::new(0, 0, 0)), &frustum, &mut drawer, &mut stats);
//! assert_eq!(drawer.0, 1000);
//! ```

use application_state::{graphics_resources_builder::GraphicsBuilder, ApplicationState};
use log::info;
use winit::event_loop::EventLoop;

mod application_state;
pub mod config;
pub mod engine_state;
pub mod error;

pub use application_state::graphics_resources_builder::GraphicsError;
pub use config::{ConfigError, EngineConfig};
pub use error::EngineError;

/// Starts the logger, loads configuration and runs the window until it closes.
///
/// The configuration comes from the file named by `VOXEL_CULLING_CONFIG`, or
/// `culling_config.json` in the working directory; a missing file means defaults.
pub fn run() -> Result<(), EngineError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = EngineConfig::load_or_default(&EngineConfig::config_path())?;
    let shader_source =
        std::fs::read_to_string(&config.shader_path).map_err(|source| EngineError::Shader {
            path: config.shader_path.clone(),
            source,
        })?;

    let event_loop = EventLoop::with_user_event().build()?;
    let mut state = ApplicationState::new(
        GraphicsBuilder::new(event_loop.create_proxy()),
        config,
        shader_source,
    );

    event_loop.run_app(&mut state)?;
    state.into_result()
}
