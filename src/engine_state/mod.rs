//! # Engine State Module
//!
//! The per-window engine: GPU handles, camera, world, frustum and renderer.
//!
//! ## Key Components
//!
//! * `EngineState` - owns every subsystem and runs the frame
//! * `camera_state` - camera, projection and free-fly controls
//! * `culling` - frustum planes and the frustum-gated traversal
//! * `rendering` - the draw contract and its instanced wgpu implementation
//! * `voxels` - cubes, hierarchy nodes, the chunk grid and the world
//!
//! ## Frame
//!
//! 1. Input moves the camera (`process_input`)
//! 2. The frustum is re-derived from `projection * view`
//! 3. The world is traversed; visible leaves are queued on the renderer
//! 4. The renderer draws the queue in one instanced call and presents
//! 5. Once per second, FPS and culling counters go to the title and the log

use std::sync::Arc;

use log::{debug, info, warn};
use web_time::Duration;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, MouseButton},
    keyboard::KeyCode,
    window::Window,
};

use crate::config::EngineConfig;

use camera_state::CameraState;
use culling::{frustum::Frustum, traversal::CullingStats};
use rendering::CubeRenderer;
use voxels::world::{TraversalMode, World};

pub mod camera_state;
pub mod culling;
pub mod rendering;
pub mod voxels;

/// How often FPS and culling counters are published.
pub const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// Counts frames and reports the average rate once per interval.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    interval: Duration,
    elapsed: Duration,
    frames: u32,
}

impl FrameTimer {
    /// A timer reporting every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            frames: 0,
        }
    }

    /// Records one frame that took `dt`.
    ///
    /// # Returns
    /// The frames per second over the interval that just completed, if one did
    pub fn record(&mut self, dt: Duration) -> Option<f32> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return None;
        }

        let fps = self.frames as f32 / self.elapsed.as_secs_f32();
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        Some(fps)
    }
}

/// What became of a frame after [`CubeRenderer::end_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was presented with this many cubes
    Presented(u32),
    /// The surface is lost or outdated and must be reconfigured
    Reconfigure,
    /// Nothing was presented; try again next frame
    Skipped,
}

impl FrameOutcome {
    /// Sorts the result of ending a frame.
    ///
    /// # Returns
    /// `Err` only for out-of-memory, which the engine cannot continue after
    pub fn classify(result: Result<u32, wgpu::SurfaceError>) -> Result<Self, wgpu::SurfaceError> {
        match result {
            Ok(drawn) => Ok(FrameOutcome::Presented(drawn)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                Ok(FrameOutcome::Reconfigure)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(wgpu::SurfaceError::OutOfMemory),
            Err(err) => {
                warn!("Surface error {:?}, skipping frame", err);
                Ok(FrameOutcome::Skipped)
            }
        }
    }

    /// The counters to publish for this frame, `None` when nothing reached the screen.
    ///
    /// The visible count is what was actually drawn.
    pub fn presented_stats(self, culled: CullingStats) -> Option<CullingStats> {
        match self {
            FrameOutcome::Presented(drawn) => Some(CullingStats {
                visible_cubes: drawn,
                ..culled
            }),
            FrameOutcome::Reconfigure | FrameOutcome::Skipped => None,
        }
    }
}

/// The main state container for the running engine.
pub struct EngineState {
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    device: Device,
    queue: Queue,
    window: Arc<Window>,
    /// Camera, projection and controls
    pub camera_state: CameraState,
    /// Planes of the current frame
    pub frustum: Frustum,
    /// The chunk and the octree
    pub world: World,
    /// Structure traversed each frame
    pub traversal_mode: TraversalMode,
    renderer: CubeRenderer,
    config: EngineConfig,
    frame_timer: FrameTimer,
    last_stats: CullingStats,
    last_frame: web_time::Instant,
}

impl EngineState {
    /// Creates a new engine state with all subsystems initialized.
    ///
    /// # Arguments
    /// * `window` - The window being rendered to
    /// * `surface` - A surface already configured with `surface_config`
    /// * `surface_config` - Configuration for the rendering surface
    /// * `device` - The GPU device
    /// * `queue` - The GPU command queue
    /// * `shader_source` - WGSL source for the cube pipeline
    /// * `config` - Engine configuration
    pub fn new(
        window: Arc<Window>,
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
        shader_source: &str,
        config: EngineConfig,
    ) -> Self {
        let camera_state =
            CameraState::new(&config, surface_config.width, surface_config.height);
        let world = World::new(&config.world);

        let mut renderer =
            CubeRenderer::new(&device, &surface_config, surface_config.format, shader_source);
        renderer.init_geometry(&device);

        let traversal_mode = config.world.traversal;

        Self {
            surface,
            surface_config,
            device,
            queue,
            window,
            camera_state,
            frustum: Frustum::new(),
            world,
            traversal_mode,
            renderer,
            config,
            frame_timer: FrameTimer::new(STATS_INTERVAL),
            last_stats: CullingStats::default(),
            last_frame: web_time::Instant::now(),
        }
    }

    /// Resizes the rendering surface when the window size changes.
    ///
    /// Zero-sized windows (minimized) are ignored.
    pub fn resize_surface(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.camera_state.resize(size.width, size.height);
        self.renderer.resize(&self.device, &self.surface_config);
    }

    /// Handles a keyboard key change.
    ///
    /// Movement keys go to the camera controller; a fresh press of T switches the
    /// traversal mode.
    pub fn handle_keyboard(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        if self
            .camera_state
            .camera_controller
            .process_keyboard(key, state)
        {
            return;
        }
        if key == KeyCode::KeyT && state == ElementState::Pressed && !repeat {
            self.traversal_mode = self.traversal_mode.toggled();
            info!("Traversal mode: {:?}", self.traversal_mode);
        }
    }

    /// Handles a mouse button change.
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        self.camera_state
            .camera_controller
            .process_mouse_button(button, state);
    }

    /// Handles raw mouse motion.
    pub fn handle_mouse_motion(&mut self, delta: (f64, f64)) {
        self.camera_state
            .camera_controller
            .process_mouse_motion(delta.0, delta.1);
    }

    /// Releases every held input, e.g. when focus is lost.
    pub fn reset_inputs(&mut self) {
        self.camera_state.camera_controller.reset();
    }

    /// Applies input accumulated since the last call.
    ///
    /// # Arguments
    /// * `wait_duration` - The time elapsed since the last frame
    pub fn process_input(&mut self, wait_duration: Duration) {
        self.camera_state.update(wait_duration);
    }

    /// Counters from the last rendered frame.
    pub fn last_stats(&self) -> CullingStats {
        self.last_stats
    }

    /// Renders the current frame.
    ///
    /// Recoverable surface errors are handled here: a lost or outdated surface is
    /// reconfigured and a timed-out frame is skipped. Stats only change for frames
    /// that were presented.
    ///
    /// # Returns
    /// `Err` only for errors the engine cannot continue after
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let view = self.camera_state.view_matrix();
        let view_projection = self.camera_state.view_projection();
        self.frustum
            .update(&view_projection, self.config.frustum_margin);

        self.renderer.begin_frame(
            &self.queue,
            &view,
            &self.camera_state.gpu_projection_matrix(),
        );
        let stats = self
            .world
            .render(self.traversal_mode, &self.frustum, &mut self.renderer);

        let outcome =
            FrameOutcome::classify(self.renderer.end_frame(&self.surface, &self.device, &self.queue))?;
        if outcome == FrameOutcome::Reconfigure {
            warn!("Surface lost or outdated, reconfiguring");
            self.surface.configure(&self.device, &self.surface_config);
        }

        if let Some(stats) = outcome.presented_stats(stats) {
            self.last_stats = stats;
            self.publish_stats();
        }
        Ok(())
    }

    /// Releases the shared cube geometry. No frames may be rendered afterwards.
    pub fn shutdown(&mut self) {
        self.renderer.cleanup();
    }

    fn publish_stats(&mut self) {
        let now = web_time::Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        let Some(fps) = self.frame_timer.record(dt) else {
            return;
        };
        let stats = self.last_stats;
        self.window.set_title(&format!(
            "{} | {:.0} FPS | {} visible | {:?}",
            self.config.window.title, fps, stats.visible_cubes, self.traversal_mode
        ));
        debug!(
            "{:.1} fps, {:?}: {} visible, {} box tests, {} point tests, {} chunks culled",
            fps,
            self.traversal_mode,
            stats.visible_cubes,
            stats.aabb_tests,
            stats.point_tests,
            stats.chunks_culled
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frame_timer_reports_once_per_interval() {
        let mut timer = FrameTimer::new(Duration::from_secs(1));

        for _ in 0..59 {
            assert!(timer.record(Duration::from_millis(16)).is_none());
        }
        let fps = timer
            .record(Duration::from_millis(60))
            .expect("interval complete");

        // 60 frames over 0.944 + 0.06 seconds
        assert_relative_eq!(fps, 60.0 / 1.004, epsilon = 1e-3);
        assert!(timer.record(Duration::from_millis(16)).is_none());
    }

    #[test]
    fn surface_errors_are_sorted_by_recovery() {
        use wgpu::SurfaceError;

        assert!(matches!(FrameOutcome::classify(Ok(12)), Ok(FrameOutcome::Presented(12))));
        assert!(matches!(
            FrameOutcome::classify(Err(SurfaceError::Lost)),
            Ok(FrameOutcome::Reconfigure)
        ));
        assert!(matches!(
            FrameOutcome::classify(Err(SurfaceError::Outdated)),
            Ok(FrameOutcome::Reconfigure)
        ));
        assert!(matches!(
            FrameOutcome::classify(Err(SurfaceError::Timeout)),
            Ok(FrameOutcome::Skipped)
        ));
        assert!(matches!(
            FrameOutcome::classify(Err(SurfaceError::OutOfMemory)),
            Err(SurfaceError::OutOfMemory)
        ));
    }

    #[test]
    fn only_presented_frames_publish_stats() {
        let culled = CullingStats {
            visible_cubes: 40,
            aabb_tests: 9,
            point_tests: 1000,
            chunks_culled: 0,
        };

        assert_eq!(FrameOutcome::Skipped.presented_stats(culled), None);
        assert_eq!(FrameOutcome::Reconfigure.presented_stats(culled), None);
        assert_eq!(
            FrameOutcome::Presented(38).presented_stats(culled),
            Some(CullingStats {
                visible_cubes: 38,
                ..culled
            })
        );
    }

    #[test]
    fn frame_timer_handles_long_frames() {
        let mut timer = FrameTimer::new(Duration::from_secs(1));

        let fps = timer.record(Duration::from_secs(2)).expect("interval complete");

        assert_relative_eq!(fps, 0.5);
    }
}
