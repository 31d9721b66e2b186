//! # Camera State Management
//!
//! Owns the camera, its projection and the free-fly controller, and hands the rest
//! of the engine the per-frame matrices:
//! - `view_projection()` in the OpenGL clip convention, for frustum extraction
//! - `view_matrix()` and `gpu_projection_matrix()` for the shader uniform

use cgmath::{Deg, Matrix4, Point3};

use crate::config::EngineConfig;

pub mod camera;

use camera::{Camera, CameraController, Projection};

/// Camera, projection and input controller bundled together.
#[derive(Debug, Clone)]
pub struct CameraState {
    /// The current camera position and orientation
    pub camera: Camera,
    /// Perspective settings
    pub projection: Projection,
    /// Held keys and pending mouse look
    pub camera_controller: CameraController,
}

impl CameraState {
    /// Builds the camera from the configured start pose, lens and controls.
    ///
    /// # Arguments
    /// * `config` - Engine configuration
    /// * `width` - Initial viewport width in pixels
    /// * `height` - Initial viewport height in pixels
    pub fn new(config: &EngineConfig, width: u32, height: u32) -> Self {
        let camera_config = &config.camera;
        let camera = Camera::new(
            Point3::from(camera_config.position),
            Deg(camera_config.yaw_degrees),
            Deg(camera_config.pitch_degrees),
        );
        let projection = Projection::new(
            width,
            height,
            Deg(camera_config.fov_degrees),
            camera_config.near,
            camera_config.far,
        );
        let camera_controller =
            CameraController::new(camera_config.speed, camera_config.sensitivity);

        Self {
            camera,
            projection,
            camera_controller,
        }
    }

    /// Applies pending input to the camera.
    ///
    /// # Returns
    /// `true` if the camera moved or rotated
    pub fn update(&mut self, dt: web_time::Duration) -> bool {
        if !self.camera_controller.has_updates() {
            return false;
        }
        self.camera
            .apply_controller(&mut self.camera_controller, dt);
        true
    }

    /// Adjusts the projection to a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    /// World-to-view transform.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.camera.calc_matrix()
    }

    /// Projection in the OpenGL clip convention.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.calc_matrix()
    }

    /// Projection remapped for the GPU's depth range.
    pub fn gpu_projection_matrix(&self) -> Matrix4<f32> {
        self.projection.calc_gpu_matrix()
    }

    /// `projection * view`, the matrix the frustum planes are extracted from.
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Transform;
    use web_time::Duration;
    use winit::{event::ElementState, keyboard::KeyCode};

    #[test]
    fn starts_at_the_configured_pose() {
        let config = EngineConfig::default();
        let state = CameraState::new(&config, 1200, 800);

        assert_eq!(state.camera.position, Point3::new(-3.0, 3.0, 3.0));
        assert_eq!(state.camera.yaw, Deg(-44.0));
        assert_eq!(state.camera.pitch, Deg(-29.0));
    }

    #[test]
    fn point_ahead_projects_inside_clip_space() {
        let state = CameraState::new(&EngineConfig::default(), 1200, 800);
        let ahead = state.camera.position + state.camera.front() * 5.0;

        let clip = state.view_projection().transform_point(ahead);

        assert!(clip.x.abs() < 1e-3);
        assert!(clip.y.abs() < 1e-3);
        assert!(clip.z > -1.0 && clip.z < 1.0);
    }

    #[test]
    fn update_reports_whether_anything_changed() {
        let mut state = CameraState::new(&EngineConfig::default(), 1200, 800);
        assert!(!state.update(Duration::from_millis(16)));

        state
            .camera_controller
            .process_keyboard(KeyCode::KeyS, ElementState::Pressed);
        let before = state.camera.position;
        assert!(state.update(Duration::from_millis(16)));
        assert_ne!(state.camera.position, before);
    }
}
