//! # Camera Implementation
//!
//! This module contains the core camera implementation including:
//! - Camera representation and transformations
//! - Projection matrix handling, in both the OpenGL clip convention (for frustum
//!   extraction) and the wgpu one (for the GPU)
//! - Free-fly camera controller fed by keyboard and mouse input
//! - GPU uniform layout for the view and projection matrices

use cgmath::*;
use web_time::Duration;
use winit::{
    event::{ElementState, MouseButton},
    keyboard::KeyCode,
};

/// Transformation matrix to convert from OpenGL's coordinate system to WGPU's.
///
/// NDC depth in wgpu ranges from 0 to 1 instead of OpenGL's -1 to 1. This matrix
/// scales Z from [-1, 1] to [-0.5, 0.5] and then translates it to [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch is kept strictly inside this range so the view never flips over the pole.
pub const PITCH_LIMIT: Deg<f32> = Deg(89.0);

/// A first-person camera in 3D space.
///
/// Orientation is stored as yaw and pitch; the view direction is derived from them
/// on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// The camera's position in world space
    pub position: Point3<f32>,
    /// Rotation around the Y axis; 0° looks along +X, -90° along -Z
    pub yaw: Deg<f32>,
    /// Rotation above (positive) or below (negative) the horizon
    pub pitch: Deg<f32>,
}

impl Camera {
    /// Creates a new camera with the specified position and orientation.
    ///
    /// # Arguments
    /// * `position` - Initial position of the camera in world space
    /// * `yaw` - Initial yaw (horizontal rotation around Y axis)
    /// * `pitch` - Initial pitch, clamped to ±[`PITCH_LIMIT`]
    pub fn new<V: Into<Point3<f32>>, Y: Into<Deg<f32>>, P: Into<Deg<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: clamp_pitch(pitch.into()),
        }
    }

    /// Normalized view direction.
    pub fn front(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = Rad::from(self.yaw).0.sin_cos();
        let (pitch_sin, pitch_cos) = Rad::from(self.pitch).0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    /// Normalized vector pointing to the camera's right, parallel to the ground.
    pub fn right(&self) -> Vector3<f32> {
        self.front().cross(Vector3::unit_y()).normalize()
    }

    /// Calculates the world-to-view matrix.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front(), Vector3::unit_y())
    }

    /// Applies the controller's pending movement and rotation.
    ///
    /// Held movement keys move the camera `speed` units per second along the view
    /// direction, the right vector and world up. Accumulated mouse motion rotates by
    /// `sensitivity` degrees per pixel and is consumed.
    pub fn apply_controller(&mut self, controller: &mut CameraController, dt: Duration) {
        let distance = controller.speed * dt.as_secs_f32();
        let front = self.front();
        let right = self.right();

        self.position += front * controller.axis(controller.forward, controller.backward) * distance;
        self.position += right * controller.axis(controller.right, controller.left) * distance;
        self.position.y += controller.axis(controller.up, controller.down) * distance;

        let (horizontal, vertical) = controller.take_rotation();
        self.yaw += Deg(horizontal * controller.sensitivity);
        // Screen Y grows downwards.
        self.pitch = clamp_pitch(self.pitch - Deg(vertical * controller.sensitivity));
    }
}

fn clamp_pitch(pitch: Deg<f32>) -> Deg<f32> {
    Deg(pitch.0.clamp(-PITCH_LIMIT.0, PITCH_LIMIT.0))
}

/// Represents a camera's projection matrix and related parameters.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Aspect ratio (width / height)
    aspect: f32,
    /// Vertical field of view in radians
    fovy: Rad<f32>,
    /// Near clipping plane distance
    znear: f32,
    /// Far clipping plane distance
    zfar: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels
    /// * `height` - Viewport height in pixels
    /// * `fovy` - Vertical field of view (can be any type convertible to `Rad<f32>`)
    /// * `znear` - Near clipping plane distance
    /// * `zfar` - Far clipping plane distance
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Updates the aspect ratio for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Perspective matrix in the OpenGL clip convention. This is the one the frustum
    /// planes are extracted from.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// [`Projection::calc_matrix`] remapped to wgpu's 0..1 depth range, for the
    /// shader uniform.
    pub fn calc_gpu_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.calc_matrix()
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Tracks held movement keys and mouse-look input for the free-fly camera.
#[derive(Debug, Clone)]
pub struct CameraController {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,

    // Mouse look is only active while the left button is held
    rotating: bool,
    rotate_horizontal: f32,
    rotate_vertical: f32,

    /// Movement speed in units per second
    pub speed: f32,
    /// Degrees of rotation per pixel of mouse motion
    pub sensitivity: f32,
}

impl CameraController {
    /// Creates a new camera controller with the given speed and sensitivity.
    ///
    /// # Arguments
    /// * `speed` - Movement speed in units per second
    /// * `sensitivity` - Mouse look sensitivity in degrees per pixel
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            rotating: false,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            speed,
            sensitivity,
        }
    }

    /// Records a movement key change.
    ///
    /// # Returns
    /// `true` if the key is one of the movement bindings
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => self.forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.backward = pressed,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.right = pressed,
            KeyCode::Space => self.up = pressed,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.down = pressed,
            _ => return false,
        }
        true
    }

    /// Starts or stops mouse look with the left button.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.rotating = state == ElementState::Pressed;
        }
    }

    /// Accumulates raw mouse motion while mouse look is active.
    pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
        if self.rotating {
            self.rotate_horizontal += delta_x as f32;
            self.rotate_vertical += delta_y as f32;
        }
    }

    /// Releases every key and button, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        *self = Self::new(self.speed, self.sensitivity);
    }

    /// Whether applying the controller would change the camera.
    pub fn has_updates(&self) -> bool {
        self.forward
            || self.backward
            || self.left
            || self.right
            || self.up
            || self.down
            || self.rotate_horizontal != 0.0
            || self.rotate_vertical != 0.0
    }

    fn axis(&self, positive: bool, negative: bool) -> f32 {
        (positive as i32 - negative as i32) as f32
    }

    fn take_rotation(&mut self) -> (f32, f32) {
        let rotation = (self.rotate_horizontal, self.rotate_vertical);
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        rotation
    }
}

/// GPU-friendly representation of camera data for shaders.
///
/// Matches `CameraUniform` in `cube_shader.wgsl`: the view and projection matrices
/// as separate columns-major blocks.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // cgmath matrices are not Pod, so they travel as plain arrays
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Creates a new camera uniform with identity matrices.
    pub fn new() -> Self {
        Self {
            view: Matrix4::identity().into(),
            projection: Matrix4::identity().into(),
        }
    }

    /// Packs a view matrix and a GPU-ready projection matrix.
    pub fn from_matrices(view: &Matrix4<f32>, projection: &Matrix4<f32>) -> Self {
        Self {
            view: (*view).into(),
            projection: (*projection).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn held(controller: &mut CameraController, key: KeyCode) {
        controller.process_keyboard(key, ElementState::Pressed);
    }

    #[test]
    fn front_follows_yaw_and_pitch() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(-90.0), Deg(0.0));
        let front = camera.front();

        assert_relative_eq!(front.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(front.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(front.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn default_orientation_looks_down_at_the_chunk() {
        let camera = Camera::new(Point3::new(-3.0, 3.0, 3.0), Deg(-44.0), Deg(-29.0));
        let front = camera.front();

        assert_relative_eq!(front.x, 0.63, epsilon = 0.01);
        assert_relative_eq!(front.y, -0.49, epsilon = 0.01);
        assert_relative_eq!(front.z, -0.61, epsilon = 0.01);
    }

    #[test]
    fn held_key_moves_along_the_view_direction() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(-90.0), Deg(0.0));
        let mut controller = CameraController::new(3.0, 0.1);
        held(&mut controller, KeyCode::KeyW);

        camera.apply_controller(&mut controller, Duration::from_secs(1));

        assert_relative_eq!(camera.position.z, -3.0, epsilon = 1e-5);
        assert!(controller.has_updates());

        controller.process_keyboard(KeyCode::KeyW, ElementState::Released);
        assert!(!controller.has_updates());
    }

    #[test]
    fn strafing_and_vertical_movement() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(-90.0), Deg(0.0));
        let mut controller = CameraController::new(2.0, 0.1);
        held(&mut controller, KeyCode::KeyD);
        held(&mut controller, KeyCode::Space);

        camera.apply_controller(&mut controller, Duration::from_millis(500));

        assert_relative_eq!(camera.position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.position.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.position.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn mouse_look_needs_the_left_button() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut controller = CameraController::new(3.0, 0.1);

        controller.process_mouse_motion(100.0, 0.0);
        camera.apply_controller(&mut controller, Duration::from_millis(16));
        assert_eq!(camera.yaw, Deg(0.0));

        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.process_mouse_motion(100.0, 50.0);
        camera.apply_controller(&mut controller, Duration::from_millis(16));
        assert_relative_eq!(camera.yaw.0, 10.0, epsilon = 1e-4);
        assert_relative_eq!(camera.pitch.0, -5.0, epsilon = 1e-4);

        // Rotation is consumed by the update.
        assert!(!controller.has_updates());
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
        let mut controller = CameraController::new(3.0, 0.1);
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.process_mouse_motion(0.0, -100_000.0);

        camera.apply_controller(&mut controller, Duration::from_millis(16));

        assert_eq!(camera.pitch, PITCH_LIMIT);
        assert_eq!(Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(-120.0)).pitch, -PITCH_LIMIT);
    }

    #[test]
    fn reset_releases_everything() {
        let mut controller = CameraController::new(3.0, 0.1);
        held(&mut controller, KeyCode::KeyA);
        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        controller.process_mouse_motion(4.0, 4.0);

        controller.reset();

        assert!(!controller.has_updates());
        controller.process_mouse_motion(4.0, 4.0);
        assert!(!controller.has_updates());
        assert_relative_eq!(controller.speed, 3.0);
    }

    #[test]
    fn gpu_projection_maps_near_plane_to_zero_depth() {
        let projection = Projection::new(1200, 800, Deg(90.0), 0.1, 100.0);
        let near_point = Vector4::new(0.0, 0.0, -0.1, 1.0);

        let gl = projection.calc_matrix() * near_point;
        let gpu = projection.calc_gpu_matrix() * near_point;

        assert_relative_eq!(gl.z / gl.w, -1.0, epsilon = 1e-4);
        assert_relative_eq!(gpu.z / gpu.w, 0.0, epsilon = 1e-4);
        assert_relative_eq!(projection.aspect(), 1.5);
    }

    #[test]
    fn zero_height_resize_keeps_a_finite_aspect() {
        let mut projection = Projection::new(1200, 800, Deg(90.0), 0.1, 100.0);
        projection.resize(640, 0);

        assert!(projection.aspect().is_finite());
    }
}
