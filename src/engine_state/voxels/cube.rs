//! Per-instance cube transform.
//!
//! A `Cube` only carries where and how big it is. The vertex data it is drawn with
//! lives once in the renderer and is shared by every instance.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};

/// A single cube instance in world space.
///
/// The model matrix is derived from the transform fields and recomputed by every
/// setter, so it never goes stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    position: Point3<f32>,
    rotation_axis: Vector3<f32>,
    rotation_angle: Deg<f32>,
    scale: Vector3<f32>,
    model_matrix: Matrix4<f32>,
}

impl Default for Cube {
    fn default() -> Self {
        Self::unit(Point3::new(0.0, 0.0, 0.0))
    }
}

impl Cube {
    /// Creates a cube from its full transform.
    ///
    /// # Arguments
    /// * `position` - Center of the cube in world space
    /// * `rotation_axis` - Axis the cube is rotated around; normalized internally
    /// * `rotation_angle` - Rotation around `rotation_axis`
    /// * `scale` - Non-uniform scale applied to the unit cube
    pub fn new(
        position: Point3<f32>,
        rotation_axis: Vector3<f32>,
        rotation_angle: Deg<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        let mut cube = Self {
            position,
            rotation_axis,
            rotation_angle,
            scale,
            model_matrix: Matrix4::from_scale(1.0),
        };
        cube.update_model_matrix();
        cube
    }

    /// An unrotated cube with edge length 1 centered on `position`.
    pub fn unit(position: Point3<f32>) -> Self {
        Self::uniform(position, 1.0)
    }

    /// An unrotated cube with edge length `size` centered on `position`.
    pub fn uniform(position: Point3<f32>, size: f32) -> Self {
        Self::new(
            position,
            Vector3::unit_y(),
            Deg(0.0),
            Vector3::new(size, size, size),
        )
    }

    /// Center of the cube.
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Rotation axis as it was given.
    pub fn rotation_axis(&self) -> Vector3<f32> {
        self.rotation_axis
    }

    /// Rotation angle around [`Cube::rotation_axis`].
    pub fn rotation_angle(&self) -> Deg<f32> {
        self.rotation_angle
    }

    /// Per-axis scale.
    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    /// `translate * rotate * scale`, ready to upload as the model transform.
    pub fn model_matrix(&self) -> &Matrix4<f32> {
        &self.model_matrix
    }

    /// Moves the cube and refreshes the model matrix.
    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
        self.update_model_matrix();
    }

    /// Changes the rotation and refreshes the model matrix.
    pub fn set_rotation(&mut self, axis: Vector3<f32>, angle: Deg<f32>) {
        self.rotation_axis = axis;
        self.rotation_angle = angle;
        self.update_model_matrix();
    }

    /// Rescales the cube and refreshes the model matrix.
    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.update_model_matrix();
    }

    fn update_model_matrix(&mut self) {
        let translation = Matrix4::from_translation(Vector3::new(
            self.position.x,
            self.position.y,
            self.position.z,
        ));
        // A zero axis has no direction to rotate around.
        let rotation = if self.rotation_axis.magnitude2() > f32::EPSILON {
            Matrix4::from_axis_angle(self.rotation_axis.normalize(), self.rotation_angle)
        } else {
            Matrix4::from_scale(1.0)
        };
        let scale = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);

        self.model_matrix = translation * rotation * scale;
    }
}
