//! Rendering system for the culling demo.
//!
//! The culling traversal only knows the [`CubeDrawer`] contract: hand it the model
//! matrix of a visible leaf. [`cube_renderer::CubeRenderer`] is the wgpu
//! implementation; it batches every model matrix of a frame into one instanced draw
//! of the shared cube geometry.

use cgmath::Matrix4;

pub mod cube_renderer;
pub mod texture;
pub mod vertex;

pub use cube_renderer::{CubeRenderer, GeometryBuffer, SharedCubeGeometry};
pub use vertex::{CubeVertex, InstanceRaw, CUBE_VERTEX_COUNT, CUBE_VERTICES};

/// Receives one draw request per visible leaf cube.
pub trait CubeDrawer {
    /// Draws the shared unit cube transformed by `model`.
    fn draw(&mut self, model: &Matrix4<f32>);
}

impl<D: CubeDrawer + ?Sized> CubeDrawer for &mut D {
    fn draw(&mut self, model: &Matrix4<f32>) {
        (**self).draw(model);
    }
}
