//! Vertex and instance layouts for cube rendering.
//!
//! Every cube is drawn from the same 36 vertices (six faces, two triangles each, no
//! index buffer). Per-cube data is a model matrix fed through a second, instance-rate
//! vertex buffer.

/// A vertex of the shared unit cube.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Color: [f32; 3] (12 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    /// Object-space position, each component ±0.5
    pub position: [f32; 3],
    /// RGB color interpolated across the face
    pub color: [f32; 3],
}

impl CubeVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Creates a vertex from a position and a color.
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    /// Buffer layout matching `@location(0)` position and `@location(1)` color.
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Number of vertices in [`CUBE_VERTICES`].
pub const CUBE_VERTEX_COUNT: u32 = 36;

const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
const BLUE: [f32; 3] = [0.0, 0.0, 1.0];
const YELLOW: [f32; 3] = [1.0, 1.0, 0.0];
const MAGENTA: [f32; 3] = [1.0, 0.0, 1.0];
const CYAN: [f32; 3] = [0.0, 1.0, 1.0];
const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// Unit cube centered on the origin, as a plain triangle list.
pub const CUBE_VERTICES: [CubeVertex; CUBE_VERTEX_COUNT as usize] = [
    // +Z
    CubeVertex::new([-0.5, -0.5, 0.5], RED),
    CubeVertex::new([0.5, -0.5, 0.5], GREEN),
    CubeVertex::new([0.5, 0.5, 0.5], BLUE),
    CubeVertex::new([0.5, 0.5, 0.5], BLUE),
    CubeVertex::new([-0.5, 0.5, 0.5], YELLOW),
    CubeVertex::new([-0.5, -0.5, 0.5], RED),
    // -Z
    CubeVertex::new([-0.5, -0.5, -0.5], MAGENTA),
    CubeVertex::new([0.5, 0.5, -0.5], CYAN),
    CubeVertex::new([0.5, -0.5, -0.5], GREEN),
    CubeVertex::new([0.5, 0.5, -0.5], CYAN),
    CubeVertex::new([-0.5, -0.5, -0.5], MAGENTA),
    CubeVertex::new([-0.5, 0.5, -0.5], WHITE),
    // -X
    CubeVertex::new([-0.5, 0.5, 0.5], YELLOW),
    CubeVertex::new([-0.5, 0.5, -0.5], WHITE),
    CubeVertex::new([-0.5, -0.5, -0.5], MAGENTA),
    CubeVertex::new([-0.5, -0.5, -0.5], MAGENTA),
    CubeVertex::new([-0.5, -0.5, 0.5], RED),
    CubeVertex::new([-0.5, 0.5, 0.5], YELLOW),
    // +X
    CubeVertex::new([0.5, 0.5, 0.5], BLUE),
    CubeVertex::new([0.5, -0.5, -0.5], GREEN),
    CubeVertex::new([0.5, -0.5, 0.5], BLUE),
    CubeVertex::new([0.5, -0.5, -0.5], GREEN),
    CubeVertex::new([0.5, 0.5, 0.5], BLUE),
    CubeVertex::new([0.5, 0.5, -0.5], CYAN),
    // -Y
    CubeVertex::new([-0.5, -0.5, -0.5], MAGENTA),
    CubeVertex::new([0.5, -0.5, -0.5], GREEN),
    CubeVertex::new([0.5, -0.5, 0.5], BLUE),
    CubeVertex::new([0.5, -0.5, 0.5], BLUE),
    CubeVertex::new([-0.5, -0.5, 0.5], RED),
    CubeVertex::new([-0.5, -0.5, -0.5], MAGENTA),
    // +Y
    CubeVertex::new([-0.5, 0.5, -0.5], WHITE),
    CubeVertex::new([0.5, 0.5, 0.5], BLUE),
    CubeVertex::new([0.5, 0.5, -0.5], CYAN),
    CubeVertex::new([0.5, 0.5, 0.5], BLUE),
    CubeVertex::new([-0.5, 0.5, -0.5], WHITE),
    CubeVertex::new([-0.5, 0.5, 0.5], YELLOW),
];

/// Per-instance model matrix, uploaded column by column.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4
    ];

    /// Buffer layout for `@location(2)` through `@location(5)`, one column each.
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&cgmath::Matrix4<f32>> for InstanceRaw {
    fn from(model: &cgmath::Matrix4<f32>) -> Self {
        Self {
            model: (*model).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix4, Vector3};
    use std::collections::HashSet;

    #[test]
    fn cube_has_six_faces_of_two_triangles() {
        assert_eq!(CUBE_VERTICES.len(), 36);
        assert_eq!(CUBE_VERTICES.len() % 3, 0);
        assert_eq!(std::mem::size_of::<CubeVertex>(), 24);
    }

    #[test]
    fn every_coordinate_is_on_the_unit_cube() {
        let mut corners = HashSet::new();
        for vertex in CUBE_VERTICES.iter() {
            for component in vertex.position {
                assert!(component == 0.5 || component == -0.5);
            }
            corners.insert(vertex.position.map(|c| c > 0.0));
        }
        assert_eq!(corners.len(), 8);
    }

    #[test]
    fn each_face_lies_in_one_plane() {
        for (face, triangles) in CUBE_VERTICES.chunks_exact(6).enumerate() {
            let shared_axis = (0..3).find(|&axis| {
                triangles
                    .iter()
                    .all(|vertex| vertex.position[axis] == triangles[0].position[axis])
            });
            assert!(shared_axis.is_some(), "face {face} is not planar");
        }
    }

    #[test]
    fn instance_takes_matrix_columns() {
        let model = Matrix4::from_translation(Vector3::new(3.0, 4.0, 7.0));
        let raw = InstanceRaw::from(&model);

        assert_eq!(raw.model[3], [3.0, 4.0, 7.0, 1.0]);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 64);
    }
}
