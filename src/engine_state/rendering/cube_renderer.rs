//! Instanced wgpu renderer for culled cubes.
//!
//! # Frame lifecycle
//!
//! 1. [`CubeRenderer::begin_frame`] clears the instance list and writes the view and
//!    projection uniform once.
//! 2. The culling traversal calls [`CubeDrawer::draw`] for every visible leaf; each
//!    call appends that leaf's model matrix.
//! 3. [`CubeRenderer::end_frame`] uploads the instance list and issues one
//!    `draw(0..36, 0..n)` against the shared cube vertex buffer.
//!
//! The shared vertex buffer lives in [`SharedCubeGeometry`], owned by the renderer.
//! It is created once before the first frame and destroyed when the renderer is
//! cleaned up or dropped.

use cgmath::Matrix4;
use log::{debug, warn};
use wgpu::{
    util::DeviceExt, BindGroup, Buffer, Device, Queue, RenderPipeline, Surface, SurfaceConfiguration,
    TextureFormat,
};

use crate::engine_state::camera_state::camera::CameraUniform;

use super::{
    texture::DepthTexture,
    vertex::{CubeVertex, InstanceRaw, CUBE_VERTEX_COUNT, CUBE_VERTICES},
    CubeDrawer,
};

/// Background color of the cube pass.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

/// Instance slots allocated up front; grows to the next power of two on demand.
const INITIAL_INSTANCE_CAPACITY: usize = 1024;

/// A GPU buffer the shared geometry can release explicitly.
pub trait GeometryBuffer {
    /// Frees the GPU memory behind the buffer.
    fn release(&self);
}

impl GeometryBuffer for Buffer {
    fn release(&self) {
        self.destroy();
    }
}

/// The 36-vertex cube every instance is drawn from.
///
/// [`SharedCubeGeometry::init_buffers`] and [`SharedCubeGeometry::cleanup`] are both
/// idempotent, so the buffer is created at most once per init and released at most
/// once. Draws are only admitted while the buffer exists.
#[derive(Debug)]
pub struct SharedCubeGeometry<B: GeometryBuffer = Buffer> {
    vertex_buffer: Option<B>,
    warned_uninitialized: bool,
}

impl<B: GeometryBuffer> Default for SharedCubeGeometry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedCubeGeometry<Buffer> {
    /// Uploads [`CUBE_VERTICES`]. Does nothing when the buffer already exists.
    pub fn init_buffers(&mut self, device: &Device) {
        let created = self.init_with(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cube Vertex Buffer"),
                contents: bytemuck::cast_slice(&CUBE_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
        if created {
            debug!("Shared cube geometry uploaded ({} vertices)", CUBE_VERTEX_COUNT);
        }
    }
}

impl<B: GeometryBuffer> SharedCubeGeometry<B> {
    /// Geometry with no GPU buffer yet.
    pub const fn new() -> Self {
        Self {
            vertex_buffer: None,
            warned_uninitialized: false,
        }
    }

    /// Stores the buffer made by `create` unless one already exists.
    ///
    /// # Returns
    /// `true` if `create` ran
    pub fn init_with<F: FnOnce() -> B>(&mut self, create: F) -> bool {
        if self.vertex_buffer.is_some() {
            return false;
        }
        self.vertex_buffer = Some(create());
        self.warned_uninitialized = false;
        true
    }

    /// Whether the geometry has been initialized since the last cleanup.
    pub fn is_initialized(&self) -> bool {
        self.vertex_buffer.is_some()
    }

    /// The shared vertex buffer, `None` before init or after cleanup.
    pub fn vertex_buffer(&self) -> Option<&B> {
        self.vertex_buffer.as_ref()
    }

    /// Whether a cube may be drawn right now.
    ///
    /// The first refused draw after an init or cleanup logs a warning, later ones
    /// are dropped silently.
    pub fn admit_draw(&mut self) -> bool {
        if self.is_initialized() {
            return true;
        }
        if !self.warned_uninitialized {
            warn!("Cube drawn without initialized shared geometry, skipping");
            self.warned_uninitialized = true;
        }
        false
    }

    /// Whether a refused draw has been reported.
    pub fn warned_uninitialized(&self) -> bool {
        self.warned_uninitialized
    }

    /// Releases the vertex buffer. Does nothing when there is none.
    pub fn cleanup(&mut self) {
        if let Some(buffer) = self.vertex_buffer.take() {
            buffer.release();
            self.warned_uninitialized = false;
            debug!("Shared cube geometry released");
        }
    }
}

impl<B: GeometryBuffer> Drop for SharedCubeGeometry<B> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Draws the visible cubes of a frame as one instanced call.
pub struct CubeRenderer {
    render_pipeline: RenderPipeline,
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,
    geometry: SharedCubeGeometry,
    instance_buffer: Buffer,
    instance_capacity: usize,
    instances: Vec<InstanceRaw>,
    depth_texture: DepthTexture,
}

impl CubeRenderer {
    /// Creates the pipeline, camera uniform, instance buffer and depth texture.
    ///
    /// The shared geometry is *not* uploaded here; call
    /// [`CubeRenderer::init_geometry`] before the first frame.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `config` - Surface configuration used for the depth texture size
    /// * `texture_format` - Format of the color target
    /// * `shader_source` - WGSL source with `vs_main` and `fs_main`
    pub fn new(
        device: &Device,
        config: &SurfaceConfiguration,
        texture_format: TextureFormat,
        shader_source: &str,
    ) -> Self {
        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cube Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cube Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cube Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[CubeVertex::desc(), InstanceRaw::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // The cube's faces are not consistently wound.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthTexture::depth_stencil_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let instance_buffer = Self::create_instance_buffer(device, INITIAL_INSTANCE_CAPACITY);
        let depth_texture = DepthTexture::new(device, config, "Cube Depth Texture");

        Self {
            render_pipeline,
            camera_buffer,
            camera_bind_group,
            geometry: SharedCubeGeometry::new(),
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            instances: Vec::with_capacity(INITIAL_INSTANCE_CAPACITY),
            depth_texture,
        }
    }

    fn create_instance_buffer(device: &Device, capacity: usize) -> Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cube Instance Buffer"),
            size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads the shared cube geometry if it is not there yet.
    pub fn init_geometry(&mut self, device: &Device) {
        self.geometry.init_buffers(device);
    }

    /// Releases the shared cube geometry. Later draws are dropped with a warning.
    pub fn cleanup(&mut self) {
        self.geometry.cleanup();
    }

    /// The shared cube geometry.
    pub fn geometry(&self) -> &SharedCubeGeometry {
        &self.geometry
    }

    /// Number of instances queued since the last [`CubeRenderer::begin_frame`].
    pub fn queued_instances(&self) -> usize {
        self.instances.len()
    }

    /// Recreates size-dependent resources after the surface changed size.
    pub fn resize(&mut self, device: &Device, config: &SurfaceConfiguration) {
        self.depth_texture = DepthTexture::new(device, config, "Cube Depth Texture");
    }

    /// Starts a frame: drops last frame's instances and writes the camera uniform.
    ///
    /// # Arguments
    /// * `queue` - Queue used for the uniform write
    /// * `view` - World-to-view transform
    /// * `projection` - Projection already remapped to the GPU depth range
    pub fn begin_frame(&mut self, queue: &Queue, view: &Matrix4<f32>, projection: &Matrix4<f32>) {
        self.instances.clear();
        let camera_uniform = CameraUniform::from_matrices(view, projection);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));
    }

    /// Uploads this frame's instances, draws them and presents.
    ///
    /// # Returns
    /// The number of instances drawn, or the error from acquiring the surface texture
    pub fn end_frame(
        &mut self,
        surface: &Surface,
        device: &Device,
        queue: &Queue,
    ) -> Result<u32, wgpu::SurfaceError> {
        let frame = surface.get_current_texture()?;

        if self.instances.len() > self.instance_capacity {
            let capacity = self.instances.len().next_power_of_two();
            debug!(
                "Growing instance buffer from {} to {} slots",
                self.instance_capacity, capacity
            );
            self.instance_buffer.destroy();
            self.instance_buffer = Self::create_instance_buffer(device, capacity);
            self.instance_capacity = capacity;
        }
        if !self.instances.is_empty() {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&self.instances),
            );
        }

        let instance_count = self.instances.len() as u32;
        let view = frame.texture.create_view(&Default::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Cube Render Encoder"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cube Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let vertex_buffer = self.geometry.vertex_buffer().filter(|_| instance_count > 0);
            if let Some(vertex_buffer) = vertex_buffer {
                rpass.set_pipeline(&self.render_pipeline);
                rpass.set_bind_group(0, &self.camera_bind_group, &[]);
                rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
                rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                rpass.draw(0..CUBE_VERTEX_COUNT, 0..instance_count);
            }
        }

        queue.submit([encoder.finish()]);
        frame.present();

        Ok(instance_count)
    }
}

impl CubeDrawer for CubeRenderer {
    fn draw(&mut self, model: &Matrix4<f32>) {
        if !self.geometry.admit_draw() {
            return;
        }
        self.instances.push(InstanceRaw::from(model));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    /// Counts how often it is released.
    #[derive(Debug)]
    struct CountingBuffer {
        releases: Rc<Cell<u32>>,
    }

    impl GeometryBuffer for CountingBuffer {
        fn release(&self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn counting_geometry() -> (SharedCubeGeometry<CountingBuffer>, Rc<Cell<u32>>) {
        (SharedCubeGeometry::new(), Rc::new(Cell::new(0)))
    }

    #[test]
    fn geometry_starts_uninitialized() {
        let geometry = SharedCubeGeometry::<Buffer>::new();

        assert!(!geometry.is_initialized());
        assert!(geometry.vertex_buffer().is_none());
    }

    #[test]
    fn init_creates_the_buffer_once() {
        let (mut geometry, releases) = counting_geometry();
        let mut creations = 0;

        for _ in 0..3 {
            geometry.init_with(|| {
                creations += 1;
                CountingBuffer {
                    releases: releases.clone(),
                }
            });
        }

        assert_eq!(creations, 1);
        assert!(geometry.is_initialized());
        assert_eq!(releases.get(), 0);
    }

    #[test]
    fn draws_are_refused_before_init_and_after_cleanup() {
        let (mut geometry, releases) = counting_geometry();

        assert!(!geometry.admit_draw());
        assert!(geometry.warned_uninitialized());
        assert!(!geometry.admit_draw());

        geometry.init_with(|| CountingBuffer {
            releases: releases.clone(),
        });
        assert!(!geometry.warned_uninitialized());
        assert!(geometry.admit_draw());

        geometry.cleanup();
        assert!(!geometry.is_initialized());
        assert!(!geometry.admit_draw());
        assert!(geometry.warned_uninitialized());
    }

    #[test]
    fn cleanup_releases_exactly_once() {
        let (mut geometry, releases) = counting_geometry();
        geometry.cleanup();
        assert_eq!(releases.get(), 0);

        geometry.init_with(|| CountingBuffer {
            releases: releases.clone(),
        });
        geometry.cleanup();
        geometry.cleanup();
        drop(geometry);

        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn dropping_initialized_geometry_releases_it() {
        let (mut geometry, releases) = counting_geometry();
        geometry.init_with(|| CountingBuffer {
            releases: releases.clone(),
        });

        drop(geometry);

        assert_eq!(releases.get(), 1);
    }
}
