//! # Graphics Resources Builder
//!
//! Creates the window and the wgpu context and hands them back to the event loop.
//!
//! The main components are:
//! - `Graphics`: Holds all graphics-related resources
//! - `GraphicsBuilder`: Runs the asynchronous setup and sends the result through the
//!   event loop proxy
//! - `MaybeGraphics`: Whether setup is still pending

use std::future::Future;
use std::sync::Arc;

use log::{error, info};
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::{
    dpi::LogicalSize,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::Window,
};

use crate::config::WindowConfig;

/// Failures while bringing up the window and GPU.
#[derive(thiserror::Error, Debug)]
pub enum GraphicsError {
    /// The OS refused to create the window
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// No surface could be created for the window
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// No adapter can present to the surface
    #[error("No compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to open a device
    #[error("Failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The surface reports no texture format to render into
    #[error("Surface has no supported texture format")]
    NoSurfaceFormat,
}

/// The event delivered to the application once setup finishes.
pub type GraphicsEvent = Result<Graphics, GraphicsError>;

/// Contains all graphics-related resources required by the engine.
pub struct Graphics {
    /// The application window
    pub window: Arc<Window>,
    /// Surface presenting into `window`, already configured
    pub surface: Surface<'static>,
    /// The configuration applied to `surface`
    pub surface_config: SurfaceConfiguration,
    /// The GPU device
    pub device: Device,
    /// The GPU command queue
    pub queue: Queue,
}

/// Creates the window synchronously and the GPU context asynchronously.
///
/// # Arguments
/// * `event_loop` - The active event loop used to create the window
/// * `window_config` - Title and initial size
///
/// # Returns
/// A `Future` that resolves to the initialized `Graphics` or the first failure
fn create_graphics(
    event_loop: &ActiveEventLoop,
    window_config: &WindowConfig,
) -> impl Future<Output = GraphicsEvent> + 'static {
    let window_attrs = Window::default_attributes()
        .with_title(window_config.title.clone())
        .with_inner_size(LogicalSize::new(window_config.width, window_config.height));

    let window = event_loop.create_window(window_attrs).map(Arc::new);

    async move {
        let window = window?;

        // Backends::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::empty(),
            backend_options: wgpu::BackendOptions::from_env_or_default(),
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let adapter_info = adapter.get_info();
        info!(
            "Using adapter {} ({:?})",
            adapter_info.name, adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: Some("Voxel Culling Device"),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await?;

        let size = window.inner_size();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GraphicsError::NoSurfaceFormat)?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Ok(Graphics {
            window,
            surface,
            surface_config,
            device,
            queue,
        })
    }
}

/// Helper struct for running graphics initialization once.
pub struct GraphicsBuilder {
    event_loop_proxy: Option<EventLoopProxy<GraphicsEvent>>,
}

/// Represents the possible states of the graphics initialization process.
pub enum MaybeGraphics {
    /// Setup has not run yet
    Builder(GraphicsBuilder),
    /// Setup has run and its result has been handed to the application
    Consumed,
}

impl GraphicsBuilder {
    /// Creates a new GraphicsBuilder with the specified event loop proxy.
    ///
    /// # Arguments
    /// * `event_loop_proxy` - Used to send the initialized graphics resources back to the main thread
    pub fn new(event_loop_proxy: EventLoopProxy<GraphicsEvent>) -> Self {
        Self {
            event_loop_proxy: Some(event_loop_proxy),
        }
    }

    /// Runs graphics initialization to completion and sends the result.
    ///
    /// Does nothing after the first call.
    pub fn build_and_send(&mut self, event_loop: &ActiveEventLoop, window_config: &WindowConfig) {
        let Some(event_loop_proxy) = self.event_loop_proxy.take() else {
            // event_loop_proxy is already spent - we already constructed Graphics
            return;
        };

        let gfx = pollster::block_on(create_graphics(event_loop, window_config));
        if event_loop_proxy.send_event(gfx).is_err() {
            error!("Event loop closed before graphics initialization finished");
        }
    }
}
