//! # Application State Management
//!
//! This module handles the application's state management, including:
//! - Window and graphics initialization
//! - Routing input to the engine
//! - Application lifecycle events, including fail-fast shutdown on fatal errors

pub mod graphics_resources_builder;

use std::sync::Arc;

use graphics_resources_builder::{GraphicsBuilder, GraphicsEvent, MaybeGraphics};
use log::error;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{config::EngineConfig, engine_state::EngineState, error::EngineError};

/// The main application state container that manages the application's lifecycle.
///
/// Starts out holding a [`GraphicsBuilder`]; once graphics arrive through the user
/// event it holds the running [`EngineState`].
pub struct ApplicationState {
    /// Pending or consumed graphics setup
    pub graphics: MaybeGraphics,
    /// The initialized application state, if the application has started
    pub state: Option<InitializedApplicationState>,
    config: EngineConfig,
    shader_source: String,
    fatal_error: Option<EngineError>,
}

/// Represents the fully initialized and running state of the application.
pub struct InitializedApplicationState {
    /// The engine and everything it renders
    pub engine_state: EngineState,
    /// Handle to the application window
    pub window: Arc<Window>,
    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: web_time::Instant,
}

impl ApplicationState {
    /// Creates the application in its pre-graphics state.
    ///
    /// # Arguments
    /// * `builder` - Graphics setup to run on the first resume
    /// * `config` - Engine configuration
    /// * `shader_source` - WGSL for the cube pipeline
    pub fn new(builder: GraphicsBuilder, config: EngineConfig, shader_source: String) -> Self {
        Self {
            graphics: MaybeGraphics::Builder(builder),
            state: None,
            config,
            shader_source,
            fatal_error: None,
        }
    }

    /// The error that stopped the event loop, if any.
    pub fn into_result(self) -> Result<(), EngineError> {
        match self.fatal_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: EngineError) {
        error!("{}", err);
        self.fatal_error = Some(err);
        event_loop.exit();
    }
}

fn is_exit_request(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    ..
                },
                ..
            }
    )
}

impl ApplicationHandler<GraphicsEvent> for ApplicationState {
    /// Handles window-related events such as resize, focus changes, and input events.
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if is_exit_request(&event) {
            event_loop.exit();
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };
        let engine_state = &mut state.engine_state;

        match event {
            WindowEvent::Resized(size) => {
                engine_state.resize_surface(size);
            }
            WindowEvent::Focused(false) => {
                engine_state.reset_inputs();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                engine_state.handle_keyboard(key, key_state, repeat);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                engine_state.handle_mouse_button(button, state);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = engine_state.render() {
                    self.fail(event_loop, EngineError::Surface(err));
                }
            }
            _ => (),
        }
    }

    /// Handles device-level input events such as mouse motion.
    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.engine_state.handle_mouse_motion(delta);
            }
        }
    }

    /// Runs graphics setup on the first resume.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let MaybeGraphics::Builder(builder) = &mut self.graphics {
            builder.build_and_send(event_loop, &self.config.window);
        }
    }

    /// Receives the graphics setup result and starts the engine.
    fn user_event(&mut self, event_loop: &ActiveEventLoop, graphics: GraphicsEvent) {
        self.graphics = MaybeGraphics::Consumed;

        let graphics = match graphics {
            Ok(graphics) => graphics,
            Err(err) => {
                self.fail(event_loop, EngineError::Graphics(err));
                return;
            }
        };

        let window = graphics.window.clone();
        let engine_state = EngineState::new(
            graphics.window,
            graphics.surface,
            graphics.surface_config,
            graphics.device,
            graphics.queue,
            &self.shader_source,
            self.config.clone(),
        );

        self.state = Some(InitializedApplicationState {
            engine_state,
            window,
            last_wait_time: web_time::Instant::now(),
        });
    }

    /// Called before the event loop goes to sleep.
    ///
    /// Applies input for the elapsed time and asks for the next frame.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            let now = web_time::Instant::now();
            let wait_dt = now - state.last_wait_time;

            state.engine_state.process_input(wait_dt);
            state.last_wait_time = now;

            state.window.request_redraw();
        }
    }

    /// Releases GPU geometry before the window goes away.
    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.engine_state.shutdown();
        }
    }
}
