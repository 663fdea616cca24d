//! Windowed frame driver

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use super::config::EngineConfig;
use super::error::EngineError;
use super::runtime::Runtime;
use crate::ecs::Registry;
use crate::render::{Presenter, WindowPresenter};

/// Log frame statistics this often
const STATS_INTERVAL: u64 = 300;

/// Game trait that users implement
pub trait Game: 'static {
    /// Add component kinds and value types beyond the built-ins
    fn register(&mut self, _registry: &mut Registry) {}

    /// Presentation adapter for the freshly created window
    ///
    /// # Errors
    ///
    /// The default [`WindowPresenter`] fails when no GPU can present to
    /// the window
    fn presenter(&mut self, window: Arc<Window>) -> Result<Box<dyn Presenter>, EngineError> {
        Ok(Box::new(WindowPresenter::new(window, true)?))
    }

    /// Declare layers, load images and make the first scene current
    ///
    /// # Errors
    ///
    /// Any failure stops the engine before the first tick
    fn load_content(&mut self, runtime: &mut Runtime) -> Result<(), EngineError>;

    /// Called before every tick
    fn update(&mut self, _runtime: &mut Runtime) {}

    /// Called when the window is resized
    fn on_resize(&mut self, _runtime: &mut Runtime, _width: u32, _height: u32) {}

    /// Called when the engine is shutting down
    fn shutdown(&mut self, _runtime: &mut Runtime) {}
}

/// Drives a [`Runtime`] from a winit event loop
pub struct Engine<G: Game> {
    config: EngineConfig,
    game: G,
    runtime: Option<Runtime>,
    window: Option<Arc<Window>>,
    next_frame: Instant,
    error: Option<EngineError>,
}

impl<G: Game> Engine<G> {
    /// Create a new engine with the given game
    pub fn new(config: EngineConfig, game: G) -> Self {
        Self {
            config,
            game,
            runtime: None,
            window: None,
            next_frame: Instant::now(),
            error: None,
        }
    }

    /// Run the engine until the window closes or the game quits
    ///
    /// # Errors
    ///
    /// Event loop and window creation failures, and the first error raised
    /// by content loading or a tick
    pub fn run(mut self) -> Result<(), EngineError> {
        let mut logger =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
        if logger.try_init().is_err() {
            log::debug!("Logger already initialized");
        }
        log::info!("Starting engine: {}", self.config.title);

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: EngineError) {
        log::error!("Stopping engine: {error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(runtime) = &mut self.runtime {
            self.game.shutdown(runtime);
            log::info!("{}", runtime.stats().format_stats());
        }
        event_loop.exit();
    }

    fn start(&mut self, window: Arc<Window>) -> Result<Runtime, EngineError> {
        let presenter = self.game.presenter(window)?;
        Runtime::start_game(&mut self.game, self.config.clone(), presenter)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(runtime) = &mut self.runtime else {
            return;
        };

        self.game.update(runtime);
        if let Err(e) = runtime.frame() {
            self.fail(event_loop, e);
            return;
        }
        if runtime.stats().total_frames() % STATS_INTERVAL == 0 {
            log::debug!("{}", runtime.stats().format_stats());
        }
        if runtime.should_quit() {
            self.shut_down(event_loop);
        }
    }
}

impl<G: Game> ApplicationHandler for Engine<G> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match self.start(Arc::clone(&window)) {
            Ok(runtime) => {
                self.runtime = Some(runtime);
                self.window = Some(window);
                log::info!("Engine initialized successfully");
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::RedrawRequested) {
            self.redraw(event_loop);
            return;
        }

        let Some(runtime) = &mut self.runtime else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                self.shut_down(event_loop);
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    runtime.presenter_mut().resize(size.width, size.height);
                    self.game.on_resize(runtime, size.width, size.height);
                }
            }

            WindowEvent::Focused(false) => runtime.input_mut().reset(),

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    runtime.input_mut().process_keyboard(key_code, event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                runtime.input_mut().process_mouse_button(button, state);
            }

            WindowEvent::CursorMoved { position, .. } => {
                runtime
                    .input_mut()
                    .process_mouse_motion(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(x, y),
                    MouseScrollDelta::PixelDelta(pos) => Vec2::new(pos.x as f32, pos.y as f32),
                };
                runtime.input_mut().process_scroll(scroll);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };

        match self.config.frame_duration() {
            Some(frame) => {
                let now = Instant::now();
                if now >= self.next_frame {
                    window.request_redraw();
                    self.next_frame = now + frame;
                }
                event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
            }
            None => window.request_redraw(),
        }
    }
}
