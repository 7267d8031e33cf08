//! Fullscreen streaming window backed by winit.
//!
//! ```no_run
//! # use texstream::Viewer;
//! Viewer::builder()
//!     .with_dir("assets/images")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use web_time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Fullscreen, Window, WindowId},
};

use crate::engine::StreamEngine;
use crate::error::StreamError;
use crate::input::{key_name, KeyAction};
use crate::options::Options;

/// Window size when not fullscreen.
const WINDOWED_SIZE: (u32, u32) = (640, 480);

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    dir: PathBuf,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    /// Create a builder with defaults (title "texstream", images from the
    /// working directory, default options).
    fn new() -> Self {
        Self {
            dir: PathBuf::from("."),
            options: None,
            title: "texstream".into(),
        }
    }

    /// Directory the `imageN.png` files are read from.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            dir: self.dir,
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window that streams the image set onto a textured quad.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    dir: PathBuf,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed or the quit key is pressed.
    ///
    /// # Errors
    ///
    /// [`StreamError::Window`] if the event loop or window cannot be
    /// created, [`StreamError::Setup`] if no surface, adapter or device is
    /// available.
    pub fn run(self) -> Result<(), StreamError> {
        let event_loop =
            EventLoop::new().map_err(|e| StreamError::Window(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            engine: None,
            last_frame_time: Instant::now(),
            dir: self.dir,
            options: self.options,
            title: self.title,
            failure: None,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| StreamError::Window(e.to_string()))?;

        match app.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    engine: Option<StreamEngine>,
    last_frame_time: Instant,
    dir: PathBuf,
    options: Options,
    title: String,
    /// Setup error that ended the event loop.
    failure: Option<StreamError>,
}

/// Surface size for a window, never zero.
fn viewport_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width.max(1), inner.height.max(1))
}

impl ViewerApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: StreamError) {
        log::error!("{err}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn quit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(engine) = &self.engine {
            engine.log_summary();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes().with_title(&self.title);
        let attrs = if self.options.display.fullscreen {
            attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
        } else {
            attrs.with_inner_size(winit::dpi::PhysicalSize::new(
                WINDOWED_SIZE.0,
                WINDOWED_SIZE.1,
            ))
        };

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, StreamError::Window(e.to_string()));
                return;
            }
        };

        let size = viewport_size(window.inner_size());
        let engine_result = pollster::block_on(StreamEngine::new(
            window.clone(),
            size,
            self.options.clone(),
            &self.dir,
        ));

        match engine_result {
            Ok(engine) => {
                self.engine = Some(engine);
                self.last_frame_time = Instant::now();
                window.request_redraw();
                self.window = Some(window);
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
        match event {
            WindowEvent::CloseRequested => self.quit(event_loop),

            WindowEvent::Resized(inner) => {
                if let Some(engine) = &mut self.engine {
                    let (w, h) = viewport_size(inner);
                    engine.resize(w, h);
                }
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(self.last_frame_time).as_secs_f32();
                self.last_frame_time = now;

                if let Some(engine) = &mut self.engine {
                    engine.update(dt);
                    match engine.render() {
                        Ok(()) => {}
                        Err(
                            wgpu::SurfaceError::Outdated
                            | wgpu::SurfaceError::Lost,
                        ) => {
                            if let Some(w) = &self.window {
                                let (vp_w, vp_h) = viewport_size(w.inner_size());
                                engine.resize(vp_w, vp_h);
                            }
                        }
                        Err(e) => {
                            log::error!("render error: {e:?}");
                        }
                    }
                }
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };

                let Some(action) = self.engine.as_ref().and_then(|engine| {
                    engine.options().keybindings.lookup(&key_name(code))
                }) else {
                    return;
                };
                if action == KeyAction::Quit {
                    self.quit(event_loop);
                } else if let Some(engine) = &mut self.engine {
                    engine.handle_action(action);
                }
            }

            _ => (),
        }
    }
}
