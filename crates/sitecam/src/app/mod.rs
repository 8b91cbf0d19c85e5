//! Application window and event loop management.

mod input;

use std::sync::Arc;

use winit::{event_loop::EventLoop, window::Window};

use sitecam_core::{CameraRecordSource, Options, Result, SelectionSource, SitecamError};
use sitecam_render::RenderEngine;

use crate::render_loop::RenderLoop;

/// Mouse state for navigation.
#[derive(Debug, Default)]
struct MouseState {
    position: (f64, f64),
    left_down: bool,
    right_down: bool,
}

/// The sitecam application state.
pub struct App {
    options: Options,
    selection: Option<Box<dyn SelectionSource>>,
    records: Box<dyn CameraRecordSource>,
    io: tokio::runtime::Runtime,
    window: Option<Arc<Window>>,
    session: Option<RenderLoop<RenderEngine>>,
    mouse: MouseState,
    error: Option<SitecamError>,
}

impl App {
    /// Creates the application and the runtime that loads assets.
    pub fn new(
        options: Options,
        selection: Box<dyn SelectionSource>,
        records: Box<dyn CameraRecordSource>,
    ) -> Result<Self> {
        let io = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sitecam-io")
            .enable_all()
            .build()?;

        Ok(Self {
            options,
            selection: Some(selection),
            records,
            io,
            window: None,
            session: None,
            mouse: MouseState::default(),
            error: None,
        })
    }

    /// Stops the session; the window goes away with the event loop.
    fn shutdown(&mut self) {
        if let Some(session) = &mut self.session {
            session.teardown();
        }
    }

    /// Consumes the app, surfacing the error that ended it, if any.
    fn finish(mut self) -> Result<()> {
        self.shutdown();
        self.session = None;
        self.io.shutdown_background();
        self.error.map_or(Ok(()), Err)
    }
}

/// Runs the viewer until its window is closed.
pub fn run_app(
    options: Options,
    selection: Box<dyn SelectionSource>,
    records: Box<dyn CameraRecordSource>,
) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|e| SitecamError::EventLoop(e.to_string()))?;
    let mut app = App::new(options, selection, records)?;

    event_loop
        .run_app(&mut app)
        .map_err(|e| SitecamError::EventLoop(e.to_string()))?;
    app.finish()
}
