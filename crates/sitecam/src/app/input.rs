use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

use sitecam_core::{logical_cameras_from, AssetLoader, Selection, SitecamError};
use sitecam_render::RenderEngine;

use super::App;
use crate::render_loop::RenderLoop;

/// Radians of orbit per pixel of drag.
const ORBIT_SPEED: f32 = 0.01;

impl App {
    fn start_session(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SitecamError> {
        let [width, height] = self.options.window_size;
        let window_attributes = Window::default_attributes()
            .with_title(self.options.window_title.clone())
            .with_inner_size(LogicalSize::new(width, height));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| SitecamError::EventLoop(e.to_string()))?,
        );

        let engine =
            pollster::block_on(RenderEngine::new_windowed(window.clone(), self.options.scene))
                .map_err(|e| SitecamError::RenderError(e.to_string()))?;

        let cameras = logical_cameras_from(self.records.as_ref(), &self.options.capture);
        let assets = AssetLoader::new(self.options.asset_dir.clone())
            .with_timeout(self.options.asset_timeout())
            .spawn_all(self.io.handle(), self.options.models.clone());

        let size = window.inner_size();
        let selection = self
            .selection
            .take()
            .unwrap_or_else(|| Box::new(Selection::None));
        let mut session = RenderLoop::new(engine, &self.options, size.width, size.height, selection)
            .with_cameras(cameras)
            .with_assets(assets);
        session.start();

        window.request_redraw();
        self.window = Some(window);
        self.session = Some(session);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SitecamError) {
        log::error!("{error}");
        self.error = Some(error);
        self.shutdown();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start_session(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(session) = &mut self.session {
                    session.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(session) = &mut self.session else {
                    return;
                };
                match session.tick() {
                    Ok(Some(_)) => {
                        if let Some(window) = &self.window {
                            window.request_redraw();
                        }
                    }
                    Ok(None) => {}
                    Err(e) => self.fail(event_loop, SitecamError::RenderError(e.to_string())),
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.mouse.left_down = pressed,
                    MouseButton::Right => self.mouse.right_down = pressed,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let delta_x = (position.x - self.mouse.position.0) as f32;
                let delta_y = (position.y - self.mouse.position.1) as f32;
                self.mouse.position = (position.x, position.y);

                let Some(session) = &mut self.session else {
                    return;
                };
                let camera = session.camera_mut();
                if self.mouse.left_down {
                    camera.orbit(delta_x * ORBIT_SPEED, delta_y * ORBIT_SPEED);
                } else if self.mouse.right_down {
                    // Pan speed follows the distance to the target
                    let scale = camera.position.distance(camera.target) * 0.002;
                    camera.pan(-delta_x * scale, delta_y * scale);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(session) = &mut self.session {
                    let camera = session.camera_mut();
                    let scale = camera.position.distance(camera.target) * 0.1;
                    camera.zoom(scroll * scale);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
