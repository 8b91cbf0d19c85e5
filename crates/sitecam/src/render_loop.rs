//! The render session.
//!
//! One [`RenderLoop`] owns the scene and everything drawn from it. Each call
//! to [`RenderLoop::tick`] runs one frame in a fixed order:
//!
//! 1. take the loaded models if the loading gate has opened,
//! 2. sample the selection,
//! 3. draw the main view,
//! 4. if a camera is selected and the models are in, render its capture and
//!    composite the overlay; with no selection, drop the capture buffer,
//! 5. present.
//!
//! Transient surface problems skip the frame. Anything fatal tears the
//! session down and is returned to the host.

use sitecam_core::{
    BufferSize, CameraSnapshot, FrameDriver, FrameInfo, LogicalCamera, Options, PendingAssets,
    SceneConfig, SceneGraph, Selection, SelectionSource,
};
use sitecam_render::{Camera, CaptureSimulator, OverlayCompositor, RenderBackend, RenderResult};

use crate::site;
use crate::viewport::ViewportController;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Tick counter and delta time.
    pub info: FrameInfo,
    /// False if the frame was skipped after a transient error.
    pub presented: bool,
    /// Size of the capture rendered this frame, if any.
    pub capture: Option<BufferSize>,
}

/// A running viewer session over some [`RenderBackend`].
pub struct RenderLoop<B: RenderBackend> {
    backend: B,
    scene: SceneGraph,
    scene_config: SceneConfig,
    camera: Camera,
    viewport: ViewportController,
    capture: CaptureSimulator<B::Target>,
    overlay: OverlayCompositor,
    driver: FrameDriver,
    assets: PendingAssets,
    assets_ready: bool,
    selection: Box<dyn SelectionSource>,
    torn_down: bool,
}

impl<B: RenderBackend> RenderLoop<B> {
    /// Creates a stopped session drawing into a `width` x `height` surface.
    ///
    /// The scene starts with the ground and lights only. Without
    /// [`RenderLoop::with_assets`] the loading gate is open from the start.
    pub fn new(
        backend: B,
        options: &Options,
        width: u32,
        height: u32,
        selection: Box<dyn SelectionSource>,
    ) -> Self {
        let viewport = ViewportController::new(width, height);
        let camera = Camera::from_config(&options.main_camera, viewport.aspect_ratio());
        let (width, height) = viewport.size();
        Self {
            backend,
            scene: site::base_scene(&options.scene),
            scene_config: options.scene,
            camera,
            viewport,
            capture: CaptureSimulator::new(options.capture),
            overlay: OverlayCompositor::new(options.overlay, width, height),
            driver: FrameDriver::new(),
            assets: PendingAssets::ready(Vec::new()),
            assets_ready: false,
            selection,
            torn_down: false,
        }
    }

    /// Adds camera rigs to the scene.
    #[must_use]
    pub fn with_cameras(mut self, cameras: impl IntoIterator<Item = LogicalCamera>) -> Self {
        site::add_cameras(&mut self.scene, cameras);
        self
    }

    /// Sets the gate the models arrive through.
    #[must_use]
    pub fn with_assets(mut self, assets: PendingAssets) -> Self {
        self.assets = assets;
        self.assets_ready = false;
        self
    }

    /// Starts ticking. Has no effect after teardown.
    pub fn start(&mut self) {
        if self.torn_down {
            log::warn!("render loop already torn down, not restarting");
            return;
        }
        self.driver.start();
        log::info!(
            "render loop started: {} objects, {} cameras",
            self.scene.object_count(),
            self.scene.camera_count()
        );
    }

    /// Runs one frame. Returns `Ok(None)` when the loop is not running.
    pub fn tick(&mut self) -> RenderResult<Option<FrameReport>> {
        let Some(info) = self.driver.tick() else {
            return Ok(None);
        };

        self.poll_assets();
        let selection = self.selection.sample();

        match self.draw(&selection) {
            Ok(capture) => Ok(Some(FrameReport {
                info,
                presented: true,
                capture,
            })),
            Err(e) if !e.is_fatal() => {
                log::debug!("skipped frame {}: {e}", info.index);
                Ok(Some(FrameReport {
                    info,
                    presented: false,
                    capture: None,
                }))
            }
            Err(e) => {
                log::error!("render loop stopped on frame {}: {e}", info.index);
                self.teardown();
                Err(e)
            }
        }
    }

    fn poll_assets(&mut self) {
        if self.assets_ready {
            return;
        }
        if let Some(assets) = self.assets.try_take() {
            let fallbacks = assets.iter().filter(|a| a.is_fallback()).count();
            let placed = site::place_assets(&mut self.scene, assets, &self.scene_config);
            self.assets_ready = true;
            log::info!(
                "scene ready: {} models ({fallbacks} placeholders)",
                placed.len()
            );
        }
    }

    fn draw(&mut self, selection: &Selection) -> RenderResult<Option<BufferSize>> {
        self.backend.begin_frame()?;
        self.backend.render_main(&self.scene, &self.camera)?;

        let mut captured = None;
        match selection.snapshot() {
            Some(snapshot) if self.assets_ready => {
                match self.capture.capture(&mut self.backend, &self.scene, snapshot) {
                    Ok(size) => {
                        if let Some(target) = self.capture.target() {
                            self.overlay.draw(&mut self.backend, target)?;
                        }
                        captured = Some(size);
                    }
                    Err(e) if !e.is_fatal() => log::warn!("capture skipped: {e}"),
                    Err(e) => return Err(e),
                }
            }
            // Still loading; the main view keeps going.
            Some(_) => {}
            None => self.capture.release(&mut self.backend),
        }

        self.backend.end_frame()?;
        Ok(captured)
    }

    /// Applies a new surface size. Returns true if anything changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.viewport.apply(
            width,
            height,
            &mut self.backend,
            &mut self.camera,
            &mut self.overlay,
        )
    }

    /// Stops ticking and releases the capture buffer and the surface.
    ///
    /// Idempotent; also runs on drop.
    pub fn teardown(&mut self) {
        self.driver.stop();
        self.viewport.detach();
        self.capture.release(&mut self.backend);
        if !std::mem::replace(&mut self.torn_down, true) {
            self.backend.release_surface();
            log::info!(
                "render loop torn down after {} frames",
                self.driver.frame_count()
            );
        }
    }

    /// Selection snapshot of the rig called `name`.
    pub fn snapshot_of(&self, name: &str) -> Option<CameraSnapshot> {
        self.scene
            .camera_by_name(name)
            .map(|(_, camera)| camera.snapshot())
    }

    /// The rendering backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The rendering backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The scene.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// The navigation camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The navigation camera, for orbit, pan and zoom.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The capture simulator.
    pub fn capture(&self) -> &CaptureSimulator<B::Target> {
        &self.capture
    }

    /// The overlay compositor.
    pub fn overlay(&self) -> &OverlayCompositor {
        &self.overlay
    }

    /// The resize handler.
    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// Returns true once the models have been placed.
    pub fn is_ready(&self) -> bool {
        self.assets_ready
    }

    /// Returns true between `start` and teardown.
    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    /// Returns true after [`RenderLoop::teardown`].
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Number of ticks run so far.
    pub fn frame_count(&self) -> u64 {
        self.driver.frame_count()
    }
}

impl<B: RenderBackend> Drop for RenderLoop<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecam_render::{BackendEvent, RecordingBackend, RenderError};

    fn session() -> RenderLoop<RecordingBackend> {
        let mut session = RenderLoop::new(
            RecordingBackend::new(1280, 800),
            &Options::default(),
            1280,
            800,
            Box::new(Selection::None),
        );
        session.start();
        session
    }

    #[test]
    fn test_stopped_loop_does_nothing() {
        let mut session = RenderLoop::new(
            RecordingBackend::new(1280, 800),
            &Options::default(),
            1280,
            800,
            Box::new(Selection::None),
        );
        assert_eq!(session.tick().unwrap(), None);
        assert!(session.backend().events().is_empty());
    }

    #[test]
    fn test_frame_order_without_selection() {
        let mut session = session();
        let report = session.tick().unwrap().unwrap();
        assert!(report.presented);
        assert_eq!(report.capture, None);

        let events = session.backend().events();
        assert!(matches!(events[0], BackendEvent::BeginFrame));
        assert!(matches!(events[1], BackendEvent::RenderMain { .. }));
        assert!(matches!(events[2], BackendEvent::EndFrame));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_transient_error_skips_frame() {
        let mut session = session();
        session
            .backend_mut()
            .fail_next_frame(RenderError::SurfaceOutdated);
        let report = session.tick().unwrap().unwrap();
        assert!(!report.presented);
        assert!(session.is_running());

        let report = session.tick().unwrap().unwrap();
        assert!(report.presented);
        assert_eq!(report.info.index, 1);
    }

    #[test]
    fn test_fatal_error_tears_down() {
        let mut session = session();
        session.backend_mut().fail_next_frame(RenderError::OutOfMemory);
        assert!(matches!(session.tick(), Err(RenderError::OutOfMemory)));
        assert!(session.is_torn_down());
        assert!(!session.is_running());
        assert_eq!(session.backend().surface_size(), None);
        assert_eq!(session.tick().unwrap(), None);
    }

    #[test]
    fn test_start_after_teardown_is_ignored() {
        let mut session = session();
        session.teardown();
        session.start();
        assert!(!session.is_running());
    }
}
