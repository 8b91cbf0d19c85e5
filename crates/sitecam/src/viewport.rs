//! Viewport resize handling.

use sitecam_render::{Camera, OverlayCompositor, RenderBackend};

/// Keeps the surface, the navigation camera and the overlay in step with the
/// window size.
#[derive(Debug, Clone)]
pub struct ViewportController {
    width: u32,
    height: u32,
    attached: bool,
}

impl ViewportController {
    /// Creates an attached controller for a `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            attached: true,
        }
    }

    /// Current surface size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Returns true until [`ViewportController::detach`] is called.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Applies a new surface size.
    ///
    /// Returns false when nothing changed: the controller is detached, the
    /// size is degenerate, or it matches the current one.
    pub fn apply<B: RenderBackend>(
        &mut self,
        width: u32,
        height: u32,
        backend: &mut B,
        camera: &mut Camera,
        overlay: &mut OverlayCompositor,
    ) -> bool {
        if !self.attached || width == 0 || height == 0 {
            return false;
        }
        if (width, height) == (self.width, self.height) {
            return false;
        }

        self.width = width;
        self.height = height;
        backend.resize_surface(width, height);
        camera.set_aspect_ratio(self.aspect_ratio());
        overlay.on_viewport_resize(width, height);
        log::debug!("viewport resized to {width}x{height}");
        true
    }

    /// Stops reacting to resizes. Safe to call repeatedly.
    pub fn detach(&mut self) {
        self.attached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecam_core::OverlayConfig;
    use sitecam_render::RecordingBackend;

    fn parts() -> (RecordingBackend, Camera, OverlayCompositor) {
        (
            RecordingBackend::new(1280, 800),
            Camera::new(1280.0 / 800.0),
            OverlayCompositor::new(OverlayConfig::default(), 1280, 800),
        )
    }

    #[test]
    fn test_apply_updates_everything() {
        let (mut backend, mut camera, mut overlay) = parts();
        let mut viewport = ViewportController::new(1280, 800);

        assert!(viewport.apply(1920, 1080, &mut backend, &mut camera, &mut overlay));
        assert_eq!(backend.surface_size(), Some((1920, 1080)));
        assert!((camera.aspect_ratio - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(overlay.bounds().right, 960.0);
    }

    #[test]
    fn test_same_size_is_noop() {
        let (mut backend, mut camera, mut overlay) = parts();
        let mut viewport = ViewportController::new(1280, 800);
        assert!(!viewport.apply(1280, 800, &mut backend, &mut camera, &mut overlay));
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_zero_size_ignored() {
        let (mut backend, mut camera, mut overlay) = parts();
        let mut viewport = ViewportController::new(1280, 800);
        assert!(!viewport.apply(0, 600, &mut backend, &mut camera, &mut overlay));
        assert_eq!(viewport.size(), (1280, 800));
    }

    #[test]
    fn test_detached_ignores_resizes() {
        let (mut backend, mut camera, mut overlay) = parts();
        let mut viewport = ViewportController::new(1280, 800);
        viewport.detach();
        viewport.detach();
        assert!(!viewport.apply(1920, 1080, &mut backend, &mut camera, &mut overlay));
        assert_eq!(backend.surface_size(), Some((1280, 800)));
    }
}
