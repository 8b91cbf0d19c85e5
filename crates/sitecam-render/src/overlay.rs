//! Picture-in-picture overlay placement.
//!
//! The overlay lives in an orthographic space whose origin is the center of
//! the surface and whose units are surface pixels (+Y up). The quad keeps a
//! fixed presentation size regardless of the capture buffer resolution, so
//! small buffers are visibly magnified.

use glam::{Mat4, Vec2, Vec3};
use sitecam_core::OverlayConfig;

use crate::backend::RenderBackend;
use crate::camera::{Camera, OrthoBounds};
use crate::error::RenderResult;

/// Depth range of the overlay's orthographic camera.
const OVERLAY_NEAR: f32 = 0.0;
const OVERLAY_FAR: f32 = 10.0;

/// Where the overlay quad goes for the current surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    /// Quad center in overlay space.
    pub center: Vec2,
    /// Quad size in surface pixels.
    pub size: Vec2,
    /// Orthographic bounds of the overlay space.
    pub bounds: OrthoBounds,
}

impl OverlayPlacement {
    /// Orthographic projection of the overlay space.
    pub fn projection(&self) -> Mat4 {
        Camera::orthographic(self.bounds).view_projection_matrix()
    }

    /// Maps the unit quad `[-0.5, 0.5]²` onto the placed quad.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.center.x, self.center.y, -1.0))
            * Mat4::from_scale(Vec3::new(self.size.x, self.size.y, 1.0))
    }

    /// Full transform for the unit quad.
    pub fn clip_from_quad(&self) -> Mat4 {
        self.projection() * self.model_matrix()
    }

    /// Quad rectangle in surface pixels with a top-left origin:
    /// `(x, y, width, height)`.
    pub fn pixel_rect(&self) -> (f32, f32, f32, f32) {
        let x = self.center.x - self.size.x * 0.5 - self.bounds.left;
        let y = self.bounds.top - (self.center.y + self.size.y * 0.5);
        (x, y, self.size.x, self.size.y)
    }
}

/// Positions and draws the captured image as a screen-space quad pinned to
/// the bottom-right corner.
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    config: OverlayConfig,
    camera: Camera,
    placement: OverlayPlacement,
}

impl OverlayCompositor {
    /// Creates a compositor for a `width` x `height` surface.
    pub fn new(config: OverlayConfig, width: u32, height: u32) -> Self {
        let bounds = Self::bounds_for(width, height);
        let placement = Self::place(&config, bounds);
        Self {
            config,
            camera: Camera::orthographic(bounds),
            placement,
        }
    }

    fn bounds_for(width: u32, height: u32) -> OrthoBounds {
        OrthoBounds::centered(width as f32, height as f32, OVERLAY_NEAR, OVERLAY_FAR)
    }

    fn place(config: &OverlayConfig, bounds: OrthoBounds) -> OverlayPlacement {
        OverlayPlacement {
            center: Vec2::new(
                bounds.right - config.offset_x,
                bounds.bottom + config.offset_y,
            ),
            size: Vec2::new(config.width, config.height),
            bounds,
        }
    }

    /// Updates the orthographic bounds to the new half-extents and re-pins
    /// the quad to the new bottom-right corner.
    pub fn on_viewport_resize(&mut self, width: u32, height: u32) {
        let bounds = Self::bounds_for(width, height);
        self.camera.set_ortho_bounds(bounds);
        self.placement = Self::place(&self.config, bounds);
    }

    /// Current placement.
    pub fn placement(&self) -> &OverlayPlacement {
        &self.placement
    }

    /// Orthographic camera of the overlay pass.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Current orthographic bounds.
    pub fn bounds(&self) -> OrthoBounds {
        self.placement.bounds
    }

    /// Quad center in overlay space.
    pub fn quad_center(&self) -> Vec2 {
        self.placement.center
    }

    /// Quad size in pixels.
    pub fn quad_size(&self) -> Vec2 {
        self.placement.size
    }

    /// Distance of the quad center from the bottom-right corner, measured
    /// leftwards and upwards.
    pub fn corner_offset(&self) -> Vec2 {
        let b = self.placement.bounds;
        Vec2::new(
            b.right - self.placement.center.x,
            self.placement.center.y - b.bottom,
        )
    }

    /// Draws `target` on top of the current frame.
    pub fn draw<B: RenderBackend>(&self, backend: &mut B, target: &B::Target) -> RenderResult<()> {
        backend.draw_overlay(target, &self.placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_placement() {
        let overlay = OverlayCompositor::new(OverlayConfig::default(), 1280, 800);
        assert_eq!(overlay.quad_center(), Vec2::new(470.0, -300.0));
        assert_eq!(overlay.quad_size(), Vec2::new(320.0, 180.0));
        assert_eq!(overlay.corner_offset(), Vec2::new(170.0, 100.0));
    }

    #[test]
    fn test_resize_keeps_corner_offset() {
        let mut overlay = OverlayCompositor::new(OverlayConfig::default(), 1280, 800);
        overlay.on_viewport_resize(1920, 1080);
        assert_eq!(overlay.bounds().right, 960.0);
        assert_eq!(overlay.bounds().bottom, -540.0);
        assert_eq!(overlay.quad_center(), Vec2::new(790.0, -440.0));
        assert_eq!(overlay.corner_offset(), Vec2::new(170.0, 100.0));
        assert_eq!(overlay.quad_size(), Vec2::new(320.0, 180.0));
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut overlay = OverlayCompositor::new(OverlayConfig::default(), 1280, 800);
        overlay.on_viewport_resize(1920, 1080);
        let first = *overlay.placement();
        overlay.on_viewport_resize(1920, 1080);
        assert_eq!(*overlay.placement(), first);
    }

    #[test]
    fn test_pixel_rect() {
        let overlay = OverlayCompositor::new(OverlayConfig::default(), 1280, 800);
        let (x, y, w, h) = overlay.placement().pixel_rect();
        // Center at 170 px from the right and 100 px from the bottom
        assert_eq!(x + w * 0.5, 1280.0 - 170.0);
        assert_eq!(y + h * 0.5, 800.0 - 100.0);
    }

    #[test]
    fn test_clip_space_corners() {
        let overlay = OverlayCompositor::new(OverlayConfig::default(), 1280, 800);
        let m = overlay.placement().clip_from_quad();
        let top_right = m.project_point3(Vec3::new(0.5, 0.5, 0.0));
        let expected_x = (470.0 + 160.0) / 640.0;
        let expected_y = (-300.0 + 90.0) / 400.0;
        assert!((top_right.x - expected_x).abs() < 1e-5);
        assert!((top_right.y - expected_y).abs() < 1e-5);
        assert!(top_right.z >= 0.0 && top_right.z <= 1.0);
    }

    proptest! {
        #[test]
        fn prop_corner_offset_survives_any_resize(
            w in 200u32..4000,
            h in 200u32..3000,
        ) {
            let mut overlay = OverlayCompositor::new(OverlayConfig::default(), 1280, 800);
            overlay.on_viewport_resize(w, h);
            let offset = overlay.corner_offset();
            prop_assert!((offset.x - 170.0).abs() < 1e-3);
            prop_assert!((offset.y - 100.0).abs() < 1e-3);
            prop_assert_eq!(overlay.quad_size(), Vec2::new(320.0, 180.0));
        }
    }
}
