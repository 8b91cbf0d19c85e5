//! The seam between frame orchestration and the GPU.
//!
//! The render loop drives a frame through these calls in a fixed order:
//! `begin_frame`, `render_main`, then, if a camera is selected,
//! `render_capture` and `draw_overlay`, and finally `end_frame`. [`RenderEngine`](crate::RenderEngine) implements it on wgpu.

use sitecam_core::{BufferSize, SceneGraph};

use crate::camera::Camera;
use crate::error::RenderResult;
use crate::overlay::OverlayPlacement;

/// A renderer able to draw the site into the primary surface and into
/// off-screen capture targets.
pub trait RenderBackend {
    /// An off-screen color buffer plus whatever is needed to sample it.
    ///
    /// Targets are moved into [`RenderBackend::destroy_capture_target`], so a
    /// target can only be released once.
    type Target;

    /// Acquires the primary surface for a new frame.
    fn begin_frame(&mut self) -> RenderResult<()>;

    /// Draws the scene from the navigation camera into the primary surface.
    fn render_main(&mut self, scene: &SceneGraph, camera: &Camera) -> RenderResult<()>;

    /// Allocates an off-screen target with nearest-neighbor sampling.
    fn create_capture_target(&mut self, size: BufferSize) -> RenderResult<Self::Target>;

    /// Releases a capture target.
    fn destroy_capture_target(&mut self, target: Self::Target);

    /// Clears `target` and draws the scene into it from `camera`.
    fn render_capture(
        &mut self,
        target: &Self::Target,
        scene: &SceneGraph,
        camera: &Camera,
    ) -> RenderResult<()>;

    /// Draws `target` as a screen-space quad on top of the primary surface.
    fn draw_overlay(
        &mut self,
        target: &Self::Target,
        placement: &OverlayPlacement,
    ) -> RenderResult<()>;

    /// Submits and presents the frame.
    fn end_frame(&mut self) -> RenderResult<()>;

    /// Reconfigures the primary surface.
    fn resize_surface(&mut self, width: u32, height: u32);

    /// Drops the primary surface. Later frames fail with
    /// [`RenderError::SurfaceReleased`](crate::RenderError::SurfaceReleased).
    fn release_surface(&mut self);
}
