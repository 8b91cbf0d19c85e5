//! sitecam: a site layout viewer with simulated camera captures.
//!
//! The viewer shows a 3D site with models and logical camera rigs, each rig
//! drawn with its field-of-view cone. When the host selects a camera, the
//! scene is also rendered from that camera into a small buffer sized from
//! its nominal resolution and shown as a picture-in-picture overlay in the
//! bottom-right corner.
//!
//! # Quick Start
//!
//! ```no_run
//! use sitecam::*;
//!
//! fn main() -> Result<()> {
//!     let selection = SharedSelection::new();
//!     let viewer = init(Options::default())?.with_selection(selection.clone());
//!
//!     // Preview the second rig
//!     selection.select(CameraSnapshot::new(Vec3::new(12.0, 4.0, 8.0), Vec3::Y, 45.0, 2688.0));
//!
//!     // Blocks until the window is closed
//!     viewer.show()
//! }
//! ```
//!
//! # Architecture
//!
//! - `sitecam-core` holds the GPU-free model: [`SceneGraph`], [`Selection`],
//!   [`CaptureConfig`], [`AssetLoader`], [`FrameDriver`] and [`Options`].
//! - `sitecam-render` holds the [`RenderBackend`] seam, the
//!   [`CaptureSimulator`], the [`OverlayCompositor`] and the wgpu
//!   [`RenderEngine`].
//! - This crate ties them into a [`RenderLoop`] session and a window.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Mouse deltas and surface sizes are small
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

mod app;
pub mod render_loop;
pub mod site;
pub mod viewport;

pub use render_loop::{FrameReport, RenderLoop};
pub use viewport::ViewportController;

// Re-export core types
pub use sitecam_core::{
    fixture_cameras, logical_cameras_from, AssetLoader, BufferSize, CameraRecord,
    CameraRecordSource, CameraSnapshot, CaptureConfig, FovParams, FovVolume, FrameDriver,
    FrameInfo, JsonRecordFile, Light, LoadOutcome, LoadedAsset, LogicalCamera, MainCameraConfig,
    Mesh, MeshSource, Options, OverlayConfig, PendingAssets, Result, SceneConfig, SceneGraph,
    SceneObject, Selection, SelectionSource, SharedSelection, SitecamError, TargetAxes,
    Transform,
};
pub use sitecam_core::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export render types
pub use sitecam_render::{
    Camera, CaptureSimulator, OverlayCompositor, OverlayPlacement, RenderBackend, RenderEngine,
    RenderError, RenderResult,
};

/// A configured viewer, ready to [`show`](Viewer::show).
pub struct Viewer {
    options: Options,
    selection: Box<dyn SelectionSource>,
    records: Box<dyn CameraRecordSource>,
}

impl Viewer {
    /// Sets where the selection is read from each frame.
    #[must_use]
    pub fn with_selection(mut self, selection: impl SelectionSource + 'static) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Sets where camera rigs come from.
    #[must_use]
    pub fn with_records(mut self, records: impl CameraRecordSource + 'static) -> Self {
        self.records = Box::new(records);
        self
    }

    /// The validated options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Opens the viewer window and blocks until it is closed.
    pub fn show(self) -> Result<()> {
        let _ = env_logger::try_init();
        log::info!("showing {}", self.options.window_title);
        app::run_app(self.options, self.selection, self.records)
    }
}

/// Validates `options` and prepares a viewer.
///
/// Camera rigs come from `options.camera_records` when set, and otherwise
/// from the built-in fixture pair. No camera is selected initially.
pub fn init(options: Options) -> Result<Viewer> {
    options.validate()?;
    let records: Box<dyn CameraRecordSource> = match &options.camera_records {
        Some(path) => Box::new(JsonRecordFile::new(path.clone())),
        None => Box::new(Vec::<CameraRecord>::new()),
    };
    log::info!("sitecam initialized");
    Ok(Viewer {
        options,
        selection: Box::new(Selection::None),
        records,
    })
}

/// Shows a viewer with `options` and no selection.
pub fn show(options: Options) -> Result<()> {
    init(options)?.show()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_rejects_invalid_options() {
        let mut options = Options::default();
        options.capture.downscale = 0.0;
        assert!(init(options).is_err());
    }

    #[test]
    fn test_init_defaults() {
        let viewer = init(Options::default()).unwrap();
        assert_eq!(viewer.options().window_size, [1280, 800]);
    }
}
