//! Rendering for sitecam.
//!
//! [`RenderBackend`] is the seam between frame orchestration and the GPU.
//! [`RenderEngine`] implements it on wgpu; with the `recording` feature,
//! [`RecordingBackend`] implements it in memory for tests.
//!
//! On top of the backend sit the [`CaptureSimulator`], which keeps a single
//! off-screen buffer sized from the selected camera's resolution, and the
//! [`OverlayCompositor`], which pins that buffer to the bottom-right corner
//! of the window.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Surface sizes and index counts fit comfortably
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod backend;
pub mod buffer;
pub mod camera;
pub mod capture;
pub mod engine;
pub mod error;
pub mod mesh_render;
pub mod overlay;
pub mod overlay_pass;
#[cfg(any(test, feature = "recording"))]
pub mod recording;

pub use backend::RenderBackend;
pub use camera::{Camera, OrthoBounds, ProjectionMode};
pub use capture::CaptureSimulator;
pub use engine::{CameraUniforms, CaptureTarget, LightUniforms, RenderEngine};
pub use error::{RenderError, RenderResult};
pub use mesh_render::{MeshRenderData, MeshUniforms, MeshVertex};
pub use overlay::{OverlayCompositor, OverlayPlacement};
pub use overlay_pass::OverlayPass;
#[cfg(any(test, feature = "recording"))]
pub use recording::{BackendEvent, RecordedTarget, RecordingBackend};
