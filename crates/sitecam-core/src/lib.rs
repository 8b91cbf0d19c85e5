//! Core abstractions for sitecam.
//!
//! This crate holds everything that does not touch the GPU:
//! - [`SceneGraph`] with arena handles for placed objects, lights and camera rigs
//! - [`LogicalCamera`] rigs and the [`FovVolume`] that visualizes their coverage
//! - [`Selection`] input and the [`CaptureConfig`] sizing policy for simulated captures
//! - [`AssetLoader`] for asynchronous model loading with placeholder fallback
//! - [`FrameDriver`] for the continuously re-scheduled render tick
//! - [`Options`] configuration and camera record sources

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel sizes are small positive values
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod assets;
pub mod capture;
pub mod error;
pub mod fov;
pub mod frame;
pub mod mesh;
pub mod options;
pub mod records;
pub mod scene;
pub mod selection;

pub use assets::{AssetLoader, LoadOutcome, LoadedAsset, PendingAssets};
pub use capture::{AspectRatio, BufferSize, CaptureConfig};
pub use error::{Result, SitecamError};
pub use fov::{FovParams, FovVolume};
pub use frame::{FrameDriver, FrameInfo};
pub use mesh::{Mesh, MeshSource};
pub use options::{color_from_hex, MainCameraConfig, Options, OverlayConfig, SceneConfig};
pub use records::{
    fixture_cameras, logical_cameras_from, CameraRecord, CameraRecordSource, JsonRecordFile,
};
pub use scene::{
    CameraId, Handle, Light, LightId, LogicalCamera, ObjectId, ObjectKind, SceneGraph,
    SceneNode, SceneObject, Transform,
};
pub use selection::{CameraSnapshot, Selection, SelectionSource, SharedSelection, TargetAxes};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
