//! Rendering error types.

use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    /// The surface offers no usable texture format.
    #[error("surface configuration failed")]
    SurfaceConfigurationFailed,

    /// An off-screen capture target could not be allocated.
    #[error("capture target allocation failed: {0}")]
    TargetAllocationFailed(String),

    /// A frame operation was issued outside begin/end.
    #[error("no frame in progress")]
    NoFrame,

    /// Surface lost; it has been reconfigured.
    #[error("surface lost")]
    SurfaceLost,

    /// Surface outdated; it has been reconfigured.
    #[error("surface outdated")]
    SurfaceOutdated,

    /// The surface has been released during teardown.
    #[error("surface released")]
    SurfaceReleased,

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,
}

impl RenderError {
    /// Returns true if the render loop cannot continue after this error.
    ///
    /// Transient surface conditions and failed capture allocations only skip
    /// the current frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RenderError::SurfaceLost
                | RenderError::SurfaceOutdated
                | RenderError::Timeout
                | RenderError::NoFrame
                | RenderError::TargetAllocationFailed(_)
        )
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => RenderError::SurfaceLost,
            wgpu::SurfaceError::Outdated => RenderError::SurfaceOutdated,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            _ => RenderError::Timeout,
        }
    }
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(!RenderError::SurfaceLost.is_fatal());
        assert!(!RenderError::SurfaceOutdated.is_fatal());
        assert!(!RenderError::Timeout.is_fatal());
        assert!(RenderError::OutOfMemory.is_fatal());
        assert!(RenderError::SurfaceReleased.is_fatal());
        assert!(!RenderError::TargetAllocationFailed("x".into()).is_fatal());
    }

    #[test]
    fn test_surface_error_mapping() {
        assert!(matches!(
            RenderError::from(wgpu::SurfaceError::Outdated),
            RenderError::SurfaceOutdated
        ));
        assert!(matches!(
            RenderError::from(wgpu::SurfaceError::OutOfMemory),
            RenderError::OutOfMemory
        ));
    }
}
