//! Error types for sitecam.

use thiserror::Error;

/// The main error type for sitecam operations.
#[derive(Error, Debug)]
pub enum SitecamError {
    /// A model file could not be parsed.
    #[error("failed to parse asset '{identifier}': {message}")]
    AssetParse { identifier: String, message: String },

    /// The asset identifier has an extension no loader understands.
    #[error("unsupported asset format: '{0}'")]
    UnsupportedFormat(String),

    /// Loading the asset did not finish in time.
    #[error("timed out loading asset '{0}'")]
    AssetTimeout(String),

    /// The asset parsed but contained no triangles.
    #[error("asset '{0}' contains no geometry")]
    EmptyMesh(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The camera record source could not be read.
    #[error("camera record source error: {0}")]
    RecordSource(String),

    /// Rendering error surfaced to the host.
    #[error("render error: {0}")]
    RenderError(String),

    /// Window or event loop error.
    #[error("event loop error: {0}")]
    EventLoop(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for sitecam operations.
pub type Result<T> = std::result::Result<T, SitecamError>;
