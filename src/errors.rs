use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the hand landmark pipeline.
///
/// Each variant carries the context of its error domain (filesystem, image decoding and
/// encoding, model inference, detector output validation), so callers can report what failed
/// and where without parsing error strings.
#[derive(Error, Debug)]
pub enum HandLandmarkError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, HandLandmarkError>;

impl HandLandmarkError {
    /// Builds a [`HandLandmarkError::Model`] from any error raised while talking to the runtime.
    pub fn model<E>(operation: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Model {
            operation: operation.into(),
            source: Box::new(source),
        }
    }
}

/// Convert anyhow errors to configuration errors.
///
/// Only configuration-time helpers produce anyhow errors, so they land in the configuration
/// category.
impl From<anyhow::Error> for HandLandmarkError {
    fn from(err: anyhow::Error) -> Self {
        HandLandmarkError::Configuration {
            message: err.to_string(),
        }
    }
}

/// Convert I/O errors to filesystem errors.
///
/// Code that knows the path and operation should build [`HandLandmarkError::FileSystem`]
/// directly instead of relying on this fallback.
impl From<std::io::Error> for HandLandmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<image::ImageError> for HandLandmarkError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<ort::Error> for HandLandmarkError {
    fn from(err: ort::Error) -> Self {
        Self::model("ort operation", err)
    }
}

/// Shape errors come out of tensor reshaping around inference, so they count as model errors.
impl From<ndarray::ShapeError> for HandLandmarkError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::model("tensor shape conversion", err)
    }
}
