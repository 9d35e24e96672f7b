use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the normalizer, the batch processor and the engine seam.
///
/// Each variant carries the context of its domain (the path and the operation that
/// failed) so callers can log a complete message without parsing strings.
#[derive(Error, Debug)]
pub enum PoseBatchError {
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

    #[error("Engine error: {operation} failed: {message}")]
    Engine { operation: String, message: String },

    #[error("OpenPose models folder not found or empty (tried {primary:?} and {fallback:?})")]
    ModelFolderNotFound { primary: PathBuf, fallback: PathBuf },

    #[error("Ambiguous JSON output in {dir:?}: {} new files ({})", .candidates.len(), .candidates.join(", "))]
    AmbiguousSidecar {
        dir: PathBuf,
        candidates: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, PoseBatchError>;

impl PoseBatchError {
    pub(crate) fn fs(path: impl Into<PathBuf>, operation: &str, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            operation: operation.to_string(),
            source,
        }
    }

    pub(crate) fn engine(operation: &str, message: impl Into<String>) -> Self {
        Self::Engine {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// Convert I/O errors that reach a boundary without context.
///
/// Code that knows the path and operation builds `PoseBatchError::FileSystem` directly.
impl From<std::io::Error> for PoseBatchError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<image::ImageError> for PoseBatchError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}
