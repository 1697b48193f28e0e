//! Error types for the cache module

use std::io;
use std::path::PathBuf;

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for cache operations
///
/// Missing, expired and corrupt entries are not errors; `get` reports them as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The entry path resolved outside the cache root
    #[error("path traversal detected: {} is outside the cache root", path.display())]
    PathTraversalDetected { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CacheError> for CrateError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::PathTraversalDetected { path } => {
                CrateError::PathTraversal(path.display().to_string())
            }
            CacheError::Io(e) => CrateError::Io(e),
            CacheError::Json(e) => CrateError::Json(e),
        }
    }
}
