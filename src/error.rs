//! Error types for the guidetag crate

use thiserror::Error;

/// Result type for guidetag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for guidetag operations
#[derive(Debug, Error)]
pub enum Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The external identifier could not be normalized
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A cache path resolved outside the cache root
    #[error("Path traversal detected: {0}")]
    PathTraversal(String),

    /// Advisory retrieval failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The catalog store rejected a change
    #[error("Persist error: {0}")]
    Persist(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was cancelled
    #[error("Operation cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use crate::cancel::Cancelled;
    use crate::config::TaggerConfig;
    use crate::fetcher::FetchError;
    use crate::identifier::normalize;
    use crate::pipeline::PersistError;

    fn kind(err: &Error) -> &'static str {
        match err {
            Error::Json(_) => "json",
            Error::Io(_) => "io",
            Error::InvalidIdentifier(_) => "identifier",
            Error::PathTraversal(_) => "traversal",
            Error::Fetch(_) => "fetch",
            Error::Persist(_) => "persist",
            Error::Config(_) => "config",
            Error::Cancelled => "cancelled",
        }
    }

    #[tokio::test]
    async fn test_every_variant_has_a_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();

        let errors: Vec<Error> = vec![
            serde_json::from_str::<u32>("{").unwrap_err().into(),
            CacheError::Io(std::io::Error::other("disk full")).into(),
            normalize("not an id").unwrap_err().into(),
            CacheError::PathTraversalDetected { path: missing }.into(),
            FetchError::Source(crate::fetcher::SourceError::Status { status: 500 }).into(),
            PersistError::Rejected {
                item: "Film".to_string(),
                reason: "read-only".to_string(),
            }
            .into(),
            TaggerConfig::from_file(&broken).await.unwrap_err(),
            Cancelled.into(),
        ];

        let kinds: Vec<&str> = errors.iter().map(kind).collect();
        assert_eq!(
            kinds,
            vec!["json", "io", "identifier", "traversal", "fetch", "persist", "config", "cancelled"]
        );
    }
}
