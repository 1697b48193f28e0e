//! Error types for the fetcher module

use crate::cache::CacheError;
use crate::error::Error as CrateError;
use thiserror::Error;

/// Error returned by an advisory source for a single attempt
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or timeout failure worth retrying
    #[error("transient network failure: {0}")]
    Transient(String),

    /// The server answered with a status other than success or not-found
    #[error("unexpected status {status}")]
    Status { status: u16 },

    /// The response body could not be read or decoded
    #[error("malformed response: {0}")]
    Body(String),

    /// The request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl SourceError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            SourceError::Transient(err.to_string())
        } else if err.is_body() || err.is_decode() {
            SourceError::Body(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::Status {
                status: status.as_u16(),
            }
        } else {
            SourceError::InvalidRequest(err.to_string())
        }
    }
}

/// Error type for fetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable source failure
    #[error("advisory source error: {0}")]
    Source(#[from] SourceError),

    /// Every attempt failed with a transient error
    #[error("fetch failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: SourceError },

    /// The cache refused the identifier
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Cancellation was requested mid-fetch
    #[error("fetch cancelled")]
    Cancelled,
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cache(e) => e.into(),
            FetchError::Cancelled => CrateError::Cancelled,
            _ => CrateError::Fetch(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(SourceError::Transient("timed out".to_string()).is_transient());
        assert!(!SourceError::Status { status: 503 }.is_transient());
        assert!(!SourceError::Body("invalid utf-8".to_string()).is_transient());
    }

    #[test]
    fn test_conversion_to_crate_error() {
        let err: CrateError = FetchError::Cancelled.into();
        assert!(matches!(err, CrateError::Cancelled));

        let err: CrateError = FetchError::RetriesExhausted {
            attempts: 3,
            last: SourceError::Transient("connection reset".to_string()),
        }
        .into();
        assert!(matches!(err, CrateError::Fetch(msg) if msg.contains("3 attempts")));
    }
}
