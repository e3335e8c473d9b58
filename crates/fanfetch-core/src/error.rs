//! Error types for a run.
//!
//! Only `RunError` ever reaches the caller of `Executor::run`. A `FetchError`
//! is carried inside a `FetchOutcome` and ends up as a histogram bucket.

use thiserror::Error;

/// Hard failure of a whole run; raised before any request is sent.
#[derive(Debug, Error)]
pub enum RunError {
    /// Malformed run configuration (zero workers, zero max id, bad base URL).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RunError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RunError::InvalidArgument(msg.into())
    }
}

/// Transport-level failure of a single fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// libcurl reported an error (timeout, refused connection, empty reply...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The request completed but no usable status code came back.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The fetch panicked; caught at the worker boundary.
    #[error("{0}")]
    Panicked(String),
    /// Failure injected by a non-curl fetcher (tests, dry runs).
    #[error("{0}")]
    Other(String),
}
