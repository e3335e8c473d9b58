//! Per-id HTTP fetch.
//!
//! A fetcher turns one resource URL into a `FetchOutcome`: the status code of
//! whatever response came back, or the transport failure that prevented one.
//! Status semantics are not interpreted here; a 404 is as good an outcome as
//! a 200.

mod classify;
mod easy;

pub use self::classify::classify_curl_error;
pub use self::easy::{CurlFetcher, CurlOptions};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FetchError;

/// Result of one fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A response was received; carries its status code.
    Status(u16),
    /// No usable response; carries the cause.
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn failed(err: impl Into<FetchError>) -> Self {
        FetchOutcome::Failed(err.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchOutcome::Status(code) => Some(*code),
            FetchOutcome::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// Coarse cause of a failed fetch; failures are bucketed by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Connect or overall request timeout.
    Timeout,
    /// Refused, reset, DNS failure, or connection closed without a reply.
    Connection,
    /// Bad URL, unparseable status line, protocol error.
    Malformed,
    /// The fetch panicked inside a worker.
    Fault,
    Other,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connection => "connection",
            FailureKind::Malformed => "malformed",
            FailureKind::Fault => "fault",
            FailureKind::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchError {
    /// Bucket this error falls into.
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Curl(e) => classify_curl_error(e),
            FetchError::Malformed(_) => FailureKind::Malformed,
            FetchError::Panicked(_) => FailureKind::Fault,
            FetchError::Other(_) => FailureKind::Other,
        }
    }
}

/// Performs one blocking GET per call.
///
/// Implementations must be callable from many worker threads at once with no
/// coordination. Any `Fn(&str) -> FetchOutcome` closure is a fetcher, which is
/// how tests substitute deterministic responses.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> FetchOutcome;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> FetchOutcome + Send + Sync,
{
    fn fetch(&self, url: &str) -> FetchOutcome {
        self(url)
    }
}
