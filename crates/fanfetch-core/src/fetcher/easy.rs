//! libcurl-backed fetcher.

use std::time::Duration;

use super::{Fetch, FetchOutcome};
use crate::config::HttpConfig;
use crate::error::FetchError;

/// Transfer settings applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Hard cap on a whole request, headers and body included.
    pub timeout: Duration,
    pub follow_location: bool,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
            follow_location: true,
        }
    }
}

impl From<&HttpConfig> for CurlOptions {
    fn from(cfg: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs.max(1)),
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
            follow_location: cfg.follow_redirects,
        }
    }
}

/// Issues one GET per call with a fresh `Easy` handle; the body is read and
/// dropped. Holds no mutable state, so a single instance serves every worker.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    opts: CurlOptions,
}

impl CurlFetcher {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &CurlOptions {
        &self.opts
    }

    fn get(&self, url: &str) -> Result<u16, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(self.opts.follow_location)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.timeout(self.opts.timeout)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| Ok(data.len()))?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if code == 0 {
            return Err(FetchError::Malformed("no status line received".into()));
        }
        u16::try_from(code)
            .map_err(|_| FetchError::Malformed(format!("status code {} out of range", code)))
    }
}

impl Fetch for CurlFetcher {
    fn fetch(&self, url: &str) -> FetchOutcome {
        match self.get(url) {
            Ok(code) => FetchOutcome::Status(code),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FailureKind;

    #[test]
    fn options_from_http_config() {
        let cfg = HttpConfig {
            connect_timeout_secs: 0,
            timeout_secs: 7,
            follow_redirects: false,
        };
        let opts = CurlOptions::from(&cfg);
        assert_eq!(opts.connect_timeout, Duration::from_secs(1));
        assert_eq!(opts.timeout, Duration::from_secs(7));
        assert!(!opts.follow_location);
    }

    #[test]
    fn unsupported_scheme_is_a_failure_not_a_panic() {
        let fetcher = CurlFetcher::default();
        match fetcher.fetch("notaproto://example.invalid/1") {
            FetchOutcome::Failed(e) => assert_eq!(e.kind(), FailureKind::Malformed),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
