//! Integration test: real curl fetches against a local HTTP server.
//!
//! Starts a minimal server whose status depends on the requested id, runs the
//! executor with every backend, and checks the histogram and request count.

mod common;

use common::status_server::{self, Reply};
use fanfetch_core::config::HttpConfig;
use fanfetch_core::{Backend, CurlFetcher, CurlOptions, Executor, FailureKind, RunConfig};

fn odd_ok_even_missing(id: u64) -> Reply {
    if id % 2 == 1 {
        Reply::Status(200)
    } else {
        Reply::Status(404)
    }
}

fn every_fifth_hangs_up(id: u64) -> Reply {
    if id % 5 == 0 {
        Reply::Hangup
    } else {
        Reply::Status(200)
    }
}

fn fast_fetcher() -> CurlFetcher {
    CurlFetcher::new(CurlOptions::from(&HttpConfig {
        connect_timeout_secs: 2,
        timeout_secs: 5,
        follow_redirects: true,
    }))
}

#[test]
fn odd_even_histogram_over_http() {
    for backend in [Backend::Threads, Backend::Pool, Backend::Sequential] {
        let server = status_server::start(odd_ok_even_missing);
        let config = RunConfig::new(2, 10, &server.base_url).unwrap();
        let report = Executor::new(fast_fetcher())
            .with_backend(backend)
            .run(&config)
            .expect("run");

        assert_eq!(report.histogram.status(200), 5, "{}", backend);
        assert_eq!(report.histogram.status(404), 5, "{}", backend);
        assert_eq!(report.histogram.failures(), 0);
        assert_eq!(server.hits(), 10);
        assert!(report.faults.is_empty());
    }
}

#[test]
fn trailing_slash_base_url_still_reaches_ids() {
    let server = status_server::start(odd_ok_even_missing);
    let config = RunConfig::new(3, 9, &format!("{}/", server.base_url)).unwrap();
    let report = Executor::new(fast_fetcher()).run(&config).unwrap();
    assert_eq!(report.histogram.status(200), 5);
    assert_eq!(report.histogram.status(404), 4);
}

#[test]
fn dropped_connections_are_counted_not_lost() {
    let server = status_server::start(every_fifth_hangs_up);
    let config = RunConfig::new(4, 50, &server.base_url).unwrap();
    let report = Executor::new(fast_fetcher()).run(&config).unwrap();

    assert_eq!(report.histogram.failure(FailureKind::Connection), 10);
    assert_eq!(report.histogram.status(200), 40);
    assert_eq!(report.histogram.total(), 50);
    assert_eq!(server.hits(), 50);
}

#[test]
fn refused_connections_fill_the_failure_bucket() {
    let config = RunConfig::new(2, 6, &status_server::refused_base_url()).unwrap();
    let report = Executor::new(fast_fetcher()).run(&config).unwrap();
    assert_eq!(report.histogram.failures(), 6);
    assert_eq!(report.histogram.failure(FailureKind::Connection), 6);
    assert_eq!(report.histogram.responses(), 0);
}
