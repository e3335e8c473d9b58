//! Run engine: partition the id range, fan the batches out to workers, join,
//! and hand back the histogram with the elapsed time.
//!
//! A failed fetch never stops a batch. A panicking fetch ends its own batch
//! (or pool task) and is reported as a `WorkerFault`, but never stops its
//! siblings or the join. The only error a run returns is an invalid argument,
//! raised before the first request.

mod pool;
mod sequential;
mod threads;
mod worker;

pub use self::worker::WorkerFault;
pub use crate::config::Backend;

use std::time::Duration;

use crate::aggregate::{ResultAggregator, ResultHistogram};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::fetcher::Fetch;
use crate::partition::partition;
use crate::timer::timed;

/// Everything a run produces, as plain data.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub histogram: ResultHistogram,
    pub elapsed: Duration,
    pub backend: Backend,
    /// Batches planned by the partitioner, empty ones included.
    pub batches: u64,
    /// Workers that actually ran (threads for `threads`/`pool`, batches for `sequential`).
    pub workers_started: usize,
    pub faults: Vec<WorkerFault>,
}

/// Drives one run with a given fetcher and backend.
#[derive(Debug)]
pub struct Executor<F> {
    fetcher: F,
    backend: Backend,
}

impl<F: Fetch> Executor<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            backend: Backend::default(),
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Fetches every id in `[1, max_resource_id]` and blocks until all
    /// workers are done.
    pub fn run(&self, config: &RunConfig) -> Result<RunReport, RunError> {
        let plan = partition(config.max_resource_id(), config.workers())?;
        tracing::info!(
            workers = config.workers(),
            max_resource_id = config.max_resource_id(),
            base_url = config.base_url(),
            backend = %self.backend,
            batches = plan.batch_count(),
            "starting run"
        );

        let results = ResultAggregator::new();
        let (done, elapsed) = timed(|| match self.backend {
            Backend::Threads => threads::run(config, &self.fetcher, &plan, &results),
            Backend::Pool => pool::run(config, &self.fetcher, &plan, config.workers(), &results),
            Backend::Sequential => sequential::run(config, &self.fetcher, &plan, &results),
        });
        let histogram = results.into_histogram();

        tracing::info!(
            elapsed_ms = elapsed.as_millis() as u64,
            fetched = histogram.total(),
            failures = histogram.failures(),
            faults = done.faults.len(),
            "run finished"
        );

        Ok(RunReport {
            histogram,
            elapsed,
            backend: self.backend,
            batches: plan.batch_count(),
            workers_started: done.started,
            faults: done.faults,
        })
    }
}
