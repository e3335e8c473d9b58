//! Worker body shared by every backend.
//!
//! A fetch that panics ends the unit of work it belongs to: the whole batch
//! for `threads`/`sequential`, one id for `pool`. The unit is reported once as
//! a `WorkerFault`; the panicking id and every id of the unit not yet fetched
//! are counted under `failed:fault`, so the histogram still covers the whole
//! range. Outcomes recorded before the panic stay.
//!
//! Panics outside a fetch are caught at the thread join, or by `guarded` on
//! the calling thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::aggregate::{OutcomeKey, ResultAggregator};
use crate::config::RunConfig;
use crate::error::FetchError;
use crate::fetcher::{FailureKind, Fetch, FetchOutcome};
use crate::partition::IdBatch;

/// A unit of work that ended in a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFault {
    /// Worker index (batch index for `threads`/`sequential`, pool slot for `pool`).
    pub worker: usize,
    /// Batch the worker owned, if it owned one. Pool tasks own a single id.
    pub batch: Option<IdBatch>,
    pub message: String,
}

/// What a backend reports back to the executor.
#[derive(Debug, Default)]
pub(super) struct Completion {
    pub started: usize,
    pub faults: Vec<WorkerFault>,
}

pub(super) type PanicPayload = Box<dyn Any + Send + 'static>;

/// Fetches one id and logs it if it failed. A panicking fetcher comes back
/// as `Err` with the panic payload.
pub(super) fn attempt<F: Fetch>(
    config: &RunConfig,
    fetcher: &F,
    id: u64,
) -> Result<FetchOutcome, PanicPayload> {
    let url = config.resource_url(id);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch(&url)))?;
    if let FetchOutcome::Failed(e) = &outcome {
        tracing::warn!(id, kind = %e.kind(), "GET {} failed: {}", url, e);
    }
    Ok(outcome)
}

/// Fetches every id of `batch` in ascending order, recording each outcome as
/// soon as it is known. Returns how many ids were fetched.
pub(super) fn run_batch<F: Fetch>(
    index: usize,
    batch: IdBatch,
    config: &RunConfig,
    fetcher: &F,
    results: &ResultAggregator,
) -> Result<u64, WorkerFault> {
    tracing::debug!(worker = index, %batch, "worker started");
    for id in batch.ids() {
        match attempt(config, fetcher, id) {
            Ok(outcome) => results.record(&outcome),
            Err(payload) => {
                let fault = fetch_fault(index, batch, id, payload.as_ref());
                results.record(&FetchOutcome::failed(FetchError::Panicked(
                    fault.message.clone(),
                )));
                results.record_n(OutcomeKey::Failure(FailureKind::Fault), batch.end - id - 1);
                return Err(fault);
            }
        }
    }
    tracing::debug!(worker = index, %batch, fetched = batch.len(), "worker finished");
    Ok(batch.len())
}

/// Runs `body` on the current thread, turning a panic into a `WorkerFault`.
pub(super) fn guarded<T>(
    worker: usize,
    batch: Option<IdBatch>,
    body: impl FnOnce() -> T,
) -> Result<T, WorkerFault> {
    panic::catch_unwind(AssertUnwindSafe(body))
        .map_err(|payload| fault(worker, batch, payload.as_ref()))
}

/// Builds and logs the fault for a fetch of `id` that panicked inside `batch`.
pub(super) fn fetch_fault(
    worker: usize,
    batch: IdBatch,
    id: u64,
    payload: &(dyn Any + Send),
) -> WorkerFault {
    let message = format!("fetch of id {} panicked: {}", id, panic_message(payload));
    let abandoned = batch.end - id - 1;
    tracing::error!(worker, %batch, id, abandoned, "{}", message);
    WorkerFault {
        worker,
        batch: Some(batch),
        message,
    }
}

/// Builds and logs the fault for a worker that panicked outside a fetch.
pub(super) fn fault(worker: usize, batch: Option<IdBatch>, payload: &(dyn Any + Send)) -> WorkerFault {
    let message = panic_message(payload);
    match &batch {
        Some(b) => tracing::error!(worker, batch = %b, "worker panicked: {}", message),
        None => tracing::error!(worker, "worker panicked: {}", message),
    }
    WorkerFault {
        worker,
        batch,
        message,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn config() -> RunConfig {
        RunConfig::new(1, 10, "http://test.invalid/items").unwrap()
    }

    #[test]
    fn attempt_hands_back_the_panic() {
        let fetcher = |_: &str| -> FetchOutcome { panic!("fetcher blew up") };
        let payload = attempt(&config(), &fetcher, 1).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "fetcher blew up");
    }

    #[test]
    fn attempt_passes_failures_through() {
        let fetcher = |_: &str| FetchOutcome::failed(FetchError::Other("nope".into()));
        match attempt(&config(), &fetcher, 1) {
            Ok(FetchOutcome::Failed(e)) => assert_eq!(e.kind(), FailureKind::Other),
            other => panic!("expected failed outcome, got {:?}", other),
        }
    }

    #[test]
    fn guarded_reports_worker_fault() {
        let batch = IdBatch::new(6, 11);
        let res: Result<(), _> = guarded(1, Some(batch), || panic!("worker {} died", 1));
        let fault = res.unwrap_err();
        assert_eq!(fault.worker, 1);
        assert_eq!(fault.batch, Some(batch));
        assert_eq!(fault.message, "worker 1 died");
    }

    #[test]
    fn guarded_passes_values_through() {
        assert_eq!(guarded(0, None, || 42).unwrap(), 42);
    }

    #[test]
    fn run_batch_visits_ids_in_order() {
        let seen = Mutex::new(Vec::new());
        let fetcher = |url: &str| {
            seen.lock().unwrap().push(url.to_string());
            FetchOutcome::Status(200)
        };
        let results = ResultAggregator::new();
        let fetched = run_batch(0, IdBatch::new(3, 6), &config(), &fetcher, &results).unwrap();
        assert_eq!(fetched, 3);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "http://test.invalid/items/3",
                "http://test.invalid/items/4",
                "http://test.invalid/items/5",
            ]
        );
        assert_eq!(results.snapshot().status(200), 3);
    }

    #[test]
    fn run_batch_stops_at_a_panicking_fetch() {
        let calls = Mutex::new(Vec::new());
        let fetcher = |url: &str| {
            let id: u64 = url.rsplit('/').next().unwrap().parse().unwrap();
            calls.lock().unwrap().push(id);
            if id == 4 {
                panic!("bad id");
            }
            FetchOutcome::Status(200)
        };
        let results = ResultAggregator::new();
        let batch = IdBatch::new(2, 8);
        let fault = run_batch(3, batch, &config(), &fetcher, &results).unwrap_err();

        assert_eq!(fault.worker, 3);
        assert_eq!(fault.batch, Some(batch));
        assert_eq!(fault.message, "fetch of id 4 panicked: bad id");
        assert_eq!(*calls.lock().unwrap(), vec![2, 3, 4]);

        let hist = results.snapshot();
        assert_eq!(hist.status(200), 2);
        // id 4 plus the unfetched 5, 6 and 7
        assert_eq!(hist.failure(FailureKind::Fault), 4);
        assert_eq!(hist.total(), batch.len());
    }
}
