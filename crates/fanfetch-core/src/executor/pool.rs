//! Bounded pool over single-id tasks.
//!
//! Up to `pool_size` threads pull ids from a shared cursor over the plan and
//! send each outcome over a channel; the calling thread is the only one that
//! records into the aggregator. A panicking fetch ends only its own task.
//! Ids still unclaimed after every pool thread is gone (spawn failure, dead
//! worker) are fetched inline so none is skipped.

use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use super::worker::{self, Completion, WorkerFault};
use crate::aggregate::ResultAggregator;
use crate::config::RunConfig;
use crate::error::FetchError;
use crate::fetcher::{Fetch, FetchOutcome};
use crate::partition::{IdBatch, Partition};

/// One id as a task. A panic becomes a `Fault` outcome plus the task's fault.
fn run_task<F: Fetch>(
    index: usize,
    id: u64,
    config: &RunConfig,
    fetcher: &F,
) -> (FetchOutcome, Option<WorkerFault>) {
    match worker::attempt(config, fetcher, id) {
        Ok(outcome) => (outcome, None),
        Err(payload) => {
            let fault = worker::fetch_fault(index, IdBatch::single(id), id, payload.as_ref());
            let outcome = FetchOutcome::failed(FetchError::Panicked(fault.message.clone()));
            (outcome, Some(fault))
        }
    }
}

pub(super) fn run<F: Fetch>(
    config: &RunConfig,
    fetcher: &F,
    plan: &Partition,
    pool_size: usize,
    results: &ResultAggregator,
) -> Completion {
    let tasks = usize::try_from(plan.max_id()).unwrap_or(usize::MAX);
    let num_workers = pool_size.max(1).min(tasks);
    let queue = Mutex::new(plan.ids());
    let next_task = || queue.lock().unwrap_or_else(PoisonError::into_inner).next();
    let (tx, rx) = mpsc::channel::<FetchOutcome>();
    let mut done = Completion::default();

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let tx = tx.clone();
            let next_task = &next_task;
            let spawned = thread::Builder::new()
                .name(format!("fanfetch-pool-{}", index))
                .spawn_scoped(s, move || {
                    let mut faults = Vec::new();
                    let mut fetched = 0u64;
                    while let Some(id) = next_task() {
                        let (outcome, fault) = run_task(index, id, config, fetcher);
                        faults.extend(fault);
                        if tx.send(outcome).is_err() {
                            break;
                        }
                        fetched += 1;
                    }
                    tracing::debug!(worker = index, fetched, "pool worker drained queue");
                    faults
                });
            match spawned {
                Ok(handle) => handles.push((index, handle)),
                Err(e) => tracing::warn!(worker = index, "spawn failed: {}", e),
            }
        }
        drop(tx);

        for outcome in rx {
            results.record(&outcome);
        }

        done.started = handles.len();
        for (index, handle) in handles {
            match handle.join() {
                Ok(faults) => done.faults.extend(faults),
                Err(payload) => done.faults.push(worker::fault(index, None, payload.as_ref())),
            }
        }
    });

    let mut leftover = 0u64;
    while let Some(id) = next_task() {
        let (outcome, fault) = run_task(num_workers, id, config, fetcher);
        results.record(&outcome);
        done.faults.extend(fault);
        leftover += 1;
    }
    if leftover > 0 {
        tracing::warn!(leftover, "fetched queued ids inline after pool workers exited");
    }

    done
}
