//! One OS thread per non-empty batch.

use std::thread;

use super::worker::{self, Completion};
use crate::aggregate::ResultAggregator;
use crate::config::RunConfig;
use crate::fetcher::Fetch;
use crate::partition::Partition;

pub(super) fn run<F: Fetch>(
    config: &RunConfig,
    fetcher: &F,
    plan: &Partition,
    results: &ResultAggregator,
) -> Completion {
    let mut done = Completion::default();
    let idle = plan.empty_count();
    if idle > 0 {
        tracing::debug!(idle, "skipping empty batches");
    }

    thread::scope(|s| {
        let mut handles = Vec::new();
        for (index, batch) in plan.work() {
            let spawned = thread::Builder::new()
                .name(format!("fanfetch-worker-{}", index))
                .spawn_scoped(s, move || worker::run_batch(index, batch, config, fetcher, results));
            match spawned {
                Ok(handle) => handles.push((index, batch, handle)),
                Err(e) => {
                    // Out of threads: keep the batch's ids in the run anyway.
                    tracing::warn!(worker = index, %batch, "spawn failed ({}); running batch inline", e);
                    done.started += 1;
                    let inline = worker::guarded(index, Some(batch), || {
                        worker::run_batch(index, batch, config, fetcher, results)
                    });
                    if let Err(fault) = inline.and_then(|fetched| fetched) {
                        done.faults.push(fault);
                    }
                }
            }
        }

        done.started += handles.len();
        for (index, batch, handle) in handles {
            match handle.join() {
                Ok(Ok(_)) => {}
                Ok(Err(fault)) => done.faults.push(fault),
                Err(payload) => done
                    .faults
                    .push(worker::fault(index, Some(batch), payload.as_ref())),
            }
        }
    });

    done
}
