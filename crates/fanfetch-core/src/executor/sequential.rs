//! Every batch on the calling thread, in order.

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
    for (index, batch) in plan.work() {
        done.started += 1;
        let ran = worker::guarded(index, Some(batch), || {
            worker::run_batch(index, batch, config, fetcher, results)
        });
        if let Err(fault) = ran.and_then(|fetched| fetched) {
            done.faults.push(fault);
        }
    }
    done
}
