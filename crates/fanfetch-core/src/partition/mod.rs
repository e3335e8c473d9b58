//! Id-range partitioning.
//!
//! Splits `[1, max_id]` into contiguous worker batches. Every id lands in
//! exactly one batch; batches are handed out once and never reassigned.

mod batch;

pub use self::batch::IdBatch;

use std::ops::Range;

use crate::error::RunError;

/// Largest accepted `max_id`. Batches are half-open, so the id after the last
/// one must still fit in a `u64`.
pub const MAX_RESOURCE_ID: u64 = u64::MAX - 1;

/// Divides `[1, max_id]` into `worker_count` batches of `max_id / worker_count`
/// ids each, numbered consecutively from 1. Any remaining ids go into one
/// extra trailing batch, so the plan holds `worker_count` batches when the
/// division is exact and `worker_count + 1` otherwise.
///
/// When `worker_count > max_id` the first `max_id` batches are singletons and
/// the rest are empty; no remainder batch is produced. Empty batches carry no
/// work and are skipped by the executor.
///
/// Batches are computed on demand, so a huge `worker_count` costs nothing
/// until they are walked.
///
/// Returns `RunError::InvalidArgument` if either argument is zero or `max_id`
/// exceeds [`MAX_RESOURCE_ID`].
pub fn partition(max_id: u64, worker_count: usize) -> Result<Partition, RunError> {
    if max_id == 0 {
        return Err(RunError::invalid("max resource id must be at least 1"));
    }
    if max_id > MAX_RESOURCE_ID {
        return Err(RunError::invalid(format!(
            "max resource id must be at most {}",
            MAX_RESOURCE_ID
        )));
    }
    if worker_count == 0 {
        return Err(RunError::invalid("worker count must be at least 1"));
    }

    let workers = u64::try_from(worker_count).unwrap_or(u64::MAX);
    Ok(Partition {
        max_id,
        workers,
        base: max_id / workers,
    })
}

/// Batch plan produced by [`partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    max_id: u64,
    workers: u64,
    base: u64,
}

impl Partition {
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// Ids left over after `workers * base`; they form the trailing batch.
    fn remainder(&self) -> u64 {
        self.max_id - self.base * self.workers
    }

    /// Batches planned, empty ones included.
    pub fn batch_count(&self) -> u64 {
        // A remainder implies max_id > workers, so this cannot overflow.
        self.workers + u64::from(self.remainder() > 0)
    }

    /// Trailing empty batches (only when there are more workers than ids).
    pub fn empty_count(&self) -> u64 {
        self.workers.saturating_sub(self.max_id)
    }

    /// Batch at `index`, or `None` past the end of the plan.
    pub fn get(&self, index: u64) -> Option<IdBatch> {
        if self.base == 0 {
            return if index < self.max_id {
                Some(IdBatch::single(index + 1))
            } else if index < self.workers {
                Some(IdBatch::empty_at(self.max_id + 1))
            } else {
                None
            };
        }
        if index < self.workers {
            let start = index * self.base + 1;
            return Some(IdBatch::new(start, start + self.base));
        }
        if index == self.workers && self.remainder() > 0 {
            return Some(IdBatch::new(self.workers * self.base + 1, self.max_id + 1));
        }
        None
    }

    /// Every planned batch in order, empty ones included.
    pub fn batches(&self) -> impl Iterator<Item = IdBatch> {
        let plan = *self;
        (0..plan.batch_count()).filter_map(move |i| plan.get(i))
    }

    /// Non-empty batches with their index. Empty batches only ever trail, so
    /// this stops at the first one.
    pub fn work(&self) -> impl Iterator<Item = (usize, IdBatch)> {
        let plan = *self;
        (0usize..).map_while(move |i| {
            plan.get(i as u64)
                .filter(|batch| !batch.is_empty())
                .map(|batch| (i, batch))
        })
    }

    /// All ids of the plan, ascending.
    pub fn ids(&self) -> Range<u64> {
        1..self.max_id + 1
    }
}
