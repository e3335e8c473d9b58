//! Outcome histogram shared by all workers.
//!
//! `ResultAggregator` owns a single mutex for its whole lifetime; every
//! `record` takes it, bumps one entry and releases it. The final
//! `ResultHistogram` is read once all workers have joined.

use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::fetcher::{FailureKind, FetchOutcome};

/// Histogram bucket: a status code, or a failure of a given kind.
///
/// Orders status codes ascending, then failure buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutcomeKey {
    Status(u16),
    Failure(FailureKind),
}

impl OutcomeKey {
    pub fn is_failure(&self) -> bool {
        matches!(self, OutcomeKey::Failure(_))
    }
}

impl From<&FetchOutcome> for OutcomeKey {
    fn from(outcome: &FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Status(code) => OutcomeKey::Status(*code),
            FetchOutcome::Failed(e) => OutcomeKey::Failure(e.kind()),
        }
    }
}

/// `200`, `404`, `failed:timeout`, ...
impl fmt::Display for OutcomeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKey::Status(code) => write!(f, "{}", code),
            OutcomeKey::Failure(kind) => write!(f, "failed:{}", kind),
        }
    }
}

/// Thread-safe outcome counter. Share it by reference across scoped worker
/// threads or wrap it in an `Arc`.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    counts: Mutex<BTreeMap<OutcomeKey, u64>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one fetch outcome.
    pub fn record(&self, outcome: &FetchOutcome) {
        self.record_key(OutcomeKey::from(outcome));
    }

    pub fn record_key(&self, key: OutcomeKey) {
        self.record_n(key, 1);
    }

    /// Count `n` outcomes of the same kind under one lock.
    pub fn record_n(&self, key: OutcomeKey, n: u64) {
        if n > 0 {
            *self.lock().entry(key).or_insert(0) += n;
        }
    }

    /// Copy of the current counts. Only stable once every producer is done.
    pub fn snapshot(&self) -> ResultHistogram {
        ResultHistogram {
            counts: self.lock().clone(),
        }
    }

    pub fn into_histogram(self) -> ResultHistogram {
        ResultHistogram {
            counts: self
                .counts
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    // The map is consistent after any single increment, so a poisoned lock
    // still holds usable counts.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<OutcomeKey, u64>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Final outcome counts of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultHistogram {
    counts: BTreeMap<OutcomeKey, u64>,
}

impl ResultHistogram {
    pub fn get(&self, key: OutcomeKey) -> u64 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Count for one HTTP status code.
    pub fn status(&self, code: u16) -> u64 {
        self.get(OutcomeKey::Status(code))
    }

    pub fn failure(&self, kind: FailureKind) -> u64 {
        self.get(OutcomeKey::Failure(kind))
    }

    /// Fetches that produced any status code.
    pub fn responses(&self) -> u64 {
        self.sum_where(|k| !k.is_failure())
    }

    /// Fetches that failed, across all failure kinds.
    pub fn failures(&self) -> u64 {
        self.sum_where(OutcomeKey::is_failure)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Buckets in key order.
    pub fn iter(&self) -> impl Iterator<Item = (OutcomeKey, u64)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }

    fn sum_where(&self, pred: impl Fn(&OutcomeKey) -> bool) -> u64 {
        self.counts
            .iter()
            .filter(|&(k, _)| pred(k))
            .map(|(_, v)| v)
            .sum()
    }
}

impl FromIterator<(OutcomeKey, u64)> for ResultHistogram {
    fn from_iter<I: IntoIterator<Item = (OutcomeKey, u64)>>(iter: I) -> Self {
        let mut counts = BTreeMap::new();
        for (key, n) in iter {
            if n > 0 {
                *counts.entry(key).or_insert(0) += n;
            }
        }
        Self { counts }
    }
}

/// Serializes as a flat map keyed by the `Display` form of each bucket.
impl Serialize for ResultHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.counts.iter().map(|(k, v)| (k.to_string(), v)))
    }
}
