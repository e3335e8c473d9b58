//! Batch type: a contiguous run of resource ids.

use std::fmt;
use std::ops::Range;

/// Contiguous resource ids `[start, end)` (half-open) assigned to one worker.
///
/// An empty batch has `start == end`; it carries no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdBatch {
    /// First id (inclusive).
    pub start: u64,
    /// One past the last id (exclusive).
    pub end: u64,
}

impl IdBatch {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub(crate) fn single(id: u64) -> Self {
        Self::new(id, id + 1)
    }

    pub(crate) fn empty_at(at: u64) -> Self {
        Self::new(at, at)
    }

    /// Number of ids in this batch.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first(&self) -> Option<u64> {
        (!self.is_empty()).then_some(self.start)
    }

    pub fn last(&self) -> Option<u64> {
        (!self.is_empty()).then(|| self.end - 1)
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Inclusive form, e.g. `[1..5]`; empty batches print as `[]`.
impl fmt::Display for IdBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => write!(f, "[{}..{}]", first, last),
            _ => write!(f, "[]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_bounds() {
        let b = IdBatch::new(834, 1667);
        assert_eq!(b.len(), 833);
        assert_eq!(b.first(), Some(834));
        assert_eq!(b.last(), Some(1666));
        assert_eq!(b.to_string(), "[834..1666]");
    }

    #[test]
    fn batch_inverted_bounds_are_empty() {
        let b = IdBatch::new(10, 4);
        assert!(b.is_empty());
        assert_eq!(b.first(), None);
        assert_eq!(b.last(), None);
    }
}
