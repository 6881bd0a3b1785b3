//! Seen-set tracking and the fire-once completion edge.

use std::collections::BTreeSet;

/// Raised by [`ProgressTracker::evaluate`] on the transition into "all seen".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEdge {
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    seen: BTreeSet<usize>,
    // true once the current stay at 100% has produced its edge
    completion_latch: bool,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self { total, seen: BTreeSet::new(), completion_latch: false }
    }

    /// Start from previously persisted indices. Anything outside `0..total` is dropped.
    pub fn with_seen(total: usize, seen: impl IntoIterator<Item = usize>) -> Self {
        let seen = seen.into_iter().filter(|&i| i < total).collect();
        Self { total, seen, completion_latch: false }
    }

    /// Record a visit. Returns whether the set changed.
    pub fn mark_seen(&mut self, index: usize) -> bool {
        if index >= self.total {
            log::debug!("progress: ignoring index {} outside 0..{}", index, self.total);
            return false;
        }
        self.seen.insert(index)
    }

    pub fn is_complete(&self) -> bool {
        self.seen.len() == self.total
    }

    /// Edge detection over [`is_complete`](Self::is_complete).
    ///
    /// Yields an edge only when the state is complete and the latch is clear, then
    /// latches. Any evaluation that finds the state incomplete clears the latch.
    pub fn evaluate(&mut self) -> Option<CompletionEdge> {
        if !self.is_complete() {
            self.completion_latch = false;
            return None;
        }
        if self.completion_latch {
            return None;
        }
        self.completion_latch = true;
        log::info!("progress: all {} items seen", self.total);
        Some(CompletionEdge { total: self.total })
    }

    /// Fresh session: forget every visit.
    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn seen(&self) -> &BTreeSet<usize> {
        &self.seen
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn has_seen(&self, index: usize) -> bool {
        self.seen.contains(&index)
    }

    pub fn latched(&self) -> bool {
        self.completion_latch
    }

    /// Whole-number percentage for the progress bar, capped at 100.
    pub fn percent(&self) -> u32 {
        let pct = (self.seen.len() as f64 / self.total.max(1) as f64 * 100.0).round();
        pct.min(100.0) as u32
    }
}
