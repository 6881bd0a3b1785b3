//! Time source and one-shot timer queue.
//!
//! All times are milliseconds as `f64`, matching `performance.now()`. Nothing in
//! here sleeps: owners call [`TimerQueue::pop_due`] from their tick with the
//! current time, so tests can jump the clock forward deterministically.

use std::cell::Cell;
use std::rc::Rc;

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Hand-driven clock for tests and headless hosts. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self { now: Rc::new(Cell::new(start_ms)) }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Handle returned by [`TimerQueue::schedule_at`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    due_ms: f64,
    payload: T,
}

/// One-shot timers ordered by due time, ties broken by scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_id: 0 }
    }

    pub fn schedule_at(&mut self, due_ms: f64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        // Insert after every entry due at or before `due_ms` so equal times stay FIFO.
        let pos = self.entries.partition_point(|e| e.due_ms <= due_ms);
        self.entries.insert(pos, Entry { id, due_ms, payload });
        id
    }

    pub fn schedule_after(&mut self, now_ms: f64, delay_ms: f64, payload: T) -> TimerId {
        self.schedule_at(now_ms + delay_ms.max(0.0), payload)
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Remove and return the earliest timer due at or before `now_ms`, with its due time.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(f64, T)> {
        if self.entries.first().is_some_and(|e| e.due_ms <= now_ms) {
            let e = self.entries.remove(0);
            Some((e.due_ms, e.payload))
        } else {
            None
        }
    }

    pub fn next_due(&self) -> Option<f64> {
        self.entries.first().map(|e| e.due_ms)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
