//! Completion signal handed back for every playback request.
//!
//! Every signal settles exactly once. A session that is superseded or stopped
//! settles with its own outcome instead of being left dangling.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::error::PlaybackError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Played to its natural end
    Ended,
    /// Could not load, decode, or was refused by platform policy
    Failed(PlaybackError),
    /// Replaced by a newer request before it finished
    Superseded,
    /// Halted by an explicit `stop()`
    Stopped,
}

impl PlaybackOutcome {
    pub fn is_ended(&self) -> bool {
        matches!(self, PlaybackOutcome::Ended)
    }

    pub fn error(&self) -> Option<&PlaybackError> {
        match self {
            PlaybackOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

type Listener = Box<dyn FnOnce(&PlaybackOutcome)>;

#[derive(Default)]
struct Slot {
    outcome: Option<PlaybackOutcome>,
    waker: Option<Waker>,
    listeners: Vec<Listener>,
}

/// Caller's side: inspect, await, or subscribe to the outcome.
#[derive(Clone)]
pub struct PlaybackSignal {
    slot: Rc<RefCell<Slot>>,
}

impl fmt::Debug for PlaybackSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSignal")
            .field("outcome", &self.slot.borrow().outcome)
            .finish()
    }
}

impl PlaybackSignal {
    /// A signal that is already settled.
    pub fn settled(outcome: PlaybackOutcome) -> Self {
        let slot = Slot { outcome: Some(outcome), ..Slot::default() };
        Self { slot: Rc::new(RefCell::new(slot)) }
    }

    pub fn outcome(&self) -> Option<PlaybackOutcome> {
        self.slot.borrow().outcome.clone()
    }

    pub fn is_settled(&self) -> bool {
        self.slot.borrow().outcome.is_some()
    }

    /// Run `f` once the signal settles, or right away if it already has.
    pub fn on_settle(&self, f: impl FnOnce(&PlaybackOutcome) + 'static) {
        let done = self.slot.borrow().outcome.clone();
        match done {
            Some(outcome) => f(&outcome),
            None => self.slot.borrow_mut().listeners.push(Box::new(f)),
        }
    }
}

impl Future for PlaybackSignal {
    type Output = PlaybackOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match &slot.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Engine's side. Settling consumes it; dropping it unsettled reports `Stopped`.
pub(crate) struct Completer {
    slot: Option<Rc<RefCell<Slot>>>,
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer").field("armed", &self.slot.is_some()).finish()
    }
}

pub(crate) fn channel() -> (Completer, PlaybackSignal) {
    let slot = Rc::new(RefCell::new(Slot::default()));
    (Completer { slot: Some(slot.clone()) }, PlaybackSignal { slot })
}

impl Completer {
    pub(crate) fn settle(mut self, outcome: PlaybackOutcome) {
        self.fire(outcome);
    }

    fn fire(&mut self, outcome: PlaybackOutcome) {
        let Some(slot) = self.slot.take() else { return };
        let (waker, listeners) = {
            let mut s = slot.borrow_mut();
            if s.outcome.is_some() {
                return;
            }
            s.outcome = Some(outcome.clone());
            (s.waker.take(), std::mem::take(&mut s.listeners))
        };
        // listeners may touch the signal again, so the borrow is released first
        for listener in listeners {
            listener(&outcome);
        }
        if let Some(w) = waker {
            w.wake();
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        self.fire(PlaybackOutcome::Stopped);
    }
}
