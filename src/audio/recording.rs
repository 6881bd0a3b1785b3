//! Headless [`AudioBackend`] that records commands and replays injected events.
//!
//! Used by tests and by hosts without real audio output. Clones share state, so
//! a test can keep one handle while the engine owns another.

use std::cell::RefCell;
use std::rc::Rc;

use super::{AudioBackend, BackendEvent, SessionId};
use crate::error::PlaybackError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Start { session: SessionId, path: String },
    Halt { session: SessionId },
    Probe { path: String },
    Prefetch { path: String },
}

#[derive(Debug, Default)]
struct Inner {
    commands: Vec<BackendCommand>,
    events: Vec<BackendEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    inner: Rc<RefCell<Inner>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<BackendCommand> {
        self.inner.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.inner.borrow_mut().commands.clear();
    }

    /// Session id of the most recent `Start`.
    pub fn last_started(&self) -> Option<SessionId> {
        self.inner.borrow().commands.iter().rev().find_map(|c| match c {
            BackendCommand::Start { session, .. } => Some(*session),
            _ => None,
        })
    }

    pub fn push_event(&self, event: BackendEvent) {
        self.inner.borrow_mut().events.push(event);
    }

    pub fn finish(&self, session: SessionId) {
        self.push_event(BackendEvent::Ended(session));
    }

    pub fn fail(&self, session: SessionId, error: PlaybackError) {
        self.push_event(BackendEvent::Failed(session, error));
    }

    pub fn resolve_probe(&self, ok: bool) {
        self.push_event(BackendEvent::ProbeResolved(ok));
    }
}

impl AudioBackend for RecordingBackend {
    fn start(&mut self, session: SessionId, path: &str) {
        self.inner
            .borrow_mut()
            .commands
            .push(BackendCommand::Start { session, path: path.to_string() });
    }

    fn halt(&mut self, session: SessionId) {
        self.inner.borrow_mut().commands.push(BackendCommand::Halt { session });
    }

    fn probe(&mut self, path: &str) {
        self.inner
            .borrow_mut()
            .commands
            .push(BackendCommand::Probe { path: path.to_string() });
    }

    fn prefetch(&mut self, path: &str) {
        self.inner
            .borrow_mut()
            .commands
            .push(BackendCommand::Prefetch { path: path.to_string() });
    }

    fn drain_events(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.inner.borrow_mut().events)
    }
}
