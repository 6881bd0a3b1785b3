//! Single-flight audio playback.
//!
//! [`PlaybackEngine`] owns the one active session. Starting a request halts the
//! previous session (and settles its signal as `Superseded`) before the backend
//! is told to load the new resource. Lifecycle events carry the id of the
//! session they belong to; events for anything but the active session are
//! dropped, so a late "ended" from a halted element can never leak into the
//! next one.
//!
//! Platform audio sits behind [`AudioBackend`]. The engine never blocks: the
//! host calls [`PlaybackEngine::pump`] from its event loop to deliver whatever
//! the backend has queued.

mod autoplay;
mod recording;
mod request;
mod signal;

pub use autoplay::{AutoplayGate, GateState};
pub use recording::{BackendCommand, RecordingBackend};
pub use request::{DEFAULT_AUDIO_BASE, PlaybackRequest, ResourceLayout, SoundKind};
pub use signal::{PlaybackOutcome, PlaybackSignal};

use rand::rngs::StdRng;
use signal::{Completer, channel};

use crate::error::PlaybackError;

pub type SessionId = u64;

/// Lifecycle notifications queued by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Ended(SessionId),
    Failed(SessionId, PlaybackError),
    ProbeResolved(bool),
}

/// Platform audio output.
pub trait AudioBackend {
    /// Begin loading and playing `path` as `session`.
    fn start(&mut self, session: SessionId, path: &str);
    /// Halt `session`, rewind it, release it, and detach its listeners.
    fn halt(&mut self, session: SessionId);
    /// Muted play of `path`, answered with [`BackendEvent::ProbeResolved`].
    fn probe(&mut self, path: &str);
    /// Fire-and-forget warm-up of `path`. Failures are ignored.
    fn prefetch(&mut self, path: &str);
    fn drain_events(&mut self) -> Vec<BackendEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing,
    Ended,
    Failed,
}

#[derive(Debug)]
struct Session {
    id: SessionId,
    request: PlaybackRequest,
    state: SessionState,
    completer: Option<Completer>,
}

pub struct PlaybackEngine {
    backend: Box<dyn AudioBackend>,
    layout: ResourceLayout,
    gate: AutoplayGate,
    probe_path: String,
    session: Option<Session>,
    // gated request waiting for the gate to open
    pending: Option<(PlaybackRequest, Completer)>,
    next_session: SessionId,
    rng: StdRng,
}

impl PlaybackEngine {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        layout: ResourceLayout,
        probe_path: String,
        rng: StdRng,
    ) -> Self {
        Self {
            backend,
            layout,
            gate: AutoplayGate::new(),
            probe_path,
            session: None,
            pending: None,
            next_session: 1,
            rng,
        }
    }

    pub fn layout(&self) -> &ResourceLayout {
        &self.layout
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn state(&self) -> SessionState {
        self.session.as_ref().map_or(SessionState::Idle, |s| s.state)
    }

    pub fn active_request(&self) -> Option<&PlaybackRequest> {
        self.session.as_ref().map(|s| &s.request)
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Play `request`, replacing whatever is active.
    ///
    /// Gated kinds wait for the autoplay gate while it is `Locked`/`Unlocking`
    /// and fail with `AutoplayRejected` while it is `Blocked`.
    pub fn play(&mut self, request: PlaybackRequest) -> PlaybackSignal {
        if let Some((old, completer)) = self.pending.take() {
            log::debug!("playback: pending {} superseded", old.resource_path());
            completer.settle(PlaybackOutcome::Superseded);
        }

        let (completer, signal) = channel();
        if request.is_gated() {
            match self.gate.state() {
                GateState::Unlocked => {}
                GateState::Blocked => {
                    let path = request.resource_path().to_string();
                    log::warn!("playback: {} refused, autoplay blocked", path);
                    completer.settle(PlaybackOutcome::Failed(PlaybackError::AutoplayRejected {
                        path,
                    }));
                    return signal;
                }
                GateState::Locked | GateState::Unlocking => {
                    log::debug!("playback: deferring {} until unlocked", request.resource_path());
                    self.pending = Some((request, completer));
                    return signal;
                }
            }
        }
        self.begin(request, completer);
        signal
    }

    pub fn play_say(&mut self, word: &str) -> PlaybackSignal {
        let req = self.layout.say(word);
        self.play(req)
    }

    pub fn play_spell(&mut self, word: &str) -> PlaybackSignal {
        let req = self.layout.spell(word);
        self.play(req)
    }

    pub fn play_letter(&mut self, ch: &str) -> PlaybackSignal {
        let req = self.layout.letter(ch);
        self.play(req)
    }

    pub fn play_number(&mut self, n: u32) -> PlaybackSignal {
        let req = self.layout.number(n);
        self.play(req)
    }

    pub fn play_welcome_random<S: AsRef<str>>(&mut self, pool: &[S]) -> PlaybackSignal {
        match self.layout.welcome_random(pool, &mut self.rng) {
            Ok(req) => self.play(req),
            Err(e) => PlaybackSignal::settled(PlaybackOutcome::Failed(e)),
        }
    }

    /// Halt the active session and drop any deferred request. Idempotent.
    pub fn stop(&mut self) {
        if let Some((_, completer)) = self.pending.take() {
            completer.settle(PlaybackOutcome::Stopped);
        }
        self.end_active(PlaybackOutcome::Stopped);
    }

    /// Stop `kind` wherever it is, deferred or playing. Other audio is untouched.
    pub fn cancel_kind(&mut self, kind: SoundKind) {
        if self.pending.as_ref().is_some_and(|(req, _)| req.kind == kind) {
            if let Some((req, completer)) = self.pending.take() {
                log::debug!("playback: dropping deferred {}", req.resource_path());
                completer.settle(PlaybackOutcome::Stopped);
            }
        }
        let playing = self
            .session
            .as_ref()
            .is_some_and(|s| s.request.kind == kind && s.state == SessionState::Playing);
        if playing {
            self.end_active(PlaybackOutcome::Stopped);
        }
    }

    pub fn prefetch(&mut self, path: &str) {
        self.backend.prefetch(path);
    }

    /// Feed a pointer/tap gesture to the autoplay gate.
    pub fn on_gesture(&mut self) {
        if self.gate.on_gesture() {
            self.backend.probe(&self.probe_path);
        }
    }

    /// Manual "enable sound": re-run the probe after a block.
    pub fn retry_unlock(&mut self) {
        if self.gate.retry() {
            self.backend.probe(&self.probe_path);
        }
    }

    /// Deliver queued backend events. Call once per host loop turn.
    pub fn pump(&mut self) {
        for event in self.backend.drain_events() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Ended(id) => self.settle_active(id, SessionState::Ended, PlaybackOutcome::Ended),
            BackendEvent::Failed(id, err) => {
                if self.is_live(id) && err.is_policy_rejection() {
                    self.gate.reject();
                    if self.gate.state() == GateState::Blocked {
                        self.fail_pending();
                    }
                }
                self.settle_active(id, SessionState::Failed, PlaybackOutcome::Failed(err));
            }
            BackendEvent::ProbeResolved(ok) => {
                self.gate.probe_resolved(ok);
                match self.gate.state() {
                    GateState::Unlocked => {
                        if let Some((req, completer)) = self.pending.take() {
                            self.begin(req, completer);
                        }
                    }
                    GateState::Blocked => self.fail_pending(),
                    GateState::Locked | GateState::Unlocking => {}
                }
            }
        }
    }

    fn is_live(&self, id: SessionId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id == id && s.state == SessionState::Playing)
    }

    fn settle_active(&mut self, id: SessionId, state: SessionState, outcome: PlaybackOutcome) {
        if !self.is_live(id) {
            log::debug!("playback: dropping stale event for session {}", id);
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.state = state;
            if let Some(completer) = session.completer.take() {
                completer.settle(outcome);
            }
        }
    }

    fn fail_pending(&mut self) {
        if let Some((req, completer)) = self.pending.take() {
            completer.settle(PlaybackOutcome::Failed(PlaybackError::AutoplayRejected {
                path: req.resource_path().to_string(),
            }));
        }
    }

    fn begin(&mut self, request: PlaybackRequest, completer: Completer) {
        self.end_active(PlaybackOutcome::Superseded);
        let id = self.next_session;
        self.next_session += 1;
        log::debug!("playback: session {} -> {}", id, request.resource_path());
        self.backend.start(id, request.resource_path());
        self.session = Some(Session {
            id,
            request,
            state: SessionState::Playing,
            completer: Some(completer),
        });
    }

    fn end_active(&mut self, outcome: PlaybackOutcome) {
        let Some(mut session) = self.session.take() else { return };
        if session.state == SessionState::Playing {
            self.backend.halt(session.id);
        }
        if let Some(completer) = session.completer.take() {
            completer.settle(outcome);
        }
    }
}
