//! Word lesson session: deck navigation, progress, splash, and celebration.
//!
//! Every cursor move marks the new index as seen and persists the set. The
//! first evaluation that finds every index seen starts the burst effect and
//! the celebration clip; staying complete does nothing more, and dropping
//! below complete cancels the effect and the clip, even one still waiting for
//! the autoplay gate.

use crate::audio::{
    AudioBackend, GateState, PlaybackEngine, PlaybackOutcome, PlaybackRequest, PlaybackSignal,
    ResourceLayout, SessionState, SoundKind,
};
use crate::clock::Clock;
use crate::config::LessonConfig;
use crate::deck::Deck;
use crate::effects::{BurstRenderer, EffectScheduler};
use crate::progress::ProgressTracker;
use crate::store::{self, SessionStore};

const ENGINE_RNG_STREAM: u64 = 1;
const EFFECTS_RNG_STREAM: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashState {
    /// Intro already played this session
    Hidden,
    /// Welcome clip requested, possibly still waiting for the first gesture
    Playing,
    /// Welcome clip failed; show "Tap to start"
    Blocked,
}

pub struct LessonSession {
    deck: Deck,
    progress: ProgressTracker,
    engine: PlaybackEngine,
    effects: EffectScheduler,
    store: Box<dyn SessionStore>,
    clock: Box<dyn Clock>,
    config: LessonConfig,
    splash: SplashState,
    welcome: Option<PlaybackSignal>,
    celebration: Option<PlaybackSignal>,
    completions: u32,
}

impl LessonSession {
    /// Build a session over `words`. Returns `None` when there are no words.
    pub fn new<S: AsRef<str>>(
        words: &[S],
        config: LessonConfig,
        backend: Box<dyn AudioBackend>,
        store: Box<dyn SessionStore>,
        clock: Box<dyn Clock>,
    ) -> Option<Self> {
        let deck = Deck::new(words)?;
        let seen = store::load_seen_indices(store.as_ref(), deck.size());
        let progress = ProgressTracker::with_seen(deck.size(), seen);
        let engine = PlaybackEngine::new(
            backend,
            ResourceLayout::new(&config.audio_base),
            config.unlock_probe_clip.clone(),
            config.rng(ENGINE_RNG_STREAM),
        );
        let effects = EffectScheduler::new(config.effects.clone(), config.rng(EFFECTS_RNG_STREAM));
        let splash = if store::splash_seen(store.as_ref()) {
            SplashState::Hidden
        } else {
            SplashState::Playing
        };

        let mut session = Self {
            deck,
            progress,
            engine,
            effects,
            store,
            clock,
            config,
            splash,
            welcome: None,
            celebration: None,
            completions: 0,
        };
        if session.splash == SplashState::Playing {
            session.request_welcome();
        }
        session.observe();
        Some(session)
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn BurstRenderer>) {
        self.effects.set_renderer(renderer);
    }

    // --- Navigation ---------------------------------------------------------

    pub fn current(&self) -> &str {
        self.deck.current()
    }

    pub fn index(&self) -> usize {
        self.deck.index()
    }

    pub fn size(&self) -> usize {
        self.deck.size()
    }

    pub fn next(&mut self) -> String {
        self.deck.next();
        self.observe();
        self.current().to_string()
    }

    pub fn prev(&mut self) -> String {
        self.deck.prev();
        self.observe();
        self.current().to_string()
    }

    pub fn go_to(&mut self, i: usize) {
        if self.deck.go_to(i) {
            self.observe();
        }
    }

    /// Characters of the current word, one per letter button.
    pub fn letters(&self) -> Vec<String> {
        self.current().chars().map(|c| c.to_string()).collect()
    }

    // --- Progress -----------------------------------------------------------

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn completions(&self) -> u32 {
        self.completions
    }

    /// Forget every visit and start over from the current word.
    pub fn reset_progress(&mut self) {
        self.progress.reset();
        self.store.remove(store::SEEN_INDICES_KEY);
        self.check_completion();
        self.observe();
    }

    fn observe(&mut self) {
        if self.progress.mark_seen(self.deck.index()) {
            store::save_seen_indices(self.store.as_mut(), self.progress.seen());
        }
        self.check_completion();
    }

    fn check_completion(&mut self) {
        if self.progress.evaluate().is_some() {
            self.completions += 1;
            self.effects.trigger(self.clock.now_ms());
            let clip = PlaybackRequest::celebration(&self.config.celebration_clip);
            self.celebration = Some(self.engine.play(clip));
        } else if !self.progress.is_complete() {
            if self.effects.is_active() {
                self.effects.cancel();
            }
            if self.celebration.take().is_some_and(|song| !song.is_settled()) {
                self.engine.cancel_kind(SoundKind::Celebration);
            }
        }
    }

    // --- Audio --------------------------------------------------------------

    pub fn say_current(&mut self) -> PlaybackSignal {
        let word = self.deck.current().to_string();
        self.engine.play_say(&word)
    }

    pub fn spell_current(&mut self) -> PlaybackSignal {
        let word = self.deck.current().to_string();
        self.engine.play_spell(&word)
    }

    pub fn play_letter(&mut self, ch: &str) -> PlaybackSignal {
        self.engine.play_letter(ch)
    }

    pub fn stop_audio(&mut self) {
        self.engine.stop();
    }

    pub fn on_gesture(&mut self) {
        self.engine.on_gesture();
    }

    pub fn retry_unlock(&mut self) {
        self.engine.retry_unlock();
    }

    pub fn gate_state(&self) -> GateState {
        self.engine.gate_state()
    }

    pub fn playback_state(&self) -> SessionState {
        self.engine.state()
    }

    pub fn celebration(&self) -> Option<&PlaybackSignal> {
        self.celebration.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    // --- Splash -------------------------------------------------------------

    pub fn splash(&self) -> SplashState {
        self.splash
    }

    /// Signal of the welcome clip while the splash is up.
    pub fn welcome(&self) -> Option<&PlaybackSignal> {
        self.welcome.as_ref()
    }

    /// "Tap to start": retry the welcome clip after it was blocked.
    pub fn start_welcome(&mut self) -> Option<PlaybackSignal> {
        match self.splash {
            SplashState::Hidden => None,
            SplashState::Playing => self.welcome.clone(),
            SplashState::Blocked => {
                self.engine.retry_unlock();
                self.splash = SplashState::Playing;
                Some(self.request_welcome())
            }
        }
    }

    fn request_welcome(&mut self) -> PlaybackSignal {
        let signal = self.engine.play_welcome_random(self.config.welcome_pool.as_slice());
        self.welcome = Some(signal.clone());
        self.poll_welcome();
        signal
    }

    fn poll_welcome(&mut self) {
        let Some(outcome) = self.welcome.as_ref().and_then(|s| s.outcome()) else {
            return;
        };
        self.welcome = None;
        match outcome {
            PlaybackOutcome::Ended => {
                store::mark_splash_seen(self.store.as_mut());
                self.splash = SplashState::Hidden;
            }
            other => {
                log::info!("lesson: welcome clip did not finish ({:?})", other);
                self.splash = SplashState::Blocked;
            }
        }
    }

    // --- Effects ------------------------------------------------------------

    pub fn effects(&self) -> &EffectScheduler {
        &self.effects
    }

    /// One host loop turn: deliver audio events, settle the splash, advance bursts.
    pub fn tick(&mut self) {
        self.engine.pump();
        self.poll_welcome();
        let now = self.clock.now_ms();
        self.effects.advance(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{BackendCommand, RecordingBackend};
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    struct Harness {
        lesson: LessonSession,
        backend: RecordingBackend,
        store: MemoryStore,
        clock: ManualClock,
    }

    fn harness_with(words: &[&str], store: MemoryStore) -> Harness {
        let backend = RecordingBackend::new();
        let clock = ManualClock::new(0.0);
        let config = LessonConfig { seed: Some(9), ..LessonConfig::default() };
        let lesson = LessonSession::new(
            words,
            config,
            Box::new(backend.clone()),
            Box::new(store.clone()),
            Box::new(clock.clone()),
        )
        .unwrap();
        Harness { lesson, backend, store, clock }
    }

    fn splash_done() -> MemoryStore {
        let mut store = MemoryStore::new();
        store::mark_splash_seen(&mut store);
        store
    }

    fn harness(words: &[&str]) -> Harness {
        harness_with(words, MemoryStore::new())
    }

    #[test]
    fn test_start_marks_first_word_seen_and_persists() {
        let h = harness(&["a", "b", "c"]);
        assert!(h.lesson.progress().has_seen(0));
        assert_eq!(h.store.get(store::SEEN_INDICES_KEY).as_deref(), Some("[0]"));
    }

    #[test]
    fn test_completion_fires_once_with_effects_and_song() {
        let mut h = harness(&["a", "b", "c"]);
        h.lesson.next();
        assert!(!h.lesson.effects().is_active());
        h.lesson.next();
        assert_eq!(h.lesson.completions(), 1);
        assert!(h.lesson.effects().is_active());
        assert!(h.lesson.celebration().is_some());

        // wrap around and revisit the last word
        h.lesson.next();
        h.lesson.prev();
        assert_eq!(h.lesson.completions(), 1);
    }

    #[test]
    fn test_reset_cancels_effects_and_allows_second_completion() {
        let mut h = harness(&["a", "b"]);
        h.lesson.next();
        assert!(h.lesson.effects().is_active());
        h.lesson.reset_progress();
        assert!(!h.lesson.effects().is_active());
        assert!(h.lesson.effects().bursts().is_empty());
        assert_eq!(h.lesson.progress().seen_count(), 1);
        h.lesson.prev();
        assert_eq!(h.lesson.completions(), 2);
    }

    #[test]
    fn test_out_of_range_go_to_does_nothing() {
        let mut h = harness(&["a", "b", "c"]);
        h.lesson.go_to(5);
        assert_eq!(h.lesson.index(), 0);
        assert_eq!(h.lesson.progress().seen_count(), 1);
        h.lesson.go_to(2);
        assert!(h.lesson.progress().has_seen(2));
    }

    #[test]
    fn test_effects_expire_through_tick() {
        let mut h = harness(&["a", "b"]);
        h.lesson.next();
        h.clock.advance(5_000.0);
        h.lesson.tick();
        assert!(h.lesson.effects().is_active());
        h.clock.advance(10_000.0);
        h.lesson.tick();
        assert!(!h.lesson.effects().is_active());
    }

    #[test]
    fn test_welcome_success_hides_splash_for_session() {
        let mut h = harness(&["a", "b"]);
        assert_eq!(h.lesson.splash(), SplashState::Playing);
        let signal = h.lesson.welcome().cloned().unwrap();

        // gated: nothing starts until the first gesture unlocks audio
        assert!(h.backend.last_started().is_none());
        h.lesson.on_gesture();
        h.backend.resolve_probe(true);
        h.lesson.tick();
        let session = h.backend.last_started().unwrap();
        h.backend.finish(session);
        h.lesson.tick();
        assert_eq!(signal.outcome(), Some(PlaybackOutcome::Ended));
        assert_eq!(h.lesson.splash(), SplashState::Hidden);
        assert!(store::splash_seen(&h.store));
        assert!(h.lesson.start_welcome().is_none());

        let again = harness_with(&["a", "b"], h.store.clone());
        assert_eq!(again.lesson.splash(), SplashState::Hidden);
        assert!(again.lesson.welcome().is_none());
    }

    #[test]
    fn test_welcome_failure_blocks_and_retry_probes_again() {
        let mut h = harness(&["a", "b"]);
        h.lesson.on_gesture();
        h.backend.resolve_probe(false);
        h.lesson.tick();
        assert_eq!(h.lesson.splash(), SplashState::Blocked);
        assert_eq!(h.lesson.gate_state(), GateState::Blocked);

        h.backend.clear_commands();
        assert!(h.lesson.start_welcome().is_some());
        assert!(matches!(h.backend.commands()[0], BackendCommand::Probe { .. }));
        assert_eq!(h.lesson.splash(), SplashState::Playing);
    }

    #[test]
    fn test_reset_drops_song_still_waiting_for_unlock() {
        let mut h = harness_with(&["a", "b"], splash_done());
        h.lesson.next();
        let song = h.lesson.celebration().cloned().unwrap();
        h.lesson.reset_progress();
        assert_eq!(song.outcome(), Some(PlaybackOutcome::Stopped));

        h.lesson.on_gesture();
        h.backend.resolve_probe(true);
        h.lesson.tick();
        assert!(h.backend.last_started().is_none());
    }

    #[test]
    fn test_reset_stops_song_already_playing() {
        let mut h = harness_with(&["a", "b"], splash_done());
        h.lesson.on_gesture();
        h.backend.resolve_probe(true);
        h.lesson.tick();
        h.lesson.next();
        let song = h.lesson.celebration().cloned().unwrap();
        let session = h.backend.last_started().unwrap();
        h.lesson.reset_progress();
        assert_eq!(song.outcome(), Some(PlaybackOutcome::Stopped));
        assert!(h.backend.commands().contains(&BackendCommand::Halt { session }));
        assert_eq!(h.lesson.playback_state(), SessionState::Idle);
    }

    #[test]
    fn test_word_audio_uses_current_word() {
        let mut h = harness(&["Look", "said"]);
        h.lesson.next();
        h.lesson.say_current();
        h.lesson.spell_current();
        h.lesson.play_letter("S");
        let starts: Vec<String> = h
            .backend
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                BackendCommand::Start { path, .. } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(
            starts,
            vec![
                "/audio/say/say_said.mp3",
                "/audio/spell/spell_said.mp3",
                "/audio/letters/letter_s.mp3",
            ]
        );
        assert_eq!(h.lesson.letters(), vec!["s", "a", "i", "d"]);
    }

    #[test]
    fn test_malformed_persisted_indices_start_empty() {
        let mut store = MemoryStore::new();
        store.set(store::SEEN_INDICES_KEY, "not json");
        let h = harness_with(&["a", "b", "c"], store);
        assert_eq!(h.lesson.progress().seen_count(), 1);
        assert_eq!(h.lesson.completions(), 0);
    }
}
