// Integration tests (native) for the `sight-words` crate.
// These drive a full lesson through the headless backend, store and clock so
// they run under `cargo test` on the host.

use sight_words::audio::{BackendCommand, RecordingBackend};
use sight_words::store::{self, SEEN_INDICES_KEY};
use sight_words::{
    GateState, LessonConfig, LessonSession, ManualClock, MemoryStore, PlaybackOutcome,
    SIGHT_WORDS, SessionState, SessionStore, SplashState,
};

struct Rig {
    lesson: LessonSession,
    backend: RecordingBackend,
    clock: ManualClock,
}

fn rig(words: &[&str], store: MemoryStore) -> Rig {
    let backend = RecordingBackend::new();
    let clock = ManualClock::new(0.0);
    let config = LessonConfig { seed: Some(2024), ..LessonConfig::default() };
    let lesson = LessonSession::new(
        words,
        config,
        Box::new(backend.clone()),
        Box::new(store),
        Box::new(clock.clone()),
    )
    .expect("non-empty deck");
    Rig { lesson, backend, clock }
}

// Scenario: three words, next() x3 returns to the first word.
#[test]
fn next_three_times_wraps_to_start() {
    let mut r = rig(&["A", "B", "C"], MemoryStore::new());
    assert_eq!(r.lesson.next(), "B");
    assert_eq!(r.lesson.next(), "C");
    assert_eq!(r.lesson.next(), "A");
    assert_eq!(r.lesson.index(), 0);
}

// Scenario: say then spell on the same word; only the spell session can end.
#[test]
fn say_then_spell_supersedes_say() {
    let mut r = rig(&["cat", "dog"], MemoryStore::new());
    let say = r.lesson.say_current();
    let spell = r.lesson.spell_current();
    assert_eq!(say.outcome(), Some(PlaybackOutcome::Superseded));

    let cmds = r.backend.commands();
    let halt_at = cmds.iter().position(|c| *c == BackendCommand::Halt { session: 1 }).unwrap();
    let spell_at = cmds
        .iter()
        .position(|c| matches!(c, BackendCommand::Start { session: 2, .. }))
        .unwrap();
    assert!(halt_at < spell_at);

    r.backend.finish(1);
    r.backend.finish(2);
    r.lesson.tick();
    assert_eq!(spell.outcome(), Some(PlaybackOutcome::Ended));
    assert_eq!(say.outcome(), Some(PlaybackOutcome::Superseded));
    assert_eq!(r.lesson.playback_state(), SessionState::Ended);
}

// Scenario: walking the full deck celebrates exactly once, and the song waits
// for the autoplay unlock.
#[test]
fn full_deck_celebrates_once() {
    let mut r = rig(SIGHT_WORDS, MemoryStore::new());
    r.lesson.on_gesture();
    r.backend.resolve_probe(true);
    r.lesson.tick();
    assert_eq!(r.lesson.gate_state(), GateState::Unlocked);

    for _ in 1..SIGHT_WORDS.len() {
        assert_eq!(r.lesson.completions(), 0);
        r.lesson.next();
    }
    assert_eq!(r.lesson.completions(), 1);
    assert_eq!(r.lesson.progress().percent(), 100);
    let song = r.backend.commands().into_iter().rev().find_map(|c| match c {
        BackendCommand::Start { path, .. } => Some(path),
        _ => None,
    });
    assert_eq!(song.as_deref(), Some("/audio/janeiro_snip.mp3"));

    for _ in 0..SIGHT_WORDS.len() * 2 {
        r.lesson.next();
    }
    assert_eq!(r.lesson.completions(), 1);
}

// Scenario: garbage in storage never surfaces.
#[test]
fn malformed_storage_starts_fresh() {
    let mut store = MemoryStore::new();
    store.set(SEEN_INDICES_KEY, "not json");
    store.set(store::SPLASH_SEEN_KEY, "{");
    let r = rig(&["a", "b", "c"], store);
    assert_eq!(r.lesson.progress().seen_count(), 1);
    assert_eq!(r.lesson.splash(), SplashState::Playing);
}

// Progress written by one session is picked up by the next one in the same tab.
#[test]
fn progress_survives_reload_within_session() {
    let store = MemoryStore::new();
    {
        let mut r = rig(&["a", "b", "c", "d"], store.clone());
        r.lesson.go_to(2);
        r.lesson.go_to(3);
    }
    let r = rig(&["a", "b", "c", "d"], store.clone());
    assert_eq!(r.lesson.progress().seen_count(), 3);
    assert_eq!(store.get(SEEN_INDICES_KEY).as_deref(), Some("[0,2,3]"));
    assert_eq!(r.lesson.completions(), 0);
}

// The effect window closes on its own after the celebration.
#[test]
fn celebration_effects_run_their_window_then_clear() {
    let mut r = rig(&["a", "b"], MemoryStore::new());
    r.lesson.next();
    assert!(r.lesson.effects().is_active());
    let bound = r.lesson.effects().config().max_concurrent_bursts();
    for _ in 0..300 {
        r.clock.advance(50.0);
        r.lesson.tick();
        assert!(r.lesson.effects().bursts().len() <= bound);
    }
    assert!(!r.lesson.effects().is_active());
    assert!(r.lesson.effects().bursts().is_empty());
}
