//! Sight Words core crate.
//!
//! Non-visual engine behind the lesson screens: the circular word deck, the
//! single-flight audio player with its autoplay unlock gate, seen-word progress
//! with a fire-once completion edge, and the timed celebration bursts. Everything
//! here runs natively under `cargo test`; the `web` module (wasm32 only) binds it
//! to `HtmlAudioElement`, `sessionStorage` and the animation frame loop.

pub mod audio;
pub mod clock;
pub mod config;
pub mod deck;
pub mod effects;
mod error;
pub mod lesson;
pub mod numbers;
pub mod progress;
pub mod store;

#[cfg(target_arch = "wasm32")]
mod web;

pub use audio::{
    AudioBackend, BackendEvent, GateState, PlaybackEngine, PlaybackOutcome, PlaybackRequest,
    PlaybackSignal, ResourceLayout, SessionState, SoundKind,
};
pub use clock::{Clock, ManualClock};
pub use config::LessonConfig;
pub use deck::Deck;
pub use effects::{BurstRenderer, EffectConfig, EffectScheduler};
pub use error::{PlaybackError, Result};
pub use lesson::{LessonSession, SplashState};
pub use numbers::{NUM_MAX, NUM_MIN, NumberDrill, NumberLine};
pub use progress::{CompletionEdge, ProgressTracker};
pub use store::{MemoryStore, SessionStore};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    web::init_logging();
}

// -----------------------------------------------------------------------------
// Lesson datasets
// -----------------------------------------------------------------------------

/// The 40-word deck, in lesson order.
pub const SIGHT_WORDS: &[&str] = &[
    "the", "and", "a", "to", "said", "in", "he", "i", "of", "it",
    "was", "you", "they", "on", "she", "is", "for", "at", "his", "but",
    "that", "with", "all", "we", "can", "are", "up", "had", "my", "her",
    "what", "there", "out", "this", "have", "went", "be", "like", "some", "so",
];

/// Welcome clips under `welcome/`, one picked at random per splash.
pub const WELCOME_POOL: &[&str] = &[
    "welcome1.mp3", "welcome2.mp3", "welcome3.mp3", "welcome4.mp3", "welcome5.mp3",
    "welcome6.mp3", "welcome7.mp3", "welcome8.mp3", "welcome9.mp3",
];
