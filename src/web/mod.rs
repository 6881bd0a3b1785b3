//! Browser bindings: `WordLesson` and `NumberLesson` classes for the screens.
//!
//! Each class owns its engine behind `Rc<RefCell<..>>`, shared with an
//! animation frame loop that pumps audio events and advances the bursts, and
//! with a document `pointerdown` listener that feeds the autoplay gate.
//! Dropping the class (`free()` from JS) cancels the loop and detaches the
//! listeners.

mod backend;
mod host;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Array, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::window;

use crate::audio::{GateState, PlaybackEngine, PlaybackOutcome, PlaybackSignal, ResourceLayout};
use crate::config::LessonConfig;
use crate::lesson::{LessonSession, SplashState};
use crate::numbers::{NumberDrill, NumberLine};
use crate::{NUM_MAX, NUM_MIN, SIGHT_WORDS};

pub use backend::WebAudioBackend;
pub use host::{ConfettiRenderer, PerformanceClock, WebSessionStore, init_logging};

const NUMBERS_RNG_STREAM: u64 = 3;

// --- Shared plumbing --------------------------------------------------------

/// Resolve on natural end, reject with a message on anything else.
fn to_promise(signal: PlaybackSignal) -> Promise {
    future_to_promise(async move {
        let reason = match signal.await {
            PlaybackOutcome::Ended => return Ok(JsValue::UNDEFINED),
            PlaybackOutcome::Failed(e) => e.to_string(),
            PlaybackOutcome::Superseded => "superseded".to_string(),
            PlaybackOutcome::Stopped => "stopped".to_string(),
        };
        Err(JsValue::from_str(&reason))
    })
}

fn gate_name(state: GateState) -> &'static str {
    match state {
        GateState::Locked => "locked",
        GateState::Unlocking => "unlocking",
        GateState::Unlocked => "unlocked",
        GateState::Blocked => "blocked",
    }
}

fn parse_config(config_json: Option<String>) -> LessonConfig {
    config_json.as_deref().map(LessonConfig::from_json).unwrap_or_default()
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// requestAnimationFrame loop calling `tick` every frame until dropped.
struct FrameLoop {
    callback: FrameCallback,
    handle: Rc<Cell<i32>>,
}

impl FrameLoop {
    fn start(mut tick: impl FnMut() + 'static) -> Self {
        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let handle = Rc::new(Cell::new(0));
        let f = callback.clone();
        let h = handle.clone();
        *callback.borrow_mut() = Some(Closure::new(move |_ts: f64| {
            tick();
            if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
                if let Ok(id) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    h.set(id);
                }
            }
        }));
        if let (Some(w), Some(cb)) = (window(), callback.borrow().as_ref()) {
            if let Ok(id) = w.request_animation_frame(cb.as_ref().unchecked_ref()) {
                handle.set(id);
            }
        }
        Self { callback, handle }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let Some(w) = window() {
            let _ = w.cancel_animation_frame(self.handle.get());
        }
        // breaks the closure's reference cycle
        self.callback.borrow_mut().take();
    }
}

/// An event listener removed again on drop.
struct Listener {
    target: web_sys::EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn attach(
        target: web_sys::EventTarget,
        kind: &'static str,
        f: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(f);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self { target, kind, closure })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

fn document_target() -> Result<web_sys::EventTarget, JsValue> {
    let doc = window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    Ok(doc.into())
}

// --- Words screen -----------------------------------------------------------

#[wasm_bindgen]
pub struct WordLesson {
    inner: Rc<RefCell<LessonSession>>,
    _frames: FrameLoop,
    _gesture: Listener,
}

#[wasm_bindgen]
impl WordLesson {
    /// `config_json` is an optional partial `LessonConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WordLesson, JsValue> {
        let config = parse_config(config_json);
        let mut session = LessonSession::new(
            SIGHT_WORDS,
            config,
            Box::new(WebAudioBackend::new()),
            Box::new(WebSessionStore::new()),
            Box::new(PerformanceClock),
        )
        .ok_or_else(|| JsValue::from_str("empty word deck"))?;
        session.set_renderer(Box::new(ConfettiRenderer::default()));
        let inner = Rc::new(RefCell::new(session));

        let ticking = inner.clone();
        let frames = FrameLoop::start(move || {
            if let Ok(mut s) = ticking.try_borrow_mut() {
                s.tick();
            }
        });
        let gestures = Rc::downgrade(&inner);
        let gesture = Listener::attach(document_target()?, "pointerdown", move |_| {
            if let Some(s) = gestures.upgrade() {
                if let Ok(mut s) = s.try_borrow_mut() {
                    s.on_gesture();
                }
            }
        })?;

        Ok(WordLesson { inner, _frames: frames, _gesture: gesture })
    }

    pub fn current(&self) -> String {
        self.inner.borrow().current().to_string()
    }

    pub fn index(&self) -> usize {
        self.inner.borrow().index()
    }

    pub fn size(&self) -> usize {
        self.inner.borrow().size()
    }

    pub fn next(&self) -> String {
        self.inner.borrow_mut().next()
    }

    pub fn prev(&self) -> String {
        self.inner.borrow_mut().prev()
    }

    #[wasm_bindgen(js_name = goTo)]
    pub fn go_to(&self, i: usize) {
        self.inner.borrow_mut().go_to(i);
    }

    pub fn letters(&self) -> Array {
        self.inner.borrow().letters().into_iter().map(JsValue::from).collect()
    }

    #[wasm_bindgen(js_name = seenCount)]
    pub fn seen_count(&self) -> usize {
        self.inner.borrow().progress().seen_count()
    }

    pub fn percent(&self) -> u32 {
        self.inner.borrow().progress().percent()
    }

    #[wasm_bindgen(js_name = isComplete)]
    pub fn is_complete(&self) -> bool {
        self.inner.borrow().progress().is_complete()
    }

    #[wasm_bindgen(js_name = resetProgress)]
    pub fn reset_progress(&self) {
        self.inner.borrow_mut().reset_progress();
    }

    pub fn say(&self) -> Promise {
        let signal = self.inner.borrow_mut().say_current();
        to_promise(signal)
    }

    pub fn spell(&self) -> Promise {
        let signal = self.inner.borrow_mut().spell_current();
        to_promise(signal)
    }

    pub fn letter(&self, ch: &str) -> Promise {
        let signal = self.inner.borrow_mut().play_letter(ch);
        to_promise(signal)
    }

    pub fn stop(&self) {
        self.inner.borrow_mut().stop_audio();
    }

    /// "hidden" | "playing" | "blocked"
    #[wasm_bindgen(js_name = splashState)]
    pub fn splash_state(&self) -> String {
        match self.inner.borrow().splash() {
            SplashState::Hidden => "hidden",
            SplashState::Playing => "playing",
            SplashState::Blocked => "blocked",
        }
        .to_string()
    }

    /// The welcome clip, re-requested when blocked ("Tap to start").
    /// `undefined` once the splash has played.
    #[wasm_bindgen(js_name = startWelcome)]
    pub fn start_welcome(&self) -> Option<Promise> {
        let signal = self.inner.borrow_mut().start_welcome();
        signal.map(to_promise)
    }

    #[wasm_bindgen(js_name = gateState)]
    pub fn gate_state(&self) -> String {
        gate_name(self.inner.borrow().gate_state()).to_string()
    }

    /// The manual "enable sound" affordance.
    #[wasm_bindgen(js_name = enableSound)]
    pub fn enable_sound(&self) {
        self.inner.borrow_mut().retry_unlock();
    }

    /// Active star bursts as plain objects for the progress bar overlay.
    pub fn bursts(&self) -> JsValue {
        match serde_wasm_bindgen::to_value(self.inner.borrow().effects().bursts()) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("effects: could not convert bursts: {}", e);
                Array::new().into()
            }
        }
    }
}

// --- Numbers screen ---------------------------------------------------------

struct NumberHost {
    drill: NumberDrill,
    engine: PlaybackEngine,
}

#[wasm_bindgen]
pub struct NumberLesson {
    inner: Rc<RefCell<NumberHost>>,
    _frames: FrameLoop,
    _gesture: Listener,
    _keys: Listener,
}

#[wasm_bindgen]
impl NumberLesson {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<NumberLesson, JsValue> {
        let config = parse_config(config_json);
        let mut engine = PlaybackEngine::new(
            Box::new(WebAudioBackend::new()),
            ResourceLayout::new(&config.audio_base),
            config.unlock_probe_clip.clone(),
            config.rng(NUMBERS_RNG_STREAM),
        );
        let drill = NumberDrill::new(NumberLine::new(NUM_MIN, NUM_MAX));
        drill.prefetch(&mut engine);
        let inner = Rc::new(RefCell::new(NumberHost { drill, engine }));

        let ticking = inner.clone();
        let frames = FrameLoop::start(move || {
            if let Ok(mut h) = ticking.try_borrow_mut() {
                h.engine.pump();
            }
        });

        let gestures = Rc::downgrade(&inner);
        let gesture = Listener::attach(document_target()?, "pointerdown", move |_| {
            if let Some(h) = gestures.upgrade() {
                if let Ok(mut h) = h.try_borrow_mut() {
                    h.engine.on_gesture();
                }
            }
        })?;

        let keyed = Rc::downgrade(&inner);
        let win: web_sys::EventTarget = window().ok_or_else(|| JsValue::from_str("no window"))?.into();
        let keys = Listener::attach(win, "keydown", move |event| {
            let Some(key) = event.dyn_ref::<web_sys::KeyboardEvent>().map(|k| k.key()) else {
                return;
            };
            let Some(h) = keyed.upgrade() else { return };
            let Ok(mut h) = h.try_borrow_mut() else { return };
            let NumberHost { drill, engine } = &mut *h;
            if let Some(signal) = drill.handle_key(&key, engine) {
                // keyboard playback has no caller waiting on it
                signal.on_settle(|outcome| {
                    if let Some(e) = outcome.error() {
                        log::debug!("numbers: {}", e);
                    }
                });
            }
        })?;

        Ok(NumberLesson { inner, _frames: frames, _gesture: gesture, _keys: keys })
    }

    pub fn current(&self) -> u32 {
        self.inner.borrow().drill.current()
    }

    pub fn next(&self) -> u32 {
        let mut h = self.inner.borrow_mut();
        let NumberHost { drill, engine } = &mut *h;
        drill.next(engine)
    }

    pub fn prev(&self) -> u32 {
        let mut h = self.inner.borrow_mut();
        let NumberHost { drill, engine } = &mut *h;
        drill.prev(engine)
    }

    /// Slider jump; out-of-range values clamp.
    pub fn jump(&self, n: f64) -> u32 {
        let mut h = self.inner.borrow_mut();
        let NumberHost { drill, engine } = &mut *h;
        drill.jump(n as i64, engine)
    }

    pub fn play(&self) -> Promise {
        let signal = {
            let mut h = self.inner.borrow_mut();
            let NumberHost { drill, engine } = &mut *h;
            drill.play(engine)
        };
        to_promise(signal)
    }

    #[wasm_bindgen(js_name = atMin)]
    pub fn at_min(&self) -> bool {
        self.inner.borrow().drill.line().at_min()
    }

    #[wasm_bindgen(js_name = atMax)]
    pub fn at_max(&self) -> bool {
        self.inner.borrow().drill.line().at_max()
    }

    pub fn hue(&self) -> u32 {
        self.inner.borrow().drill.line().hue()
    }

    #[wasm_bindgen(js_name = gateState)]
    pub fn gate_state(&self) -> String {
        gate_name(self.inner.borrow().engine.gate_state()).to_string()
    }

    #[wasm_bindgen(js_name = enableSound)]
    pub fn enable_sound(&self) {
        self.inner.borrow_mut().engine.retry_unlock();
    }
}
