//! Browser implementations of the storage, clock, renderer and logging seams.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Storage, window};

use crate::clock::Clock;
use crate::effects::{BurstRenderer, ConfettiParams};
use crate::store::{MemoryStore, SessionStore};

/// `sessionStorage`, falling back to memory when the browser denies access
/// (private mode, sandboxed iframes).
pub struct WebSessionStore {
    storage: Option<Storage>,
    fallback: MemoryStore,
}

impl WebSessionStore {
    pub fn new() -> Self {
        let storage = window().and_then(|w| w.session_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("store: sessionStorage unavailable, progress will not survive reloads");
        }
        Self { storage, fallback: MemoryStore::new() }
    }
}

impl SessionStore for WebSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        match &self.storage {
            Some(s) => s.get_item(key).ok().flatten(),
            None => self.fallback.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match &self.storage {
            Some(s) => {
                if s.set_item(key, value).is_err() {
                    log::warn!("store: failed to write {}", key);
                }
            }
            None => self.fallback.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) {
        match &self.storage {
            Some(s) => {
                let _ = s.remove_item(key);
            }
            None => self.fallback.remove(key),
        }
    }
}

/// `performance.now()`.
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }
}

/// Calls `window.confetti` or `window.tsParticles.confetti`, whichever is loaded.
#[derive(Default)]
pub struct ConfettiRenderer {
    warned: bool,
}

fn lookup_confetti() -> Option<js_sys::Function> {
    let win: JsValue = window()?.into();
    let direct = js_sys::Reflect::get(&win, &JsValue::from_str("confetti")).ok()?;
    if let Some(f) = direct.dyn_ref::<js_sys::Function>() {
        return Some(f.clone());
    }
    let particles = js_sys::Reflect::get(&win, &JsValue::from_str("tsParticles")).ok()?;
    if particles.is_undefined() || particles.is_null() {
        return None;
    }
    js_sys::Reflect::get(&particles, &JsValue::from_str("confetti"))
        .ok()?
        .dyn_into::<js_sys::Function>()
        .ok()
}

impl BurstRenderer for ConfettiRenderer {
    fn fire(&mut self, surface_id: &str, params: &ConfettiParams) {
        let Some(confetti) = lookup_confetti() else {
            if !self.warned {
                log::warn!("effects: confetti bundle not loaded");
                self.warned = true;
            }
            return;
        };
        let options = match serde_wasm_bindgen::to_value(params) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("effects: could not convert confetti options: {}", e);
                return;
            }
        };
        if let Err(e) = confetti.call2(&JsValue::NULL, &JsValue::from_str(surface_id), &options) {
            log::warn!("effects: confetti call failed: {:?}", e);
        }
    }
}

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

pub fn init_logging() {
    let level = if cfg!(debug_assertions) { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
