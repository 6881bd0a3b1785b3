//! `HtmlAudioElement` playback backend.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{HtmlAudioElement, window};

use crate::audio::{AudioBackend, BackendEvent, SessionId};
use crate::error::PlaybackError;

type EventQueue = Rc<RefCell<Vec<BackendEvent>>>;

struct ActiveElement {
    session: SessionId,
    audio: HtmlAudioElement,
    _on_ended: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut()>,
}

#[derive(Default)]
pub struct WebAudioBackend {
    active: Option<ActiveElement>,
    events: EventQueue,
    prefetched: HashSet<String>,
}

impl WebAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Map a rejected `play()` to the error taxonomy. `NotAllowedError` is policy.
fn classify(err: &JsValue, path: &str) -> PlaybackError {
    let name = js_sys::Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|v| v.as_string());
    match name.as_deref() {
        Some("NotAllowedError") => PlaybackError::AutoplayRejected { path: path.to_string() },
        _ => PlaybackError::ResourceLoad { path: path.to_string() },
    }
}

/// Detach the element's handlers so nothing it fires later reaches a dropped closure.
fn release(active: ActiveElement) {
    active.audio.set_onended(None);
    active.audio.set_onerror(None);
    let _ = active.audio.pause();
    active.audio.set_current_time(0.0);
}

impl AudioBackend for WebAudioBackend {
    fn start(&mut self, session: SessionId, path: &str) {
        // finished sessions are never halted, but their element may still fire
        if let Some(previous) = self.active.take() {
            release(previous);
        }
        let audio = match HtmlAudioElement::new_with_src(path) {
            Ok(a) => a,
            Err(_) => {
                self.events.borrow_mut().push(BackendEvent::Failed(
                    session,
                    PlaybackError::ResourceLoad { path: path.to_string() },
                ));
                return;
            }
        };
        audio.set_preload("auto");

        let events = self.events.clone();
        let on_ended = Closure::<dyn FnMut()>::new(move || {
            events.borrow_mut().push(BackendEvent::Ended(session));
        });
        audio.set_onended(Some(on_ended.as_ref().unchecked_ref()));

        let events = self.events.clone();
        let error_path = path.to_string();
        let on_error = Closure::<dyn FnMut()>::new(move || {
            events.borrow_mut().push(BackendEvent::Failed(
                session,
                PlaybackError::ResourceLoad { path: error_path.clone() },
            ));
        });
        audio.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        match audio.play() {
            Ok(promise) => {
                let events = self.events.clone();
                let reject_path = path.to_string();
                // may settle after a halt; the engine drops the stale event
                spawn_local(async move {
                    if let Err(err) = JsFuture::from(promise).await {
                        events
                            .borrow_mut()
                            .push(BackendEvent::Failed(session, classify(&err, &reject_path)));
                    }
                });
            }
            Err(err) => {
                self.events.borrow_mut().push(BackendEvent::Failed(session, classify(&err, path)));
            }
        }

        self.active = Some(ActiveElement { session, audio, _on_ended: on_ended, _on_error: on_error });
    }

    fn halt(&mut self, session: SessionId) {
        if let Some(active) = self.active.take_if(|a| a.session == session) {
            release(active);
        }
    }

    fn probe(&mut self, path: &str) {
        let events = self.events.clone();
        let audio = match HtmlAudioElement::new_with_src(path) {
            Ok(a) => a,
            Err(_) => {
                events.borrow_mut().push(BackendEvent::ProbeResolved(false));
                return;
            }
        };
        audio.set_muted(true);
        match audio.play() {
            Ok(promise) => spawn_local(async move {
                let ok = JsFuture::from(promise).await.is_ok();
                if ok {
                    let _ = audio.pause();
                    audio.set_current_time(0.0);
                    audio.set_muted(false);
                }
                events.borrow_mut().push(BackendEvent::ProbeResolved(ok));
            }),
            Err(_) => events.borrow_mut().push(BackendEvent::ProbeResolved(false)),
        }
    }

    fn prefetch(&mut self, path: &str) {
        if !self.prefetched.insert(path.to_string()) {
            return;
        }
        let Some(doc) = window().and_then(|w| w.document()) else { return };
        let Some(head) = doc.head() else { return };
        let Ok(link) = doc.create_element("link") else { return };
        let _ = link.set_attribute("rel", "prefetch");
        let _ = link.set_attribute("as", "audio");
        let _ = link.set_attribute("href", path);
        if head.append_child(&link).is_err() {
            log::debug!("prefetch: could not append link for {}", path);
        }
    }

    fn drain_events(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}
