//! Numbers 1-100 practice mode.
//!
//! Unlike the word deck this cursor clamps at both ends, so Previous/Next on
//! the first/last number are no-ops.

use crate::audio::{PlaybackEngine, PlaybackSignal};

pub const NUM_MIN: u32 = 1;
pub const NUM_MAX: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLine {
    min: u32,
    max: u32,
    n: u32,
}

impl Default for NumberLine {
    fn default() -> Self {
        Self::new(NUM_MIN, NUM_MAX)
    }
}

impl NumberLine {
    pub fn new(min: u32, max: u32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max, n: min }
    }

    pub fn current(&self) -> u32 {
        self.n
    }

    pub fn next(&mut self) -> u32 {
        self.n = self.n.saturating_add(1).min(self.max);
        self.n
    }

    pub fn prev(&mut self) -> u32 {
        self.n = self.n.saturating_sub(1).max(self.min);
        self.n
    }

    /// Slider jump, clamped into range.
    pub fn jump(&mut self, n: i64) -> u32 {
        self.n = n.clamp(self.min as i64, self.max as i64) as u32;
        self.n
    }

    pub fn at_min(&self) -> bool {
        self.n == self.min
    }

    pub fn at_max(&self) -> bool {
        self.n == self.max
    }

    /// Gradient hue in degrees for the number card.
    pub fn hue(&self) -> u32 {
        (self.n as f64 / self.max.max(1) as f64 * 360.0).round() as u32
    }

    /// Current and next number, the pair worth warming up.
    pub fn prefetch_targets(&self) -> [u32; 2] {
        [self.n, self.n.saturating_add(1).min(self.max)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Next,
    Prev,
    Play,
}

impl KeyCommand {
    /// Map a `KeyboardEvent.key` value. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" => Some(KeyCommand::Next),
            "ArrowLeft" => Some(KeyCommand::Prev),
            " " | "Space" | "Spacebar" | "Enter" => Some(KeyCommand::Play),
            _ => None,
        }
    }
}

/// Number cursor wired to playback and prefetch.
#[derive(Debug, Default)]
pub struct NumberDrill {
    line: NumberLine,
}

impl NumberDrill {
    pub fn new(line: NumberLine) -> Self {
        Self { line }
    }

    pub fn line(&self) -> &NumberLine {
        &self.line
    }

    pub fn current(&self) -> u32 {
        self.line.current()
    }

    /// Warm up the current and next clip. Call after every cursor change.
    pub fn prefetch(&self, engine: &mut PlaybackEngine) {
        for n in self.line.prefetch_targets() {
            let path = engine.layout().number_path(n);
            engine.prefetch(&path);
        }
    }

    pub fn next(&mut self, engine: &mut PlaybackEngine) -> u32 {
        let before = self.line.current();
        let n = self.line.next();
        if n != before {
            self.prefetch(engine);
        }
        n
    }

    pub fn prev(&mut self, engine: &mut PlaybackEngine) -> u32 {
        let before = self.line.current();
        let n = self.line.prev();
        if n != before {
            self.prefetch(engine);
        }
        n
    }

    pub fn jump(&mut self, n: i64, engine: &mut PlaybackEngine) -> u32 {
        let before = self.line.current();
        let n = self.line.jump(n);
        if n != before {
            self.prefetch(engine);
        }
        n
    }

    pub fn play(&self, engine: &mut PlaybackEngine) -> PlaybackSignal {
        engine.play_number(self.line.current())
    }

    /// Keyboard surface. Returns the playback signal when the key asked for audio.
    pub fn handle_key(&mut self, key: &str, engine: &mut PlaybackEngine) -> Option<PlaybackSignal> {
        match KeyCommand::from_key(key)? {
            KeyCommand::Next => {
                self.next(engine);
                None
            }
            KeyCommand::Prev => {
                self.prev(engine);
                None
            }
            KeyCommand::Play => Some(self.play(engine)),
        }
    }
}
