//! Playback requests and the asset path layout.
//!
//! Layout under the audio base (default `/audio`):
//! - `say/say_<word>.mp3`
//! - `spell/spell_<word>.mp3`
//! - `letters/letter_<ch>.mp3`
//! - `welcome/<filename>`
//! - `numbers/number_<n>.mp3`
//!
//! Keys are lower-cased before being embedded. Changing this layout breaks the
//! asset bundle.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{PlaybackError, Result};

pub const DEFAULT_AUDIO_BASE: &str = "/audio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    Say,
    Spell,
    Letter,
    Welcome,
    Number,
    Celebration,
}

impl SoundKind {
    /// Kinds that are not the direct result of a tap on their own control and
    /// therefore wait for the autoplay gate.
    pub fn is_gated(self) -> bool {
        matches!(self, SoundKind::Welcome | SoundKind::Celebration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub kind: SoundKind,
    pub key: String,
    path: String,
}

impl PlaybackRequest {
    pub fn resource_path(&self) -> &str {
        &self.path
    }

    pub fn is_gated(&self) -> bool {
        self.kind.is_gated()
    }

    /// A fixed clip (e.g. the celebration song) addressed by its full path.
    pub fn celebration(path: &str) -> Self {
        Self { kind: SoundKind::Celebration, key: path.to_string(), path: path.to_string() }
    }
}

/// Builds requests against one audio base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayout {
    base: String,
}

impl Default for ResourceLayout {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_BASE)
    }
}

impl ResourceLayout {
    pub fn new(base: &str) -> Self {
        Self { base: base.trim_end_matches('/').to_string() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn say(&self, word: &str) -> PlaybackRequest {
        let key = word.to_lowercase();
        let path = format!("{}/say/say_{}.mp3", self.base, key);
        PlaybackRequest { kind: SoundKind::Say, key, path }
    }

    pub fn spell(&self, word: &str) -> PlaybackRequest {
        let key = word.to_lowercase();
        let path = format!("{}/spell/spell_{}.mp3", self.base, key);
        PlaybackRequest { kind: SoundKind::Spell, key, path }
    }

    pub fn letter(&self, ch: &str) -> PlaybackRequest {
        let key = ch.to_lowercase();
        let path = format!("{}/letters/letter_{}.mp3", self.base, key);
        PlaybackRequest { kind: SoundKind::Letter, key, path }
    }

    pub fn welcome(&self, filename: &str) -> PlaybackRequest {
        let path = format!("{}/welcome/{}", self.base, filename);
        PlaybackRequest { kind: SoundKind::Welcome, key: filename.to_string(), path }
    }

    /// Uniformly pick one clip from `pool`.
    pub fn welcome_random<S: AsRef<str>, R: Rng + ?Sized>(
        &self,
        pool: &[S],
        rng: &mut R,
    ) -> Result<PlaybackRequest> {
        let pick = pool.choose(rng).ok_or(PlaybackError::EmptyPool)?;
        Ok(self.welcome(pick.as_ref()))
    }

    pub fn number(&self, n: u32) -> PlaybackRequest {
        PlaybackRequest {
            kind: SoundKind::Number,
            key: n.to_string(),
            path: self.number_path(n),
        }
    }

    pub fn number_path(&self, n: u32) -> String {
        format!("{}/numbers/number_{}.mp3", self.base, n)
    }
}
