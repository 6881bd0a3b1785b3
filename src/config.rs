//! Lesson configuration.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::WELCOME_POOL;
use crate::audio::DEFAULT_AUDIO_BASE;
use crate::effects::EffectConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    pub audio_base: String,
    /// Song played once per completion.
    pub celebration_clip: String,
    /// Clip used for the muted autoplay probe.
    pub unlock_probe_clip: String,
    pub welcome_pool: Vec<String>,
    pub effects: EffectConfig,
    /// Fixed seed for reproducible welcome picks and particle layouts.
    pub seed: Option<u64>,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            audio_base: DEFAULT_AUDIO_BASE.to_string(),
            celebration_clip: format!("{}/janeiro_snip.mp3", DEFAULT_AUDIO_BASE),
            unlock_probe_clip: format!("{}/welcome/{}", DEFAULT_AUDIO_BASE, WELCOME_POOL[0]),
            welcome_pool: WELCOME_POOL.iter().map(|s| s.to_string()).collect(),
            effects: EffectConfig::default(),
            seed: None,
        }
    }
}

impl LessonConfig {
    /// Parse a JSON config. Missing fields take defaults; malformed input yields
    /// the full default config.
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("config: ignoring malformed lesson config: {}", e);
            Self::default()
        })
    }

    /// RNG for one consumer. `stream` keeps seeded consumers independent.
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}
