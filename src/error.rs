//! Error types for lesson playback

use thiserror::Error;

/// Failures that reach the presentation layer through a playback signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Audio file missing, corrupt, or undecodable
    #[error("audio load error: {path}")]
    ResourceLoad { path: String },

    /// Platform policy refused playback without a qualifying gesture
    #[error("autoplay rejected: {path}")]
    AutoplayRejected { path: String },

    /// Random welcome selection was asked to pick from nothing
    #[error("welcome pool is empty")]
    EmptyPool,
}

impl PlaybackError {
    /// Whether this failure should move the autoplay gate to `Blocked`.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, PlaybackError::AutoplayRejected { .. })
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
