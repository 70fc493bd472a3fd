use thiserror::Error;
use tracing::{debug, warn};

use crate::dsp::pitch::KeyId;

/// Reasons a key event did not change the set of sounding voices.
///
/// None of these are fatal: the manager is unchanged and keeps running.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VoiceError {
    #[error("key '{0}' has no pitch mapping")]
    UnknownKey(KeyId),

    #[error("key '{key}' resolved to an invalid frequency ({hz} Hz)")]
    InvalidFrequency { key: KeyId, hz: f64 },

    #[error("key '{0}' already has a sounding voice")]
    DuplicatePress(KeyId),

    #[error("key '{0}' was released but has no sounding voice")]
    ReleaseOfUnknownVoice(KeyId),

    #[error("key '{0}' is already releasing")]
    AlreadyReleasing(KeyId),

    #[error("all {max_voices} voices are held, note dropped")]
    VoicesExhausted { max_voices: usize },
}

impl VoiceError {
    /// Report the dropped action. Malformed input is a warning, ordinary
    /// keyboard noise (repeats, stray key-ups) only shows at debug level.
    pub fn log(&self) {
        if self.is_warning() {
            warn!(reason = %self, "Key event ignored");
        } else {
            debug!(reason = %self, "Key event ignored");
        }
    }

    /// True for errors caused by bad input rather than by playing.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            VoiceError::UnknownKey(_)
                | VoiceError::InvalidFrequency { .. }
                | VoiceError::VoicesExhausted { .. }
        )
    }
}
