//! Process-wide synth configuration.
//!
//! A [`SynthConfig`] is fixed when a voice manager is built. Every field has a
//! default, and the chainable setters cover the common adjustments:
//!
//! ```
//! use saavy_keys::{SynthConfig, VoiceManager, Waveform};
//!
//! let config = SynthConfig::new()
//!     .base_frequency(220.0)
//!     .sustain_level(0.5)
//!     .waveform(Waveform::Triangle);
//! let manager = VoiceManager::new(config).expect("valid config");
//! assert_eq!(manager.voice_count(), 0);
//! ```

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dsp::{
    envelope::EnvelopeParams,
    oscillator::Waveform,
    pitch::{half_step, PitchTable, DEFAULT_BASE_FREQUENCY, DEFAULT_KEY_LAYOUT},
};

/// What a key-down does while the same key's previous voice is still releasing.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetriggerPolicy {
    /// Finish the releasing voice on the spot and start a new one.
    #[default]
    Restart,
    /// Ignore the press until the releasing voice has finished.
    Ignore,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a finite number greater than zero, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be a finite number of seconds >= 0, got {value}")]
    NegativeDuration { name: &'static str, value: f64 },

    #[error("sustain level must be within [0, 1], got {0}")]
    SustainOutOfRange(f64),

    #[error("output gain must be a finite number >= 0, got {0}")]
    InvalidOutputGain(f32),

    #[error("key layout is empty")]
    EmptyLayout,

    #[error("key '{0}' appears more than once in the key layout")]
    DuplicateKey(char),

    #[error("max voices must be at least 1")]
    NoVoices,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    /// Frequency of the first key in the layout (Hz).
    pub base_frequency: f64,
    /// Frequency ratio between neighbouring keys.
    pub half_step_ratio: f64,
    /// Keys in pitch order, lowest first.
    pub key_layout: String,
    pub envelope: EnvelopeParams,
    pub waveform: Waveform,
    /// Upper bound on simultaneously allocated voices.
    pub max_voices: usize,
    pub retrigger: RetriggerPolicy,
    /// Sample rate used when rendering audio.
    pub sample_rate: f32,
    /// Gain applied to the mixed voices.
    pub output_gain: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            base_frequency: DEFAULT_BASE_FREQUENCY,
            half_step_ratio: half_step(),
            key_layout: DEFAULT_KEY_LAYOUT.to_string(),
            envelope: EnvelopeParams::default(),
            waveform: Waveform::Sine,
            max_voices: 32,
            retrigger: RetriggerPolicy::Restart,
            sample_rate: 48_000.0,
            output_gain: 0.25,
        }
    }
}

impl SynthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_frequency(mut self, hz: f64) -> Self {
        self.base_frequency = hz;
        self
    }

    pub fn half_step_ratio(mut self, ratio: f64) -> Self {
        self.half_step_ratio = ratio;
        self
    }

    pub fn key_layout(mut self, layout: impl Into<String>) -> Self {
        self.key_layout = layout.into();
        self
    }

    pub fn envelope(mut self, envelope: EnvelopeParams) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn attack_time(mut self, seconds: f64) -> Self {
        self.envelope.attack_time = seconds;
        self
    }

    pub fn decay_time(mut self, seconds: f64) -> Self {
        self.envelope.decay_time = seconds;
        self
    }

    pub fn sustain_level(mut self, level: f64) -> Self {
        self.envelope.sustain_level = level;
        self
    }

    pub fn fast_release_time(mut self, seconds: f64) -> Self {
        self.envelope.fast_release_time = seconds;
        self
    }

    pub fn sustain_pedal_release_time(mut self, seconds: f64) -> Self {
        self.envelope.sustain_pedal_release_time = seconds;
        self
    }

    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn retrigger(mut self, policy: RetriggerPolicy) -> Self {
        self.retrigger = policy;
        self
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn output_gain(mut self, gain: f32) -> Self {
        self.output_gain = gain;
        self
    }

    /// Check every field; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("base frequency", self.base_frequency)?;
        positive("half step ratio", self.half_step_ratio)?;
        positive("sample rate", self.sample_rate as f64)?;

        let env = &self.envelope;
        non_negative("attack time", env.attack_time)?;
        non_negative("decay time", env.decay_time)?;
        positive("fast release time", env.fast_release_time)?;
        positive("sustain pedal release time", env.sustain_pedal_release_time)?;
        if !(0.0..=1.0).contains(&env.sustain_level) {
            return Err(ConfigError::SustainOutOfRange(env.sustain_level));
        }

        if !self.output_gain.is_finite() || self.output_gain < 0.0 {
            return Err(ConfigError::InvalidOutputGain(self.output_gain));
        }
        if self.max_voices == 0 {
            return Err(ConfigError::NoVoices);
        }

        if self.key_layout.is_empty() {
            return Err(ConfigError::EmptyLayout);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.key_layout.chars().find(|c| !seen.insert(*c)) {
            return Err(ConfigError::DuplicateKey(dup));
        }

        Ok(())
    }

    /// Equal-tempered table described by this config.
    pub fn pitch_table(&self) -> PitchTable {
        PitchTable::new(self.base_frequency, self.half_step_ratio, &self.key_layout)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeDuration { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SynthConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.base_frequency, 261.63);
        assert!((config.half_step_ratio.powi(12) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn setters_chain() {
        let config = SynthConfig::new()
            .attack_time(0.0)
            .decay_time(0.0)
            .fast_release_time(0.1)
            .max_voices(4)
            .retrigger(RetriggerPolicy::Ignore);

        assert_eq!(config.envelope.attack_time, 0.0);
        assert_eq!(config.envelope.fast_release_time, 0.1);
        assert_eq!(config.max_voices, 4);
        assert_eq!(config.retrigger, RetriggerPolicy::Ignore);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            SynthConfig::new().base_frequency(f64::NAN).validate(),
            Err(ConfigError::NotPositive { name: "base frequency", .. })
        ));
        assert!(matches!(
            SynthConfig::new().half_step_ratio(0.0).validate(),
            Err(ConfigError::NotPositive { .. })
        ));
        assert!(matches!(
            SynthConfig::new().attack_time(-0.1).validate(),
            Err(ConfigError::NegativeDuration { name: "attack time", .. })
        ));
        assert!(matches!(
            SynthConfig::new().sustain_pedal_release_time(0.0).validate(),
            Err(ConfigError::NotPositive { .. })
        ));
        assert_eq!(
            SynthConfig::new().sustain_level(1.2).validate(),
            Err(ConfigError::SustainOutOfRange(1.2))
        );
        assert_eq!(
            SynthConfig::new().output_gain(f32::INFINITY).validate(),
            Err(ConfigError::InvalidOutputGain(f32::INFINITY))
        );
        assert_eq!(
            SynthConfig::new().max_voices(0).validate(),
            Err(ConfigError::NoVoices)
        );
    }

    #[test]
    fn rejects_bad_layouts() {
        assert_eq!(
            SynthConfig::new().key_layout("").validate(),
            Err(ConfigError::EmptyLayout)
        );
        assert_eq!(
            SynthConfig::new().key_layout("ASDFA").validate(),
            Err(ConfigError::DuplicateKey('A'))
        );
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = SynthConfig::new().decay_time(f64::INFINITY).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "decay time must be a finite number of seconds >= 0, got inf"
        );
    }
}
