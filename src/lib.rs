pub mod config; // Process-wide synth settings
pub mod dsp;
pub mod synth; // Voice scheduling and polyphony

pub use config::{ConfigError, RetriggerPolicy, SynthConfig};
pub use dsp::{
    context::RenderCtx,
    envelope::{Envelope, EnvelopeParams},
    oscillator::Waveform,
    pitch::{Frequency, KeyId, PitchSource, PitchTable},
};
pub use synth::{
    error::VoiceError,
    manager::VoiceManager,
    message::{InputEvent, KeyboardMessage, MessageReceiver, VoiceEvent, VoiceEventSink},
    voice::{Voice, VoicePhase},
};
#[cfg(feature = "rtrb")]
pub use synth::message::CountingProducer;
#[cfg(feature = "rtrb")]
pub use synth::keyboard::{keyboard_synth, KeyboardHandle, KeyboardSynth};

/// Slack applied when comparing a timestamp against a scheduled boundary.
pub(crate) const TIME_EPSILON: f64 = 1e-9;
