//! Low-level DSP primitives used by the voice scheduler.
//!
//! These components stay focused on the signal math: how a key becomes a
//! pitch, how a gain curve is scheduled, and how a waveform is generated. The
//! `synth` layer decides when each of them runs.

/// Block timing passed to render calls.
pub mod context;
/// Attack/decay/sustain/release gain schedule.
pub mod envelope;
/// Oscillator waveforms.
pub mod oscillator;
/// Equal-tempered key to frequency table.
pub mod pitch;

pub use envelope::EnvelopeParams;
