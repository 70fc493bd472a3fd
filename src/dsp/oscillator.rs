/*
Audio Oscillator
================

The oscillator is the sound source of every voice. It keeps a phase that
advances by `frequency / sample_rate` each sample and wraps at 1.0; the
waveform is a function of that phase.

  phase     0.0 ──────────────→ 1.0 (wraps)

  Sine      sin(2π · phase)                 pure tone, the default
  Saw       2 · phase - 1                   all harmonics, bright
  Square    +1 below 0.5, -1 above          odd harmonics, hollow
  Triangle  1 - 4 · |phase - 0.5|           odd harmonics, soft

The waveforms are naive (not band-limited). At keyboard pitches the aliasing
of saw and square is audible but acceptable; sine has none.

Phase is reset on note-on so every note starts at a zero crossing (for sine),
which keeps the attack free of clicks.
*/

use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Waveform {
    /// Value of the waveform at `phase` in [0, 1).
    #[inline]
    pub fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Produce one sample and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f64, sample_rate: f32) -> f32 {
        let value = self.waveform.sample(self.phase);
        self.phase += frequency / sample_rate as f64;
        self.phase -= self.phase.floor();
        value as f32
    }

    pub fn render(&mut self, out: &mut [f32], frequency: f64, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }
}
