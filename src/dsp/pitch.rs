/*
Equal-Tempered Pitch Table
==========================

Every key on the computer keyboard is assigned a pitch by its position in a
fixed layout string. The first key plays the base frequency and each key
after it sits one semitone higher.

Vocabulary
----------

  half step   The smallest interval on a piano: one key to the next,
              black keys included. Also called a semitone.

  ratio       The factor one half step multiplies the frequency by. Twelve
              half steps make an octave, and an octave doubles the
              frequency, so the ratio is the twelfth root of two:

                  ratio = 2^(1/12) ≈ 1.059463

  base        Frequency of the key at position 0. The default is middle C
              (C4 = 261.63 Hz).


The Formula
-----------

    f(n) = base * ratio^n

  n = 0   →  261.63 Hz   (C4)
  n = 9   →  440.01 Hz   (A4, the tuning reference, off by the rounded base)
  n = 12  →  523.26 Hz   (C5, one octave up: exactly 2 × base)

The table keeps the full-precision value for driving oscillators and only
rounds when the frequency is displayed (two decimals, e.g. "440.00 Hz").


Default Layout
--------------

    Q W E R T Y U I O P A S D F G H J K L Z X C V B N M
    0 1 2 3 4 5 6 7 8 9 ...                          25

26 keys, a little over two octaves starting at middle C.
*/

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies one key on the playing surface (the character printed on it).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(char);

impl KeyId {
    pub const fn new(key: char) -> Self {
        Self(key)
    }

    pub const fn as_char(self) -> char {
        self.0
    }
}

impl From<char> for KeyId {
    fn from(key: char) -> Self {
        Self(key)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pitch in Hz. Always finite and strictly positive.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Frequency(f64);

impl Frequency {
    /// Concert pitch.
    pub const A4: Frequency = Frequency(440.0);

    /// Returns `None` for NaN, infinities, zero and negative values.
    pub fn new(hz: f64) -> Option<Self> {
        (hz.is_finite() && hz > 0.0).then_some(Self(hz))
    }

    /// Full-precision value, used to drive oscillators.
    #[inline]
    pub fn hz(self) -> f64 {
        self.0
    }

    /// Value rounded to two decimals for display.
    pub fn rounded(self) -> f64 {
        (self.0 * 100.0).round() / 100.0
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} Hz", self.0)
    }
}

/// Resolves keys to raw frequencies in Hz.
///
/// The voice manager validates whatever comes back, so implementations may
/// return any value; a non-finite or non-positive result simply drops the note.
pub trait PitchSource: Send {
    fn frequency_of(&self, key: KeyId) -> Option<f64>;
}

impl<F> PitchSource for F
where
    F: Fn(KeyId) -> Option<f64> + Send,
{
    fn frequency_of(&self, key: KeyId) -> Option<f64> {
        self(key)
    }
}

pub const DEFAULT_BASE_FREQUENCY: f64 = 261.63; // C4
pub const DEFAULT_KEY_LAYOUT: &str = "QWERTYUIOPASDFGHJKLZXCVBNM";

/// 12th root of 2.
pub fn half_step() -> f64 {
    2.0_f64.powf(1.0 / 12.0)
}

/// Equal-tempered table over an ordered key layout.
#[derive(Debug, Clone)]
pub struct PitchTable {
    base_frequency: f64,
    half_step_ratio: f64,
    keys: Vec<KeyId>,
}

impl PitchTable {
    pub fn new(base_frequency: f64, half_step_ratio: f64, layout: &str) -> Self {
        Self {
            base_frequency,
            half_step_ratio,
            keys: layout.chars().map(KeyId::new).collect(),
        }
    }

    /// Position of `key` in the layout.
    pub fn index_of(&self, key: KeyId) -> Option<usize> {
        self.keys.iter().position(|&k| k == key)
    }

    /// Frequency for `key`, or `None` when the key is not in the layout.
    pub fn frequency(&self, key: KeyId) -> Option<Frequency> {
        self.frequency_of(key).and_then(Frequency::new)
    }

    /// Every key with its raw frequency, in layout order.
    pub fn frequencies(&self) -> impl Iterator<Item = (KeyId, f64)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .map(|(n, &key)| (key, self.frequency_at(n)))
    }

    pub fn keys(&self) -> &[KeyId] {
        &self.keys
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    pub fn half_step_ratio(&self) -> f64 {
        self.half_step_ratio
    }

    #[inline]
    fn frequency_at(&self, n: usize) -> f64 {
        self.base_frequency * self.half_step_ratio.powi(n as i32)
    }
}

impl Default for PitchTable {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_FREQUENCY, half_step(), DEFAULT_KEY_LAYOUT)
    }
}

impl PitchSource for PitchTable {
    fn frequency_of(&self, key: KeyId) -> Option<f64> {
        self.index_of(key).map(|n| self.frequency_at(n))
    }
}
