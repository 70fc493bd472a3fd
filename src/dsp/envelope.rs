/*
ADSR Gain Schedule
==================

This module implements the amplitude envelope of one voice as a schedule of
timed ramp points, the way an automation lane works in a DAW. A note-on
writes the attack and decay points once; a note-off cancels whatever has not
happened yet and writes a release ramp. Nothing is recomputed per tick.

Vocabulary
----------

  point       A (time, value) pair. Between two points the gain moves in a
              straight line; after the last point it holds that value.

  level       The gain the schedule produces at a given time (0.0 to 1.0).
              The renderer multiplies the oscillator output by it.

  capture     Reading the level at the instant release begins. The release
              ramp starts there, not at the sustain level.

  cancel      Dropping every point at or after a time. Used on release so an
              unfinished attack or decay cannot raise the level again.


The Shape: Linear Ramps
-----------------------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        t0  ta  td          t1  t1 + release

  start(t0):    (t0, 0)  (ta, 1)  (td, S)       ta = t0 + attack
                                                td = ta + decay
  release(t1):  cancel ≥ t1, then (t1, captured)  (t1 + release, 0)


Early Release
-------------

Release can happen before the decay point is reached:

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲  ← note-off here, level is 0.85
        │   ╱    ╲
        │  ╱      ╲
    0.0 └─╱────────╲──→ Time
              ta  t1

The (td, S) point is cancelled and the release ramp starts from 0.85. The
segment from (ta, 1) to (t1, 0.85) lies on the scheduled decay line, so the
curve has no jump. A jump would be heard as a click.


Degenerate Durations
--------------------

  attack = 0, decay = 0     start at S immediately: (t0, S)
  attack = 0                start at 1 and decay:   (t0, 1) (td, S)
  decay = 0                 jump from 1 to S at ta: (t0, 0) (ta, 1) (ta, S)

When two points share a time, the later one wins from that instant on.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Envelope timings shared by every voice of a synth.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Seconds to ramp 0 → 1.
    pub attack_time: f64,
    /// Seconds to ramp 1 → sustain.
    pub decay_time: f64,
    /// Level held while the key is down (0.0 - 1.0).
    pub sustain_level: f64,
    /// Seconds to ramp to silence after key-up.
    pub fast_release_time: f64,
    /// Release time used instead when the sustain pedal is down at key-up.
    pub sustain_pedal_release_time: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack_time: 0.01,
            decay_time: 0.2,
            sustain_level: 0.7,
            fast_release_time: 0.05,
            sustain_pedal_release_time: 1.5,
        }
    }
}

impl EnvelopeParams {
    pub fn release_time(&self, sustain_pedal: bool) -> f64 {
        if sustain_pedal {
            self.sustain_pedal_release_time
        } else {
            self.fast_release_time
        }
    }
}

/// One scheduled point of the gain curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampPoint {
    pub time: f64,
    pub value: f64,
}

// three points for attack/decay plus two for release
const MAX_POINTS: usize = 5;

/// Gain schedule for a single voice.
#[derive(Debug, Clone)]
pub struct Envelope {
    points: Vec<RampPoint>,

    // Phase boundaries of the current note
    start_time: f64,
    attack_end: f64,
    decay_end: f64,
    release_end: Option<f64>,
}

impl Envelope {
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(MAX_POINTS),
            start_time: 0.0,
            attack_end: 0.0,
            decay_end: 0.0,
            release_end: None,
        }
    }

    /// Note-on: replace the schedule with attack and decay starting at `t0`.
    ///
    /// Reuses the point buffer, so restarting a pooled voice does not allocate.
    pub fn start(&mut self, params: &EnvelopeParams, t0: f64) {
        let attack = params.attack_time.max(0.0);
        let decay = params.decay_time.max(0.0);
        let sustain = params.sustain_level.clamp(0.0, 1.0);

        self.points.clear();
        self.start_time = t0;
        self.attack_end = t0 + attack;
        self.decay_end = self.attack_end + decay;
        self.release_end = None;

        if attack + decay <= 0.0 {
            self.set_value_at(sustain, t0);
            return;
        }

        if attack > 0.0 {
            self.set_value_at(0.0, t0);
            self.linear_ramp_to(1.0, self.attack_end);
        } else {
            self.set_value_at(1.0, t0);
        }

        if decay > 0.0 {
            self.linear_ramp_to(sustain, self.decay_end);
        } else {
            self.set_value_at(sustain, self.attack_end);
        }
    }

    /// Note-off: capture the level at `t1`, cancel everything still pending
    /// and ramp to silence over `duration` seconds.
    ///
    /// Returns the captured level.
    pub fn release(&mut self, t1: f64, duration: f64) -> f64 {
        let captured = self.gain_at(t1);
        let duration = duration.max(0.0);

        self.cancel_scheduled_values(t1);
        self.set_value_at(captured, t1);
        self.linear_ramp_to(0.0, t1 + duration);
        self.release_end = Some(t1 + duration);

        captured
    }

    /// Gain at stream time `t`.
    ///
    /// Silent before the first point, linear between points, and holding the
    /// last value after the final point.
    pub fn gain_at(&self, t: f64) -> f64 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        if t < first.time {
            return 0.0;
        }

        // last point at or before t; points are kept in time order
        let idx = self.points.partition_point(|p| p.time <= t) - 1;
        let from = self.points[idx];
        match self.points.get(idx + 1) {
            Some(to) => {
                let progress = (t - from.time) / (to.time - from.time);
                from.value + (to.value - from.value) * progress
            }
            None => from.value,
        }
    }

    /// Fill `out` with the gain at `start, start + dt, start + 2dt, ...`.
    pub fn render(&self, out: &mut [f32], start: f64, dt: f64) {
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.gain_at(start + i as f64 * dt) as f32;
        }
    }

    pub fn points(&self) -> &[RampPoint] {
        &self.points
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Time the attack peak is reached.
    pub fn attack_end(&self) -> f64 {
        self.attack_end
    }

    /// Time the sustain level is reached.
    pub fn decay_end(&self) -> f64 {
        self.decay_end
    }

    /// Time the release ramp reaches silence, once released.
    pub fn release_end(&self) -> Option<f64> {
        self.release_end
    }

    pub fn is_released(&self) -> bool {
        self.release_end.is_some()
    }

    fn set_value_at(&mut self, value: f64, time: f64) {
        self.points.push(RampPoint { time, value });
    }

    fn linear_ramp_to(&mut self, value: f64, time: f64) {
        self.points.push(RampPoint { time, value });
    }

    fn cancel_scheduled_values(&mut self, time: f64) {
        self.points.retain(|p| p.time < time);
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}
