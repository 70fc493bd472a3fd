use crate::{
    dsp::{
        context::RenderCtx,
        envelope::{Envelope, EnvelopeParams},
        oscillator::{Oscillator, Waveform},
        pitch::{Frequency, KeyId},
    },
    TIME_EPSILON,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePhase {
    Attack,    // Ramping 0 → 1
    Decay,     // Ramping 1 → sustain
    Sustain,   // Holding until key-up
    Releasing, // Key released, ramping to silence
    Finished,  // Silent, slot can be reused
}

/// One sounding note: an oscillator, its gain schedule and lifecycle state.
///
/// Voices are pooled by the manager and restarted for new notes, so the
/// envelope's point buffer is allocated once per slot.
#[derive(Debug, Clone)]
pub struct Voice {
    key: KeyId,
    frequency: Frequency,
    phase: VoicePhase,
    start_time: f64,
    release_start_time: Option<f64>,
    finish_time: Option<f64>,
    age: u64,
    envelope: Envelope,
    oscillator: Oscillator,
}

impl Voice {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            key: KeyId::new('\0'),
            frequency: Frequency::A4,
            phase: VoicePhase::Finished,
            start_time: 0.0,
            release_start_time: None,
            finish_time: None,
            age: 0,
            envelope: Envelope::new(),
            oscillator: Oscillator::new(waveform),
        }
    }

    /// Note-on: reset the oscillator and write the attack/decay schedule.
    pub fn restart(
        &mut self,
        key: KeyId,
        frequency: Frequency,
        t0: f64,
        params: &EnvelopeParams,
        age: u64,
    ) {
        self.key = key;
        self.frequency = frequency;
        self.phase = VoicePhase::Attack;
        self.start_time = t0;
        self.release_start_time = None;
        self.finish_time = None;
        self.age = age;
        self.envelope.start(params, t0);
        self.oscillator.reset();
    }

    /// Apply every phase boundary at or before `now`.
    ///
    /// Returns the scheduled finish time when this call moved the voice to
    /// `Finished`.
    pub fn advance(&mut self, now: f64) -> Option<f64> {
        let reached = |boundary: f64| now + TIME_EPSILON >= boundary;

        if self.phase == VoicePhase::Attack && reached(self.envelope.attack_end()) {
            self.phase = VoicePhase::Decay;
        }
        if self.phase == VoicePhase::Decay && reached(self.envelope.decay_end()) {
            self.phase = VoicePhase::Sustain;
        }
        if self.phase == VoicePhase::Releasing {
            if let Some(finish) = self.finish_time.filter(|&f| reached(f)) {
                self.phase = VoicePhase::Finished;
                return Some(finish);
            }
        }
        None
    }

    /// Key-up: start the release ramp at `t1` from the current level.
    ///
    /// Returns the captured level. Calling it on a voice that is already
    /// releasing or finished leaves the voice unchanged.
    pub fn release(&mut self, t1: f64, duration: f64) -> f64 {
        if !self.is_held() {
            return self.envelope.gain_at(t1);
        }
        let captured = self.envelope.release(t1, duration);
        self.phase = VoicePhase::Releasing;
        self.release_start_time = Some(t1);
        self.finish_time = self.envelope.release_end();
        captured
    }

    /// End the voice immediately, e.g. to steal its slot.
    pub fn force_finish(&mut self, t: f64) {
        self.phase = VoicePhase::Finished;
        self.finish_time = Some(t);
    }

    /// Add this voice's output to `out`, scaled by `gain`.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx, gain: f32) {
        if !self.is_live() {
            return;
        }
        let hz = self.frequency.hz();
        for (i, sample) in out.iter_mut().enumerate() {
            let level = self.envelope.gain_at(ctx.sample_time(i)) as f32;
            *sample += self.oscillator.next_sample(hz, ctx.sample_rate) * level * gain;
        }
    }

    /// Not yet finished.
    pub fn is_live(&self) -> bool {
        self.phase != VoicePhase::Finished
    }

    /// Key still down: attack, decay or sustain.
    pub fn is_held(&self) -> bool {
        matches!(
            self.phase,
            VoicePhase::Attack | VoicePhase::Decay | VoicePhase::Sustain
        )
    }

    pub fn is_releasing(&self) -> bool {
        self.phase == VoicePhase::Releasing
    }

    pub fn key(&self) -> KeyId {
        self.key
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn phase(&self) -> VoicePhase {
        self.phase
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn release_start_time(&self) -> Option<f64> {
        self.release_start_time
    }

    /// Scheduled end of the release ramp, once released.
    pub fn finish_time(&self) -> Option<f64> {
        self.finish_time
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn gain_at(&self, t: f64) -> f64 {
        self.envelope.gain_at(t)
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.oscillator.set_waveform(waveform);
    }
}
