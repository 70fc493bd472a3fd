/*
Voice Manager
=============

The manager owns every voice and is the only thing that changes them. Key
and pedal events come in with timestamps; note events go out to a sink.

  KeyDown ──┐                          ┌──→ NoteOn
  KeyUp   ──┼──→ VoiceManager ─────────┼──→ NoteOff
  Pedal   ──┘    (arena + key map)     └──→ VoiceFinished
                       │
                       └──→ render_block: Σ oscillator × envelope


Voice Pool
----------

  voices:  [ v0 | v1 | v2 | v3 | ... ]    fixed number of slots
  active:  { 'A' → 2, 'S' → 0 }           one entry per sounding key

A slot is free once its voice is Finished. Note-on takes the first free
slot; when none is free the oldest releasing voice is stolen. If every
voice is held the note is dropped.


Time
----

Every event first advances all voices to its timestamp, so transitions
that were due earlier are reported before the event's own output. Phase
boundaries are stored on the voice when it starts or releases and are
only compared against the clock afterwards:

  t0 ──attack──→ Decay ──decay──→ Sustain ... t1 ──release──→ Finished
                                              │                 │
                                         NoteOff(t1)   VoiceFinished(t1 + r)

The release duration is read from the pedal at key-up and never again.
Timestamps never move backwards; a stale one is treated as "now".
*/

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    config::{ConfigError, RetriggerPolicy, SynthConfig},
    dsp::{
        context::RenderCtx,
        envelope::EnvelopeParams,
        pitch::{Frequency, KeyId, PitchSource},
    },
    synth::{
        error::VoiceError,
        message::{InputEvent, VoiceEvent, VoiceEventSink},
        sustain::SustainPedal,
        voice::{Voice, VoicePhase},
    },
};

pub struct VoiceManager<S: VoiceEventSink = Vec<VoiceEvent>> {
    params: EnvelopeParams,
    pitch: Box<dyn PitchSource>,
    pedal: SustainPedal,
    retrigger: RetriggerPolicy,
    output_gain: f32,
    // Routine tracing; off on the audio thread
    logging: bool,

    voices: Vec<Voice>,
    active: HashMap<KeyId, usize>,

    // Latest timestamp seen
    clock: f64,
    next_age: u64,

    sink: S,
    // (finish time, key, slot) of voices that finished during one advance
    finished: Vec<(f64, KeyId, usize)>,
}

impl VoiceManager {
    /// Manager that collects its events in a `Vec`.
    pub fn new(config: SynthConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, Vec::new())
    }

    /// Like [`VoiceManager::new`] but resolving pitches through `source`
    /// instead of the configured key layout.
    pub fn with_pitch_source(
        config: SynthConfig,
        source: impl PitchSource + 'static,
    ) -> Result<Self, ConfigError> {
        Self::with_parts(config, Box::new(source), Vec::new())
    }

    /// Take every event emitted so far.
    pub fn drain_events(&mut self) -> Vec<VoiceEvent> {
        std::mem::take(&mut self.sink)
    }
}

impl<S: VoiceEventSink> VoiceManager<S> {
    pub fn with_sink(config: SynthConfig, sink: S) -> Result<Self, ConfigError> {
        let table = config.pitch_table();
        Self::with_parts(config, Box::new(table), sink)
    }

    pub fn with_parts(
        config: SynthConfig,
        pitch: Box<dyn PitchSource>,
        sink: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let voices = (0..config.max_voices)
            .map(|_| Voice::new(config.waveform))
            .collect();

        debug!(
            max_voices = config.max_voices,
            retrigger = ?config.retrigger,
            waveform = ?config.waveform,
            "Voice manager ready"
        );

        Ok(Self {
            params: config.envelope,
            pitch,
            pedal: SustainPedal::new(),
            retrigger: config.retrigger,
            output_gain: config.output_gain,
            logging: true,
            voices,
            active: HashMap::with_capacity(config.max_voices),
            clock: 0.0,
            next_age: 0,
            sink,
            finished: Vec::with_capacity(config.max_voices),
        })
    }

    /// Turn the manager's own tracing on or off. Rejected actions are still
    /// returned by the `try_*` methods; the `on_*` methods log them anyway.
    pub fn set_logging(&mut self, enabled: bool) {
        self.logging = enabled;
    }

    /// Key pressed. Dropped actions are logged, never returned.
    pub fn on_key_down(&mut self, key: KeyId, timestamp: f64) {
        if let Err(err) = self.try_key_down(key, timestamp) {
            err.log();
        }
    }

    /// Key released. Dropped actions are logged, never returned.
    pub fn on_key_up(&mut self, key: KeyId, timestamp: f64) {
        if let Err(err) = self.try_key_up(key, timestamp) {
            err.log();
        }
    }

    pub fn try_key_down(&mut self, key: KeyId, timestamp: f64) -> Result<(), VoiceError> {
        let t = self.observe(timestamp);
        self.advance_voices(t);

        let existing = self.active.get(&key).copied();
        if let Some(idx) = existing {
            if self.voices[idx].is_held() || self.retrigger == RetriggerPolicy::Ignore {
                return Err(VoiceError::DuplicatePress(key));
            }
        }

        let hz = self
            .pitch
            .frequency_of(key)
            .ok_or(VoiceError::UnknownKey(key))?;
        let frequency = Frequency::new(hz).ok_or(VoiceError::InvalidFrequency { key, hz })?;

        if let Some(idx) = existing {
            if self.logging {
                debug!(%key, "Retriggering releasing voice");
            }
            self.finish_now(idx, t);
        }

        let idx = self.allocate(t)?;
        let age = self.next_age;
        self.next_age += 1;

        let voice = &mut self.voices[idx];
        voice.restart(key, frequency, t, &self.params, age);
        // zero attack and decay start in sustain
        voice.advance(t);
        self.active.insert(key, idx);

        if self.logging {
            debug!(%key, hz, slot = idx, "Note on");
        }
        self.sink.emit(VoiceEvent::NoteOn {
            key,
            frequency,
            timestamp: t,
        });
        Ok(())
    }

    pub fn try_key_up(&mut self, key: KeyId, timestamp: f64) -> Result<(), VoiceError> {
        let t = self.observe(timestamp);
        self.advance_voices(t);

        let idx = *self
            .active
            .get(&key)
            .ok_or(VoiceError::ReleaseOfUnknownVoice(key))?;
        if self.voices[idx].is_releasing() {
            return Err(VoiceError::AlreadyReleasing(key));
        }

        self.release_slot(idx, t);
        Ok(())
    }

    /// Sustain pedal pressed or lifted. Only releases that start later are
    /// affected.
    pub fn on_pedal_change(&mut self, engaged: bool, timestamp: f64) {
        let t = self.observe(timestamp);
        self.advance_voices(t);

        if self.pedal.set(engaged) && self.logging {
            debug!(engaged, timestamp = t, "Sustain pedal changed");
        }
    }

    /// Release every held voice at `timestamp`.
    pub fn release_all(&mut self, timestamp: f64) {
        let t = self.observe(timestamp);
        self.advance_voices(t);

        for idx in 0..self.voices.len() {
            if self.voices[idx].is_held() {
                self.release_slot(idx, t);
            }
        }
    }

    pub fn handle(&mut self, event: InputEvent) {
        if let Err(err) = self.try_handle(event) {
            err.log();
        }
    }

    pub fn try_handle(&mut self, event: InputEvent) -> Result<(), VoiceError> {
        match event {
            InputEvent::KeyDown { key, timestamp } => self.try_key_down(key, timestamp),
            InputEvent::KeyUp { key, timestamp } => self.try_key_up(key, timestamp),
            InputEvent::PedalChange { engaged, timestamp } => {
                self.on_pedal_change(engaged, timestamp);
                Ok(())
            }
        }
    }

    /// Perform every phase transition due at or before `now` and evict
    /// finished voices.
    pub fn tick(&mut self, now: f64) {
        let now = self.observe(now);
        self.advance_voices(now);
    }

    /// Mix every live voice into `out` for a block starting at `ctx.time`.
    ///
    /// Does not advance phases; call [`VoiceManager::tick`] with the block
    /// end afterwards.
    pub fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        out.fill(0.0);
        for voice in self.voices.iter_mut().filter(|v| v.is_live()) {
            voice.render(out, ctx, self.output_gain);
        }
        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Number of sounding voices, held or releasing.
    pub fn voice_count(&self) -> usize {
        self.active.len()
    }

    pub fn max_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn phase_of(&self, key: KeyId) -> Option<VoicePhase> {
        self.voice(key).map(Voice::phase)
    }

    pub fn voice(&self, key: KeyId) -> Option<&Voice> {
        self.active.get(&key).map(|&idx| &self.voices[idx])
    }

    /// Every sounding voice, in slot order.
    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter().filter(|v| v.is_live())
    }

    pub fn pedal_engaged(&self) -> bool {
        self.pedal.is_engaged()
    }

    /// Latest timestamp the manager has seen.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn observe(&mut self, timestamp: f64) -> f64 {
        if !timestamp.is_finite() {
            if self.logging {
                warn!(timestamp, clock = self.clock, "Non-finite timestamp, using clock");
            }
            return self.clock;
        }
        if timestamp < self.clock {
            if self.logging {
                debug!(timestamp, clock = self.clock, "Timestamp behind clock, clamping");
            }
            return self.clock;
        }
        self.clock = timestamp;
        timestamp
    }

    fn advance_voices(&mut self, now: f64) {
        for (idx, voice) in self.voices.iter_mut().enumerate() {
            if !voice.is_live() {
                continue;
            }
            if let Some(finish) = voice.advance(now) {
                self.finished.push((finish, voice.key(), idx));
            }
        }
        if self.finished.is_empty() {
            return;
        }

        self.finished.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (timestamp, key, idx) in self.finished.drain(..) {
            if self.active.get(&key) == Some(&idx) {
                self.active.remove(&key);
            }
            self.sink.emit(VoiceEvent::VoiceFinished { key, timestamp });
        }
    }

    fn release_slot(&mut self, idx: usize, t: f64) {
        let duration = self.pedal.release_time(&self.params);
        let voice = &mut self.voices[idx];
        let key = voice.key();
        let level = voice.release(t, duration);

        if self.logging {
            debug!(%key, level, duration, "Note off");
        }
        self.sink.emit(VoiceEvent::NoteOff { key, timestamp: t });
    }

    /// Finish the voice in `idx` at `t` and free its key.
    fn finish_now(&mut self, idx: usize, t: f64) {
        let voice = &mut self.voices[idx];
        let key = voice.key();
        voice.force_finish(t);
        if self.active.get(&key) == Some(&idx) {
            self.active.remove(&key);
        }
        self.sink.emit(VoiceEvent::VoiceFinished { key, timestamp: t });
    }

    fn allocate(&mut self, t: f64) -> Result<usize, VoiceError> {
        if let Some(idx) = self.voices.iter().position(|v| !v.is_live()) {
            return Ok(idx);
        }

        // Steal the oldest releasing voice
        let steal = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_releasing())
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx);

        match steal {
            Some(idx) => {
                if self.logging {
                    debug!(
                        key = %self.voices[idx].key(),
                        max_voices = self.voices.len(),
                        "Voice limit reached, stealing oldest releasing voice"
                    );
                }
                self.finish_now(idx, t);
                Ok(idx)
            }
            None => Err(VoiceError::VoicesExhausted {
                max_voices: self.voices.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyId {
        KeyId::new(c)
    }

    fn manager(config: SynthConfig) -> VoiceManager {
        VoiceManager::new(config).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let result = VoiceManager::new(SynthConfig::new().max_voices(0));
        assert!(matches!(result, Err(ConfigError::NoVoices)));
    }

    #[test]
    fn key_down_emits_note_on_with_full_precision_pitch() {
        let mut synth = manager(SynthConfig::default());
        synth.try_key_down(key('P'), 0.0).unwrap();

        let events = synth.drain_events();
        assert_eq!(events.len(), 1);
        let VoiceEvent::NoteOn { frequency, .. } = events[0] else {
            panic!("expected NoteOn, got {:?}", events[0]);
        };
        assert_eq!(frequency.rounded(), 440.01);
        assert!((frequency.hz() - 440.007_458).abs() < 1e-6);
    }

    #[test]
    fn stale_timestamps_are_clamped_to_clock() {
        let mut synth = manager(SynthConfig::default());
        synth.tick(2.0);
        synth.on_key_down(key('Q'), 1.0);

        assert_eq!(synth.clock(), 2.0);
        assert_eq!(synth.voice(key('Q')).map(Voice::start_time), Some(2.0));
    }

    #[test]
    fn non_finite_timestamp_uses_clock() {
        let mut synth = manager(SynthConfig::default());
        synth.tick(1.0);
        synth.on_key_down(key('Q'), f64::NAN);
        synth.on_key_up(key('Q'), f64::INFINITY);

        assert_eq!(synth.clock(), 1.0);
        let voice = synth.voice(key('Q')).unwrap();
        assert_eq!(voice.start_time(), 1.0);
        assert_eq!(voice.release_start_time(), Some(1.0));
    }

    #[test]
    fn zero_attack_and_decay_start_in_sustain() {
        let mut synth = manager(SynthConfig::new().attack_time(0.0).decay_time(0.0));
        synth.on_key_down(key('Q'), 0.0);
        assert_eq!(synth.phase_of(key('Q')), Some(VoicePhase::Sustain));
    }

    #[test]
    fn second_key_up_is_already_releasing() {
        let mut synth = manager(SynthConfig::default());
        synth.on_key_down(key('Q'), 0.0);
        synth.try_key_up(key('Q'), 1.0).unwrap();

        assert_eq!(
            synth.try_key_up(key('Q'), 1.01),
            Err(VoiceError::AlreadyReleasing(key('Q')))
        );
        assert_eq!(
            synth.try_key_up(key('W'), 1.01),
            Err(VoiceError::ReleaseOfUnknownVoice(key('W')))
        );
    }

    #[test]
    fn invalid_frequency_is_rejected() {
        let source = |k: KeyId| match k.as_char() {
            'N' => Some(f64::NAN),
            'Z' => Some(0.0),
            _ => Some(440.0),
        };
        let mut synth = VoiceManager::with_pitch_source(SynthConfig::default(), source).unwrap();

        assert!(matches!(
            synth.try_key_down(key('N'), 0.0),
            Err(VoiceError::InvalidFrequency { .. })
        ));
        assert_eq!(
            synth.try_key_down(key('Z'), 0.0),
            Err(VoiceError::InvalidFrequency { key: key('Z'), hz: 0.0 })
        );
        assert_eq!(synth.voice_count(), 0);
        assert!(synth.drain_events().is_empty());
    }

    #[test]
    fn release_all_releases_only_held_voices() {
        let mut synth = manager(SynthConfig::default());
        synth.on_key_down(key('Q'), 0.0);
        synth.on_key_down(key('W'), 0.0);
        synth.on_key_up(key('Q'), 0.5);
        synth.drain_events();

        synth.release_all(1.0);
        let events = synth.drain_events();
        assert_eq!(events, vec![VoiceEvent::NoteOff { key: key('W'), timestamp: 1.0 }]);
        assert!(synth.voices().all(Voice::is_releasing));
    }

    #[test]
    fn finished_events_are_ordered_by_finish_time() {
        let mut synth = manager(SynthConfig::default());
        synth.on_key_down(key('Q'), 0.0);
        synth.on_key_down(key('W'), 0.0);
        synth.on_pedal_change(true, 0.5);
        synth.on_key_up(key('Q'), 1.0); // finishes at 2.5
        synth.on_pedal_change(false, 1.1);
        synth.on_key_up(key('W'), 1.2); // finishes at 1.25
        synth.drain_events();

        synth.tick(10.0);
        let finished: Vec<KeyId> = synth.drain_events().iter().map(|e| e.key()).collect();
        assert_eq!(finished, vec![key('W'), key('Q')]);
        assert_eq!(synth.voice_count(), 0);
    }

    #[test]
    fn try_handle_returns_rejections() {
        let mut synth = manager(SynthConfig::default());
        synth.set_logging(false);

        let down = |timestamp| InputEvent::KeyDown { key: key('Q'), timestamp };
        assert_eq!(synth.try_handle(down(0.0)), Ok(()));
        assert_eq!(
            synth.try_handle(down(0.1)),
            Err(VoiceError::DuplicatePress(key('Q')))
        );
        assert_eq!(
            synth.try_handle(InputEvent::PedalChange { engaged: true, timestamp: 0.2 }),
            Ok(())
        );
        assert!(synth.pedal_engaged());
        assert_eq!(synth.sink().len(), 1);
    }

    #[test]
    fn discarding_sink() {
        let mut synth = VoiceManager::with_sink(SynthConfig::default(), ()).unwrap();
        synth.on_key_down(key('Q'), 0.0);
        assert_eq!(synth.voice_count(), 1);
    }

    #[test]
    fn render_is_silent_without_voices() {
        let mut synth = manager(SynthConfig::default());
        let mut block = [1.0f32; 128];
        synth.render_block(&mut block, &RenderCtx::new(48_000.0, 0.0));
        assert!(block.iter().all(|&s| s == 0.0));
    }
}
