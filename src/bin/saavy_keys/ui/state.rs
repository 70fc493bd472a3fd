//! What the UI knows about the synth, rebuilt from its note events

use std::collections::{HashMap, VecDeque};

use saavy_keys::{Frequency, KeyId, PitchTable, VoiceEvent};

/// Notes kept in the history panel
const HISTORY_LEN: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyStatus {
    #[default]
    Idle,
    Held,
    Releasing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayedNote {
    pub key: KeyId,
    pub frequency: Frequency,
    pub timestamp: f64,
}

pub struct KeyboardState {
    /// Layout keys with their pitch, lowest first
    pub keys: Vec<(KeyId, f64)>,
    status: HashMap<KeyId, KeyStatus>,
    /// Most recent first
    history: VecDeque<PlayedNote>,
    /// Pedal state as last sent to the synth
    pub pedal: bool,
    /// Stream time of the latest event
    pub last_event_time: f64,
}

impl KeyboardState {
    pub fn new(layout: &PitchTable) -> Self {
        Self {
            keys: layout.frequencies().collect(),
            status: HashMap::new(),
            history: VecDeque::with_capacity(HISTORY_LEN),
            pedal: false,
            last_event_time: 0.0,
        }
    }

    pub fn apply(&mut self, event: VoiceEvent) {
        self.last_event_time = event.timestamp();
        match event {
            VoiceEvent::NoteOn {
                key,
                frequency,
                timestamp,
            } => {
                self.status.insert(key, KeyStatus::Held);
                if self.history.len() == HISTORY_LEN {
                    self.history.pop_back();
                }
                self.history.push_front(PlayedNote {
                    key,
                    frequency,
                    timestamp,
                });
            }
            VoiceEvent::NoteOff { key, .. } => {
                self.status.insert(key, KeyStatus::Releasing);
            }
            VoiceEvent::VoiceFinished { key, .. } => {
                self.status.remove(&key);
            }
        }
    }

    /// Forget which keys are sounding, e.g. after note events were lost.
    pub fn reset_voices(&mut self) {
        self.status.clear();
    }

    pub fn status(&self, key: KeyId) -> KeyStatus {
        self.status.get(&key).copied().unwrap_or_default()
    }

    /// Voices still sounding, held or releasing.
    pub fn sounding(&self) -> usize {
        self.status.len()
    }

    pub fn history(&self) -> impl Iterator<Item = &PlayedNote> {
        self.history.iter()
    }
}
