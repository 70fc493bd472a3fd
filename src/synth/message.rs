#[cfg(feature = "rtrb")]
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::pitch::{Frequency, KeyId};

/// Time-stamped input delivered by the key capture layer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { key: KeyId, timestamp: f64 },
    KeyUp { key: KeyId, timestamp: f64 },
    PedalChange { engaged: bool, timestamp: f64 },
}

impl InputEvent {
    pub fn timestamp(&self) -> f64 {
        match *self {
            InputEvent::KeyDown { timestamp, .. }
            | InputEvent::KeyUp { timestamp, .. }
            | InputEvent::PedalChange { timestamp, .. } => timestamp,
        }
    }
}

/// Observable output of the voice manager.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VoiceEvent {
    NoteOn {
        key: KeyId,
        frequency: Frequency,
        timestamp: f64,
    },
    NoteOff {
        key: KeyId,
        timestamp: f64,
    },
    VoiceFinished {
        key: KeyId,
        timestamp: f64,
    },
}

impl VoiceEvent {
    pub fn key(&self) -> KeyId {
        match *self {
            VoiceEvent::NoteOn { key, .. }
            | VoiceEvent::NoteOff { key, .. }
            | VoiceEvent::VoiceFinished { key, .. } => key,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match *self {
            VoiceEvent::NoteOn { timestamp, .. }
            | VoiceEvent::NoteOff { timestamp, .. }
            | VoiceEvent::VoiceFinished { timestamp, .. } => timestamp,
        }
    }
}

/// Where the voice manager sends its events.
pub trait VoiceEventSink {
    fn emit(&mut self, event: VoiceEvent);
}

impl VoiceEventSink for Vec<VoiceEvent> {
    fn emit(&mut self, event: VoiceEvent) {
        self.push(event);
    }
}

/// Discards every event.
impl VoiceEventSink for () {
    fn emit(&mut self, _event: VoiceEvent) {}
}

/// Realtime producer that never blocks. A full queue drops the item and
/// bumps a shared counter the consumer side can read.
#[cfg(feature = "rtrb")]
pub struct CountingProducer<T> {
    tx: Producer<T>,
    dropped: Arc<AtomicU64>,
}

#[cfg(feature = "rtrb")]
impl<T> CountingProducer<T> {
    pub fn new(tx: Producer<T>) -> Self {
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns false when the item was dropped.
    pub fn push(&mut self, item: T) -> bool {
        match self.tx.push(item) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Items dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Handle to the drop counter for another thread.
    pub fn drop_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }
}

/// Audio-thread side of the event queue.
#[cfg(feature = "rtrb")]
impl VoiceEventSink for CountingProducer<VoiceEvent> {
    fn emit(&mut self, event: VoiceEvent) {
        self.push(event);
    }
}

/// Untimed control messages queued from the input thread to the audio
/// thread. They are stamped with stream time when the audio thread drains
/// them at a block boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyboardMessage {
    KeyDown(KeyId),
    KeyUp(KeyId),
    Pedal(bool),
    AllNotesOff,
}

impl KeyboardMessage {
    /// Attach a timestamp; `AllNotesOff` has no input event counterpart.
    pub fn at(self, timestamp: f64) -> Option<InputEvent> {
        match self {
            KeyboardMessage::KeyDown(key) => Some(InputEvent::KeyDown { key, timestamp }),
            KeyboardMessage::KeyUp(key) => Some(InputEvent::KeyUp { key, timestamp }),
            KeyboardMessage::Pedal(engaged) => Some(InputEvent::PedalChange { engaged, timestamp }),
            KeyboardMessage::AllNotesOff => None,
        }
    }
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<KeyboardMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<KeyboardMessage> {
    fn pop(&mut self) -> Option<KeyboardMessage> {
        Consumer::pop(self).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_messages_take_timestamps() {
        let key = KeyId::new('A');
        assert_eq!(
            KeyboardMessage::KeyDown(key).at(1.5),
            Some(InputEvent::KeyDown { key, timestamp: 1.5 })
        );
        assert_eq!(
            KeyboardMessage::Pedal(true).at(2.0).map(|e| e.timestamp()),
            Some(2.0)
        );
        assert_eq!(KeyboardMessage::AllNotesOff.at(3.0), None);
    }

    #[test]
    fn vec_sink_collects_in_order() {
        let key = KeyId::new('Q');
        let mut sink: Vec<VoiceEvent> = Vec::new();
        sink.emit(VoiceEvent::NoteOff { key, timestamp: 1.0 });
        sink.emit(VoiceEvent::VoiceFinished { key, timestamp: 1.05 });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].key(), key);
        assert_eq!(sink[1].timestamp(), 1.05);
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn full_producer_counts_dropped_events() {
        let (tx, mut rx) = rtrb::RingBuffer::<VoiceEvent>::new(1);
        let mut tx = CountingProducer::new(tx);
        let counter = tx.drop_counter();
        let key = KeyId::new('W');

        tx.emit(VoiceEvent::NoteOff { key, timestamp: 0.0 });
        assert_eq!(tx.dropped(), 0);
        tx.emit(VoiceEvent::VoiceFinished { key, timestamp: 1.0 });
        tx.emit(VoiceEvent::VoiceFinished { key, timestamp: 2.0 });

        assert_eq!(tx.dropped(), 2);
        assert_eq!(counter.load(Ordering::Relaxed), 2);
        assert_eq!(rx.pop().ok().map(|e| e.timestamp()), Some(0.0));
        assert!(rx.pop().is_err());

        // room again once drained
        assert!(tx.push(VoiceEvent::NoteOff { key, timestamp: 3.0 }));
        assert_eq!(tx.dropped(), 2);
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn consumer_is_a_message_receiver() {
        let (mut tx, mut rx) = rtrb::RingBuffer::<KeyboardMessage>::new(4);
        tx.push(KeyboardMessage::AllNotesOff).unwrap();

        assert_eq!(MessageReceiver::pop(&mut rx), Some(KeyboardMessage::AllNotesOff));
        assert_eq!(MessageReceiver::pop(&mut rx), None);
    }
}
