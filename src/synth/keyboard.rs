use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::warn;

use crate::{
    config::{ConfigError, SynthConfig},
    dsp::{context::RenderCtx, pitch::KeyId},
    synth::{
        error::VoiceError,
        manager::VoiceManager,
        message::{CountingProducer, KeyboardMessage, MessageReceiver, VoiceEvent},
    },
};

/// Capacity of both queues between the input and audio threads.
pub const QUEUE_CAPACITY: usize = 256;

/// Build the realtime pair: a synth for the audio callback, a handle for the
/// input thread, and the consumer for the synth's note events.
///
/// The audio side never logs. Actions it rejects travel back to the handle,
/// which logs them with [`KeyboardHandle::log_rejected`].
///
/// ```
/// use saavy_keys::{keyboard_synth, KeyId, SynthConfig, VoiceEvent};
///
/// let (mut synth, mut keys, mut events) = keyboard_synth(SynthConfig::default()).unwrap();
/// keys.key_down(KeyId::new('Q'));
///
/// let mut block = [0.0f32; 256];
/// synth.render_block(&mut block);
/// assert!(matches!(events.pop(), Ok(VoiceEvent::NoteOn { .. })));
/// ```
pub fn keyboard_synth(
    config: SynthConfig,
) -> Result<(KeyboardSynth, KeyboardHandle, Consumer<VoiceEvent>), ConfigError> {
    let (msg_tx, msg_rx) = RingBuffer::new(QUEUE_CAPACITY);
    let (event_tx, event_rx) = RingBuffer::new(QUEUE_CAPACITY);
    let (reject_tx, reject_rx) = RingBuffer::new(QUEUE_CAPACITY);

    let sample_rate = config.sample_rate;
    let event_tx = CountingProducer::new(event_tx);
    let reject_tx = CountingProducer::new(reject_tx);

    let handle = KeyboardHandle {
        tx: msg_tx,
        rejected: reject_rx,
        dropped_events: event_tx.drop_counter(),
        dropped_rejections: reject_tx.drop_counter(),
    };

    let mut manager = VoiceManager::with_sink(config, event_tx)?;
    manager.set_logging(false);

    let synth = KeyboardSynth {
        manager,
        rx: msg_rx,
        rejected: reject_tx,
        sample_rate,
        frame_counter: 0,
    };
    Ok((synth, handle, event_rx))
}

/// Audio-thread side. Owns the voice manager; queued messages take effect
/// at the start of the next block, stamped with stream time.
pub struct KeyboardSynth<R: MessageReceiver = Consumer<KeyboardMessage>> {
    manager: VoiceManager<CountingProducer<VoiceEvent>>,
    rx: R,
    rejected: CountingProducer<VoiceError>,
    sample_rate: f32,
    frame_counter: u64,
}

impl<R: MessageReceiver> KeyboardSynth<R> {
    pub fn render_block(&mut self, out: &mut [f32]) {
        let now = self.time();

        // Process control messages
        while let Some(msg) = self.rx.pop() {
            let result = match msg.at(now) {
                Some(event) => self.manager.try_handle(event),
                None => {
                    self.manager.release_all(now);
                    Ok(())
                }
            };
            if let Err(err) = result {
                self.rejected.push(err);
            }
        }

        let ctx = RenderCtx::new(self.sample_rate, now);
        self.manager.render_block(out, &ctx);

        self.frame_counter += out.len() as u64;
        self.manager.tick(ctx.block_end(out.len()));
    }

    /// Stream time of the next block, in seconds.
    pub fn time(&self) -> f64 {
        self.frame_counter as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn manager(&self) -> &VoiceManager<CountingProducer<VoiceEvent>> {
        &self.manager
    }

    /// Note events lost to a full event queue.
    pub fn dropped_events(&self) -> u64 {
        self.manager.sink().dropped()
    }
}

/// Input-thread side. Never blocks; a full queue drops the message.
pub struct KeyboardHandle {
    tx: Producer<KeyboardMessage>,
    rejected: Consumer<VoiceError>,
    dropped_events: Arc<AtomicU64>,
    dropped_rejections: Arc<AtomicU64>,
}

impl KeyboardHandle {
    /// Returns false when the message was dropped.
    pub fn send(&mut self, msg: KeyboardMessage) -> bool {
        match self.tx.push(msg) {
            Ok(()) => true,
            Err(_) => {
                warn!(?msg, "Keyboard queue full, dropping message");
                false
            }
        }
    }

    pub fn key_down(&mut self, key: KeyId) -> bool {
        self.send(KeyboardMessage::KeyDown(key))
    }

    pub fn key_up(&mut self, key: KeyId) -> bool {
        self.send(KeyboardMessage::KeyUp(key))
    }

    pub fn pedal(&mut self, engaged: bool) -> bool {
        self.send(KeyboardMessage::Pedal(engaged))
    }

    pub fn all_notes_off(&mut self) -> bool {
        self.send(KeyboardMessage::AllNotesOff)
    }

    /// Log every action the audio thread rejected since the last call.
    /// Returns how many were logged.
    pub fn log_rejected(&mut self) -> usize {
        let mut count = 0;
        while let Ok(err) = self.rejected.pop() {
            err.log();
            count += 1;
        }
        count
    }

    /// Note events the audio thread could not queue. Once this moves, the
    /// event stream is missing transitions.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Rejections the audio thread could not report.
    pub fn dropped_rejections(&self) -> u64 {
        self.dropped_rejections.load(Ordering::Relaxed)
    }
}
