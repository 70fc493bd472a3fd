// Purpose: Voice scheduling, sustain pedal, polyphony
// This layer turns key and pedal events into enveloped voices

pub mod error;
#[cfg(feature = "rtrb")]
pub mod keyboard;
pub mod manager;
pub mod message;
pub mod sustain;
pub mod voice;
