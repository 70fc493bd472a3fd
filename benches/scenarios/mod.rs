//! Real-world scenario benchmarks.
//!
//! Chords held through the voice manager, and the cost of key events.

mod events;
mod voices;

pub use events::bench_events;
pub use voices::bench_voices;
