//! Benchmarks for the envelope, oscillator and voice scheduling.
//!
//! Run with: cargo bench
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Envelope schedule and oscillator
//!   - scenarios/*  Whole-manager rendering and event handling

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    dsp::bench_envelope,
    dsp::bench_oscillator,
    scenarios::bench_voices,
    scenarios::bench_events,
);
criterion_main!(benches);
