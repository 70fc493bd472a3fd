//! Benchmarks for the gain schedule lookup.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_keys::dsp::envelope::{Envelope, EnvelopeParams};

use crate::BLOCK_SIZES;

const DT: f64 = 1.0 / 48_000.0;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let params = EnvelopeParams::default();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut env = Envelope::new();
        env.start(&params, 0.0);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer), black_box(0.0), DT))
        });

        // Sustain phase (past the last point)
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer), black_box(1.0), DT))
        });

        // Release during decay
        let mut env = Envelope::new();
        env.start(&params, 0.0);
        env.release(0.1, params.sustain_pedal_release_time);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer), black_box(0.5), DT))
        });

        // Restart + release, as done on every note
        let mut env = Envelope::new();
        group.bench_with_input(BenchmarkId::new("restart", size), &size, |b, _| {
            b.iter(|| {
                env.start(black_box(&params), 0.0);
                black_box(env.release(0.05, params.fast_release_time))
            })
        });
    }

    group.finish();
}
