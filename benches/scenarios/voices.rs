//! Benchmarks for rendering held and releasing voices.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_keys::{KeyId, RenderCtx, SynthConfig, VoiceManager};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

fn held(keys: &str) -> VoiceManager<()> {
    let mut synth = VoiceManager::with_sink(SynthConfig::default(), ()).expect("default config");
    for key in keys.chars() {
        synth.on_key_down(KeyId::new(key), 0.0);
    }
    synth
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let ctx = RenderCtx::new(SAMPLE_RATE, 1.0); // past attack and decay

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === SINGLE NOTE ===
        let mut single = held("Q");
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| single.render_block(black_box(&mut buffer), black_box(&ctx)))
        });

        // === TRIAD ===
        let mut triad = held("QRU");
        group.bench_with_input(BenchmarkId::new("triad", size), &size, |b, _| {
            b.iter(|| triad.render_block(black_box(&mut buffer), black_box(&ctx)))
        });

        // === FULL LAYOUT HELD ===
        // every key down, 26 voices
        let mut full = held("QWERTYUIOPASDFGHJKLZXCVBNM");
        group.bench_with_input(BenchmarkId::new("full_layout", size), &size, |b, _| {
            b.iter(|| full.render_block(black_box(&mut buffer), black_box(&ctx)))
        });

        // === PEDAL TAIL ===
        // chord released with the pedal down, long release ramps
        let mut tail = held("QRUP");
        tail.on_pedal_change(true, 0.5);
        tail.release_all(0.5);
        group.bench_with_input(BenchmarkId::new("pedal_tail", size), &size, |b, _| {
            b.iter(|| tail.render_block(black_box(&mut buffer), black_box(&ctx)))
        });
    }

    group.finish();
}
