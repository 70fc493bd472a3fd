//! Benchmarks for key event handling.

use std::hint::black_box;

use criterion::Criterion;
use saavy_keys::{KeyId, SynthConfig, VoiceManager};

pub fn bench_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/events");

    // Press and release one key, then let the voice finish
    let mut synth = VoiceManager::with_sink(SynthConfig::default(), ()).expect("default config");
    let key = KeyId::new('P');
    let mut t = 0.0;
    group.bench_function("note_cycle", |b| {
        b.iter(|| {
            synth.on_key_down(black_box(key), t);
            synth.on_key_up(black_box(key), t + 0.1);
            t += 1.0;
            synth.tick(t);
        })
    });

    // Pool full of releasing voices, every press steals one
    let config = SynthConfig::default().max_voices(8).sustain_pedal_release_time(1e6);
    let mut synth = VoiceManager::with_sink(config, ()).expect("valid config");
    synth.on_pedal_change(true, 0.0);
    let layout: Vec<KeyId> = "QWERTYUIOPASDFGHJKLZXCVBNM".chars().map(KeyId::new).collect();
    let mut t = 0.0;
    let mut n = 0;
    group.bench_function("steal", |b| {
        b.iter(|| {
            let key = layout[n % layout.len()];
            synth.on_key_down(black_box(key), t);
            synth.on_key_up(black_box(key), t);
            n += 1;
            t += 0.001;
        })
    });

    group.finish();
}
