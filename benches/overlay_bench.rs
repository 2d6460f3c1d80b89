//! Performance benchmarks for overlay rendering

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use clicktrack::detection::EventSet;
use clicktrack::overlay::OverlayRenderer;
use clicktrack::audio::AudioBuffer;

fn bench_render_beats(c: &mut Criterion) {
    // Generate synthetic stereo audio (30 seconds at 44.1kHz)
    let samples: Vec<f32> = (0..44100 * 30 * 2)
        .map(|i| ((i / 2) as f32 * 440.0 * 2.0 * std::f32::consts::PI / 44100.0).sin() * 0.5)
        .collect();
    let source = AudioBuffer::new(samples, 2, 44100).unwrap();

    let beats = EventSet::from_tagged((0..60).map(|i| (i as f64 * 0.5, i % 4 == 0)).collect());
    let downbeats = beats.tagged_subset();
    let renderer = OverlayRenderer::default();

    c.bench_function("render_beats_30s_stereo", |b| {
        b.iter(|| {
            let _ = renderer.render_beats(black_box(&source), black_box(&beats), black_box(&downbeats));
        });
    });
}

fn bench_render_onsets(c: &mut Criterion) {
    let source = AudioBuffer::silent(44100 * 30, 1, 44100).unwrap();
    let onsets = EventSet::from_times((0..300).map(|i| i as f64 * 0.1).collect());
    let renderer = OverlayRenderer::default();

    c.bench_function("render_onsets_30s_mono", |b| {
        b.iter(|| {
            let _ = renderer.render_onsets(black_box(&source), black_box(&onsets));
        });
    });
}

criterion_group!(benches, bench_render_beats, bench_render_onsets);
criterion_main!(benches);
