//! Benchmarks for slice playback and the full remix engine.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_remix::engine::slice::SliceVoice;
use saavy_remix::io::{AudioOutput, SourceBuffer};
use saavy_remix::sequencing::Preset;
use saavy_remix::RemixEngine;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: u32 = 48_000;

/// Ten seconds of a stereo test tone.
fn test_source() -> SourceBuffer {
    let frames = SAMPLE_RATE as usize * 10;
    let left: Vec<f32> = (0..frames)
        .map(|i| (i as f32 * 220.0 * std::f32::consts::TAU / SAMPLE_RATE as f32).sin())
        .collect();
    let right: Vec<f32> = left.iter().map(|s| s * 0.5).collect();
    SourceBuffer::new(vec![left, right], SAMPLE_RATE).expect("equal-length channels")
}

pub fn bench_remix(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/remix");
    let source = test_source();

    for &size in BLOCK_SIZES {
        // === OVERLAPPING SLICES ===
        // Four long slices summed into a stereo bus, as during a release tail
        let mut bus = vec![vec![0.0f32; size]; 2];
        let mut slices: Vec<SliceVoice> = (0..4)
            .map(|i| SliceVoice::new(source.clone(), i * 48_000, 8_000.0, 5.0, 500.0))
            .collect();
        group.bench_with_input(BenchmarkId::new("slices_x4", size), &size, |b, _| {
            b.iter(|| {
                for channel in bus.iter_mut() {
                    channel.fill(0.0);
                }
                for slice in slices.iter_mut() {
                    slice.render_into(black_box(&mut bus), 0..size, SAMPLE_RATE as f32);
                }
            })
        });

        // === FULL ENGINE ===
        // Background loop, remix layer at half mix, fast note values so the
        // scheduler dispatches inside most blocks
        let mut engine = RemixEngine::builder()
            .bpm(174)
            .preset(Preset::Chop)
            .release_ms(80.0)
            .mix_fader(0.5)
            .sample_rate(SAMPLE_RATE)
            .seed(7)
            .build();
        let mut output = AudioOutput::new(2, size);
        engine.load_source(source.clone()).expect("load source");
        assert!(engine.start_remix().expect("start remix"));

        group.bench_with_input(BenchmarkId::new("engine_block", size), &size, |b, _| {
            b.iter(|| {
                engine.process_block(black_box(&mut output));
                if !engine.is_remixing() {
                    let _ = engine.start_remix();
                }
            })
        });
    }

    group.finish();
}
