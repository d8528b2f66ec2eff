//! Benchmarks for waveshaping distortion.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_remix::dsp::distortion;

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sine-like values)
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // Soft clip - smooth saturation
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("soft_clip", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = distortion::soft_clip(black_box(x), black_box(4.0));
                }
            })
        });

        // Block clip - the output stage of the mixer, peaks over the ceiling
        let hot: Vec<f32> = input.iter().map(|x| x * 2.0).collect();
        let mut buffer = hot.clone();
        group.bench_with_input(BenchmarkId::new("clip_block", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&hot);
                distortion::clip_block(black_box(&mut buffer), black_box(distortion::FULL_SCALE));
            })
        });
    }

    group.finish();
}
