//! Benchmarks for the slice envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_remix::dsp::envelope::SliceEnvelope;

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up over a long attack)
        let mut env = SliceEnvelope::new(10_000.0, 20_000.0, 500.0);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
            })
        });

        // Hold phase (flat at the ceiling)
        let mut env = SliceEnvelope::new(1.0, 60_000.0, 500.0);
        for _ in 0..200 {
            env.next_sample(SAMPLE_RATE);
        }
        group.bench_with_input(BenchmarkId::new("hold", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
            })
        });

        // Release phase (ramping down after a short slice)
        let mut env = SliceEnvelope::new(1.0, 2.0, 60_000.0);
        for _ in 0..200 {
            env.next_sample(SAMPLE_RATE);
        }
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
            })
        });
    }

    group.finish();
}
