//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_remix::dsp::oscillator::{Noise, OscillatorBlock};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine - uses sin() transcendental function
        let mut osc = OscillatorBlock::sine();
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });

        // Square - branch per sample
        let mut osc = OscillatorBlock::square();
        group.bench_with_input(BenchmarkId::new("square", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });

        // Triangle - absolute value
        let mut osc = OscillatorBlock::triangle();
        group.bench_with_input(BenchmarkId::new("triangle", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });

        // Noise - xorshift PRNG
        let mut noise = Noise::new(0x5eed);
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| {
                noise.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
