//! Benchmarks for the percussion voices.
//!
//! Each voice is triggered once and rendered block after block; a voice that
//! has finished is retriggered so the measurement stays on the sounding path.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_remix::graph::node::{GraphNode, RenderCtx};
use saavy_remix::voices::{DrumKind, DrumPatch};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let ctx = RenderCtx::new(48_000.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for kind in DrumKind::ALL {
            let mut voice = DrumPatch::new(kind).voice(42);
            voice.note_on(&ctx);

            group.bench_with_input(BenchmarkId::new(kind.name(), size), &size, |b, _| {
                b.iter(|| {
                    if !voice.is_active() {
                        voice.note_on(&ctx);
                    }
                    voice.render_block(black_box(&mut buffer), black_box(&ctx));
                })
            });
        }
    }

    group.finish();
}
