//! Hi-hat voice (closed).
//!
//! A tight burst of noise and two high sine partials, all through one
//! band-pass. The inharmonic pair gives the metallic shimmer.
//!
//! # How It Works
//!
//! 1. White noise rises to 0.5 in 1 ms, falls exponentially over `duration_ms`
//! 2. Sines at `freq1` and `freq2` follow the same shape at 0.3
//! 3. Everything passes a band-pass at `filter_freq`
//! 4. The voice stops after `duration_ms + release_ms`

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::automation::Automation;
use crate::dsp::filter::SVFilter;
use crate::dsp::oscillator::{Noise, OscillatorBlock};
use crate::graph::node::{GraphNode, RenderCtx};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HiHatParams {
    pub freq1: f32,
    pub freq2: f32,
    pub duration_ms: f32,
    pub release_ms: f32,
    pub filter_freq: f32,
    pub filter_q: f32,
    pub volume: f32,
}

impl Default for HiHatParams {
    fn default() -> Self {
        HIHAT_PRESETS[0].1
    }
}

pub const HIHAT_PRESETS: [(&str, HiHatParams); 5] = [
    (
        "Quantum Spark",
        HiHatParams {
            freq1: 8_000.0,
            freq2: 10_000.0,
            duration_ms: 60.0,
            release_ms: 30.0,
            filter_freq: 5_000.0,
            filter_q: 1.0,
            volume: 0.5,
        },
    ),
    (
        "Photon Beam",
        HiHatParams {
            freq1: 7_200.0,
            freq2: 11_200.0,
            duration_ms: 91.0,
            release_ms: 30.0,
            filter_freq: 5_700.0,
            filter_q: 1.0,
            volume: 0.5,
        },
    ),
    (
        "Shadow Pulse",
        HiHatParams {
            freq1: 6_100.0,
            freq2: 8_700.0,
            duration_ms: 43.0,
            release_ms: 30.0,
            filter_freq: 6_300.0,
            filter_q: 1.0,
            volume: 0.5,
        },
    ),
    (
        "Time Ripple",
        HiHatParams {
            freq1: 11_500.0,
            freq2: 14_600.0,
            duration_ms: 119.0,
            release_ms: 90.0,
            filter_freq: 3_600.0,
            filter_q: 1.0,
            volume: 0.5,
        },
    ),
    (
        "Space Dust",
        HiHatParams {
            freq1: 11_900.0,
            freq2: 14_200.0,
            duration_ms: 88.0,
            release_ms: 20.0,
            filter_freq: 3_100.0,
            filter_q: 1.0,
            volume: 0.5,
        },
    ),
];

pub struct HiHat {
    params: HiHatParams,
    noise: Noise,
    partial_a: OscillatorBlock,
    partial_b: OscillatorBlock,
    noise_gain: Automation,
    partial_gain: Automation,
    filter: SVFilter,
    length_s: f32,
    elapsed: u64,
    active: bool,
}

impl HiHat {
    pub fn new(params: HiHatParams, seed: u64) -> Self {
        let duration = params.duration_ms / 1000.0;

        Self {
            params,
            noise: Noise::new(seed),
            partial_a: OscillatorBlock::sine(),
            partial_b: OscillatorBlock::sine(),
            noise_gain: Automation::starting_at(0.0)
                .linear_to(0.5, 0.001)
                .exponential_to(0.001, duration),
            partial_gain: Automation::starting_at(0.0)
                .linear_to(0.3, 0.001)
                .exponential_to(0.001, duration),
            filter: SVFilter::bandpass(params.filter_freq).with_q(params.filter_q),
            length_s: duration + params.release_ms / 1000.0,
            elapsed: 0,
            active: false,
        }
    }
}

impl GraphNode for HiHat {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let sample_rate = ctx.sample_rate;
        let coefficients = self.filter.coefficients(sample_rate);

        for sample in out.iter_mut() {
            let t = self.elapsed as f32 / sample_rate;
            if !self.active || t >= self.length_s {
                self.active = false;
                *sample = 0.0;
                continue;
            }

            let noise = self.noise.next_sample() * self.noise_gain.value_at(t);
            let partials = (self.partial_a.next_sample(self.params.freq1, sample_rate)
                + self.partial_b.next_sample(self.params.freq2, sample_rate))
                * self.partial_gain.value_at(t);

            *sample = self.filter.process(noise + partials, coefficients) * self.params.volume;
            self.elapsed += 1;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.partial_a.reset();
        self.partial_b.reset();
        self.filter.reset();
        self.elapsed = 0;
        self.active = true;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
