//! Kick drum voice.
//!
//! A synthesized kick built from a sine wave with a steep exponential pitch
//! drop, plus a short burst of band-passed noise for the beater click.
//!
//! # How It Works
//!
//! 1. Sine oscillator starts at `initial_freq` and falls exponentially
//!    toward 1 Hz over `freq_decay_ms` (the "punch")
//! 2. Body gain starts at full level and decays exponentially to 0.01
//!    over `duration_ms`
//! 3. Noise through a 6 kHz band-pass, gated by a 1 ms rise and an
//!    exponential fall over `click_duration_ms`
//!
//! # Variations
//!
//! - Longer freq decay = boomy 808-style kick
//! - Higher initial freq = more attack
//! - More click = harder, more acoustic beater

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::automation::Automation;
use crate::dsp::filter::SVFilter;
use crate::dsp::oscillator::{Noise, OscillatorBlock};
use crate::graph::node::{GraphNode, RenderCtx};

/// Tail kept after the body envelope finishes.
const TAIL_S: f32 = 0.1;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KickParams {
    /// Starting pitch in Hz (20-300)
    pub initial_freq: f32,
    /// Pitch drop time in ms
    pub freq_decay_ms: f32,
    /// Body length in ms
    pub duration_ms: f32,
    /// Click loudness (0-100)
    pub click_level: f32,
    /// Click length in ms
    pub click_duration_ms: f32,
    /// Output gain (0-1)
    pub volume: f32,
}

impl Default for KickParams {
    fn default() -> Self {
        KICK_PRESETS[3].1
    }
}

pub const KICK_PRESETS: [(&str, KickParams); 4] = [
    (
        "Thunder Strike",
        KickParams {
            initial_freq: 265.0,
            freq_decay_ms: 193.0,
            duration_ms: 500.0,
            click_level: 42.0,
            click_duration_ms: 40.0,
            volume: 0.7,
        },
    ),
    (
        "Abyssal Pulse",
        KickParams {
            initial_freq: 185.0,
            freq_decay_ms: 474.0,
            duration_ms: 700.0,
            click_level: 11.0,
            click_duration_ms: 59.0,
            volume: 0.7,
        },
    ),
    (
        "Sonic Boom",
        KickParams {
            initial_freq: 218.0,
            freq_decay_ms: 324.0,
            duration_ms: 300.0,
            click_level: 36.0,
            click_duration_ms: 31.0,
            volume: 0.7,
        },
    ),
    (
        "Cosmic Impact",
        KickParams {
            initial_freq: 238.0,
            freq_decay_ms: 200.0,
            duration_ms: 500.0,
            click_level: 11.0,
            click_duration_ms: 37.0,
            volume: 0.7,
        },
    ),
];

pub struct Kick {
    volume: f32,
    body: OscillatorBlock,
    pitch: Automation,
    body_gain: Automation,
    click: Noise,
    click_filter: SVFilter,
    click_gain: Automation,
    length_s: f32,
    elapsed: u64,
    active: bool,
}

impl Kick {
    pub fn new(params: KickParams, seed: u64) -> Self {
        let freq_decay = params.freq_decay_ms / 1000.0;
        let duration = params.duration_ms / 1000.0;
        let click_duration = params.click_duration_ms / 1000.0;

        Self {
            volume: params.volume,
            body: OscillatorBlock::sine(),
            pitch: Automation::starting_at(params.initial_freq.max(1.0)).exponential_to(1.0, freq_decay),
            body_gain: Automation::starting_at(1.0)
                .linear_to(1.0, 0.005)
                .exponential_to(0.01, duration),
            click: Noise::new(seed),
            click_filter: SVFilter::bandpass(6_000.0).with_q(1.5),
            click_gain: Automation::starting_at(0.0)
                .linear_to(params.click_level / 100.0, 0.001)
                .exponential_to(0.001, click_duration),
            length_s: duration + TAIL_S,
            elapsed: 0,
            active: false,
        }
    }
}

impl GraphNode for Kick {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let sample_rate = ctx.sample_rate;
        let coefficients = self.click_filter.coefficients(sample_rate);

        for sample in out.iter_mut() {
            let t = self.elapsed as f32 / sample_rate;
            if !self.active || t >= self.length_s {
                self.active = false;
                *sample = 0.0;
                continue;
            }

            let body = self.body.next_sample(self.pitch.value_at(t), sample_rate) * self.body_gain.value_at(t);
            let click = self.click_filter.process(self.click.next_sample(), coefficients) * self.click_gain.value_at(t);

            *sample = (body + click) * self.volume;
            self.elapsed += 1;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.body.reset();
        self.click_filter.reset();
        self.elapsed = 0;
        self.active = true;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
