//! Bass drum voice - a layered, sub-heavy hit.
//!
//! Five layers are summed: a pitched triangle attack, a saturated sub sine,
//! a mid sine that keeps the hit audible on small speakers, and two noise
//! transients (a band-passed click and a high-passed spike).
//!
//! # How It Works
//!
//! 1. Attack: triangle sweeping `attack_freq` → 0.6x → `sub_freq` over
//!    `pitch_decay_ms`, gated by `body_punch`
//! 2. Sub: sine at `sub_freq`, overshoots to 1.2 then settles and decays over
//!    `sub_decay_ms`; soft-clipped for warmth
//! 3. Mid: sine at 2.5x `sub_freq`, scaled by `mid_range_boost`
//! 4. Click: noise through a 4.5 kHz band-pass, shorter as
//!    `transient_sharpness` rises
//! 5. Spike: noise through a 7 kHz high-pass, 8 ms long
//!
//! The sum is hard-limited at full scale.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::automation::Automation;
use crate::dsp::distortion::{clip, soft_clip, FULL_SCALE};
use crate::dsp::filter::SVFilter;
use crate::dsp::oscillator::{Noise, OscillatorBlock};
use crate::graph::node::{GraphNode, RenderCtx};

const SUB_DRIVE: f32 = 1.5;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BassParams {
    pub attack_freq: f32,
    pub sub_freq: f32,
    pub pitch_decay_ms: f32,
    pub sub_decay_ms: f32,
    /// Attack layer level (0-100)
    pub body_punch: f32,
    /// Click layer level (0-100)
    pub click_level: f32,
    /// Mid layer level (0-1)
    pub mid_range_boost: f32,
    /// Spike level and click shortness (0-100)
    pub transient_sharpness: f32,
    pub volume: f32,
}

impl Default for BassParams {
    fn default() -> Self {
        BASS_PRESETS[3].1
    }
}

pub const BASS_PRESETS: [(&str, BassParams); 4] = [
    (
        "Nebula Core",
        BassParams {
            attack_freq: 109.0,
            sub_freq: 63.0,
            pitch_decay_ms: 55.0,
            sub_decay_ms: 590.0,
            body_punch: 42.0,
            click_level: 53.0,
            mid_range_boost: 0.33,
            transient_sharpness: 59.0,
            volume: 0.7,
        },
    ),
    (
        "Void Resonance",
        BassParams {
            attack_freq: 58.0,
            sub_freq: 46.0,
            pitch_decay_ms: 55.0,
            sub_decay_ms: 590.0,
            body_punch: 34.0,
            click_level: 36.0,
            mid_range_boost: 0.49,
            transient_sharpness: 89.0,
            volume: 0.7,
        },
    ),
    (
        "Dark Matter",
        BassParams {
            attack_freq: 58.0,
            sub_freq: 37.0,
            pitch_decay_ms: 89.0,
            sub_decay_ms: 730.0,
            body_punch: 18.0,
            click_level: 51.0,
            mid_range_boost: 0.49,
            transient_sharpness: 89.0,
            volume: 0.7,
        },
    ),
    (
        "Solar Flare",
        BassParams {
            attack_freq: 85.0,
            sub_freq: 42.0,
            pitch_decay_ms: 45.0,
            sub_decay_ms: 450.0,
            body_punch: 65.0,
            click_level: 28.0,
            mid_range_boost: 0.42,
            transient_sharpness: 75.0,
            volume: 0.7,
        },
    ),
];

pub struct Bass {
    params: BassParams,

    attack: OscillatorBlock,
    attack_pitch: Automation,
    attack_gain: Automation,

    sub: OscillatorBlock,
    sub_gain: Automation,

    mid: OscillatorBlock,
    mid_gain: Automation,

    click: Noise,
    click_filter: SVFilter,
    click_gain: Automation,

    spike: Noise,
    spike_filter: SVFilter,
    spike_gain: Automation,

    length_s: f32,
    elapsed: u64,
    active: bool,
}

impl Bass {
    pub fn new(params: BassParams, seed: u64) -> Self {
        let pitch_decay = params.pitch_decay_ms / 1000.0;
        let sub_decay = params.sub_decay_ms / 1000.0;
        let body_punch = params.body_punch / 100.0;
        let click_level = params.click_level / 100.0;
        let sharpness = params.transient_sharpness / 100.0;

        Self {
            params,

            attack: OscillatorBlock::triangle(),
            attack_pitch: Automation::starting_at(params.attack_freq.max(1.0))
                .exponential_to(params.attack_freq.max(1.0) * 0.6, pitch_decay * 0.25)
                .exponential_to(params.sub_freq.max(1.0), pitch_decay),
            attack_gain: Automation::starting_at(0.0)
                .linear_to(body_punch, 0.0005)
                .exponential_to(0.001, pitch_decay * 0.8),

            sub: OscillatorBlock::sine(),
            sub_gain: Automation::starting_at(0.0)
                .linear_to(1.2, 0.001)
                .set_at(0.005, 1.0)
                .exponential_to(0.8, 0.05)
                .exponential_to(0.001, sub_decay),

            mid: OscillatorBlock::sine(),
            mid_gain: Automation::starting_at(0.0)
                .linear_to(0.4 * params.mid_range_boost, 0.001)
                .exponential_to(0.001, pitch_decay * 1.2),

            click: Noise::new(seed),
            click_filter: SVFilter::bandpass(4_500.0).with_q(0.7),
            click_gain: Automation::starting_at(0.0)
                .linear_to(click_level * 0.7, 0.0001)
                .exponential_to(0.001, 0.015 * (1.0 - sharpness + 0.1)),

            spike: Noise::new(seed.wrapping_add(1)),
            spike_filter: SVFilter::highpass(7_000.0).with_q(0.5),
            spike_gain: Automation::starting_at(0.0)
                .linear_to(sharpness * 0.7, 0.0001)
                .exponential_to(0.001, 0.008),

            length_s: (sub_decay + 0.2).max(pitch_decay * 2.0 + 0.1),
            elapsed: 0,
            active: false,
        }
    }
}

impl GraphNode for Bass {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let sample_rate = ctx.sample_rate;
        let click_coefficients = self.click_filter.coefficients(sample_rate);
        let spike_coefficients = self.spike_filter.coefficients(sample_rate);
        let sub_freq = self.params.sub_freq;

        for sample in out.iter_mut() {
            let t = self.elapsed as f32 / sample_rate;
            if !self.active || t >= self.length_s {
                self.active = false;
                *sample = 0.0;
                continue;
            }

            let attack = self.attack.next_sample(self.attack_pitch.value_at(t), sample_rate)
                * self.attack_gain.value_at(t);
            let sub = soft_clip(
                self.sub.next_sample(sub_freq, sample_rate) * self.sub_gain.value_at(t),
                SUB_DRIVE,
            );
            let mid = self.mid.next_sample(sub_freq * 2.5, sample_rate) * self.mid_gain.value_at(t);
            let click = self.click_filter.process(self.click.next_sample(), click_coefficients)
                * self.click_gain.value_at(t);
            let spike = self.spike_filter.process(self.spike.next_sample(), spike_coefficients)
                * self.spike_gain.value_at(t);

            let mixed = (attack + sub + mid + click + spike) * self.params.volume;
            *sample = clip(mixed, FULL_SCALE);
            self.elapsed += 1;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.attack.reset();
        self.sub.reset();
        self.mid.reset();
        self.click_filter.reset();
        self.spike_filter.reset();
        self.elapsed = 0;
        self.active = true;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
