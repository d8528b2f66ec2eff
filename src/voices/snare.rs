//! Snare drum voice.
//!
//! A synthesized snare combining a tonal body with noise for the "snare" rattle.
//! Real snares have metal wires stretched across the bottom head that buzz
//! when the drum is struck - we simulate this with filtered noise.
//!
//! # How It Works
//!
//! 1. Triangle wave at `osc_freq` provides the tonal "body"
//! 2. Noise through a 4 kHz band-pass provides the wire rattle
//! 3. Both rise over 5 ms; the rattle decays over `duration_ms`, the body
//!    over 60% of it
//!
//! # Variations
//!
//! - More noise = trashy, lo-fi snare
//! - Less noise = more "tom" like
//! - Longer duration = looser snare sound

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::automation::Automation;
use crate::dsp::filter::SVFilter;
use crate::dsp::oscillator::{Noise, OscillatorBlock};
use crate::graph::node::{GraphNode, RenderCtx};

const TAIL_S: f32 = 0.1;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnareParams {
    /// Rattle loudness (0-100)
    pub noise_level: f32,
    /// Body loudness (0-100)
    pub osc_level: f32,
    /// Body pitch in Hz
    pub osc_freq: f32,
    /// Rattle length in ms
    pub duration_ms: f32,
    pub volume: f32,
}

impl Default for SnareParams {
    fn default() -> Self {
        SNARE_PRESETS[1].1
    }
}

pub const SNARE_PRESETS: [(&str, SnareParams); 4] = [
    (
        "Crystal Shard",
        SnareParams {
            noise_level: 97.0,
            osc_level: 81.0,
            osc_freq: 250.0,
            duration_ms: 120.0,
            volume: 0.7,
        },
    ),
    (
        "Echo Chamber",
        SnareParams {
            noise_level: 80.0,
            osc_level: 50.0,
            osc_freq: 180.0,
            duration_ms: 120.0,
            volume: 0.7,
        },
    ),
    (
        "Quantum Snap",
        SnareParams {
            noise_level: 36.0,
            osc_level: 87.0,
            osc_freq: 156.0,
            duration_ms: 80.0,
            volume: 0.7,
        },
    ),
    (
        "Time Warp",
        SnareParams {
            noise_level: 56.0,
            osc_level: 20.0,
            osc_freq: 170.0,
            duration_ms: 270.0,
            volume: 0.7,
        },
    ),
];

pub struct Snare {
    volume: f32,
    osc_freq: f32,
    body: OscillatorBlock,
    body_gain: Automation,
    rattle: Noise,
    rattle_filter: SVFilter,
    rattle_gain: Automation,
    length_s: f32,
    elapsed: u64,
    active: bool,
}

impl Snare {
    pub fn new(params: SnareParams, seed: u64) -> Self {
        let duration = params.duration_ms / 1000.0;

        Self {
            volume: params.volume,
            osc_freq: params.osc_freq,
            body: OscillatorBlock::triangle(),
            body_gain: Automation::starting_at(0.0)
                .linear_to(params.osc_level / 100.0, 0.005)
                .exponential_to(0.01, duration * 0.6),
            rattle: Noise::new(seed),
            rattle_filter: SVFilter::bandpass(4_000.0).with_q(1.0),
            rattle_gain: Automation::starting_at(0.0)
                .linear_to(params.noise_level / 100.0, 0.005)
                .exponential_to(0.01, duration),
            length_s: duration + TAIL_S,
            elapsed: 0,
            active: false,
        }
    }
}

impl GraphNode for Snare {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let sample_rate = ctx.sample_rate;
        let coefficients = self.rattle_filter.coefficients(sample_rate);

        for sample in out.iter_mut() {
            let t = self.elapsed as f32 / sample_rate;
            if !self.active || t >= self.length_s {
                self.active = false;
                *sample = 0.0;
                continue;
            }

            let body = self.body.next_sample(self.osc_freq, sample_rate) * self.body_gain.value_at(t);
            let rattle = self.rattle_filter.process(self.rattle.next_sample(), coefficients)
                * self.rattle_gain.value_at(t);

            *sample = (body + rattle) * self.volume;
            self.elapsed += 1;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.body.reset();
        self.rattle_filter.reset();
        self.elapsed = 0;
        self.active = true;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
