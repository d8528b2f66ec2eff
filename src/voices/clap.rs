//! Clap voice - a flurry of noise bursts.
//!
//! A hand clap is several hands hitting at almost the same time. We model it
//! as four short noise bursts `spacing_ms` apart, the last one ringing out
//! longer to suggest the room.
//!
//! # How It Works
//!
//! 1. Burst `i` starts at `i * spacing_ms`, rises to 0.3 in 1 ms
//! 2. Bursts 0-2 fall exponentially over `decay_ms`, burst 3 over
//!    `reverb_decay_ms`
//! 3. The sum passes a band-pass at `filter_freq`
//!
//! The band-pass is key - it removes both the low rumble and ultra-high
//! hiss, leaving the characteristic "crack" frequencies.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::automation::Automation;
use crate::dsp::filter::SVFilter;
use crate::dsp::oscillator::Noise;
use crate::graph::node::{GraphNode, RenderCtx};

const BURSTS: usize = 4;
/// Each burst keeps sounding this long past its decay target.
const BURST_TAIL_S: f32 = 0.05;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClapParams {
    pub spacing_ms: f32,
    pub decay_ms: f32,
    pub reverb_decay_ms: f32,
    pub filter_freq: f32,
    pub filter_q: f32,
    pub volume: f32,
}

impl Default for ClapParams {
    fn default() -> Self {
        Self {
            spacing_ms: 10.0,
            decay_ms: 60.0,
            reverb_decay_ms: 500.0,
            filter_freq: 3_000.0,
            filter_q: 0.1,
            volume: 0.7,
        }
    }
}

pub const CLAP_PRESETS: [(&str, ClapParams); 4] = [
    (
        "Starlight Burst",
        ClapParams {
            spacing_ms: 8.0,
            decay_ms: 48.0,
            reverb_decay_ms: 850.0,
            filter_freq: 1_860.0,
            filter_q: 0.2,
            volume: 0.7,
        },
    ),
    (
        "Aurora Wave",
        ClapParams {
            spacing_ms: 29.0,
            decay_ms: 146.0,
            reverb_decay_ms: 420.0,
            filter_freq: 1_440.0,
            filter_q: 0.1,
            volume: 0.7,
        },
    ),
    (
        "Moonlight Echo",
        ClapParams {
            spacing_ms: 12.0,
            decay_ms: 93.0,
            reverb_decay_ms: 580.0,
            filter_freq: 1_440.0,
            filter_q: 0.1,
            volume: 0.7,
        },
    ),
    (
        "Meteor Shower",
        ClapParams {
            spacing_ms: 8.0,
            decay_ms: 127.0,
            reverb_decay_ms: 210.0,
            filter_freq: 1_440.0,
            filter_q: 0.1,
            volume: 0.7,
        },
    ),
];

struct Burst {
    start_s: f32,
    stop_s: f32,
    gain: Automation,
}

pub struct Clap {
    volume: f32,
    noise: Noise,
    filter: SVFilter,
    bursts: [Burst; BURSTS],
    length_s: f32,
    elapsed: u64,
    active: bool,
}

impl Clap {
    pub fn new(params: ClapParams, seed: u64) -> Self {
        let bursts: [Burst; BURSTS] = std::array::from_fn(|i| {
            let decay_ms = if i == BURSTS - 1 {
                params.reverb_decay_ms
            } else {
                params.decay_ms
            };
            let decay = decay_ms / 1000.0;
            let start_s = params.spacing_ms * i as f32 / 1000.0;
            Burst {
                start_s,
                stop_s: start_s + decay + BURST_TAIL_S,
                gain: Automation::starting_at(0.0)
                    .linear_to(0.3, 0.001)
                    .exponential_to(0.001, decay),
            }
        });
        let length_s = bursts.iter().fold(0.0f32, |acc, b| acc.max(b.stop_s));

        Self {
            volume: params.volume,
            noise: Noise::new(seed),
            filter: SVFilter::bandpass(params.filter_freq).with_q(params.filter_q),
            bursts,
            length_s,
            elapsed: 0,
            active: false,
        }
    }

    fn envelope_at(&self, t: f32) -> f32 {
        self.bursts
            .iter()
            .filter(|b| t >= b.start_s && t < b.stop_s)
            .map(|b| b.gain.value_at(t - b.start_s))
            .sum()
    }
}

impl GraphNode for Clap {
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

            let burst = self.noise.next_sample() * self.envelope_at(t);
            *sample = self.filter.process(burst, coefficients) * self.volume;
            self.elapsed += 1;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.filter.reset();
        self.elapsed = 0;
        self.active = true;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
