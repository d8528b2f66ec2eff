use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Triangle,
    Square,
}

/// Phase-accumulating oscillator. Frequency is supplied per sample so pitch
/// sweeps need no extra state.
#[derive(Debug, Clone)]
pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32, // 0.0..1.0
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let value = match self.waveform {
            OscillatorWaveform::Sine => (self.phase * TAU).sin(),
            // Peaks at phase 0.25, troughs at 0.75, same orientation as sine.
            OscillatorWaveform::Triangle => {
                let p = self.phase;
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            OscillatorWaveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        };

        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        value
    }

    /// Fill `destination` at a fixed frequency.
    pub fn render(&mut self, destination: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in destination.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Uniform white noise in [-1, 1).
#[derive(Debug, Clone)]
pub struct Noise {
    rng: StdRng,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.rng.gen_range(-1.0..1.0)
    }

    pub fn render(&mut self, destination: &mut [f32]) {
        for sample in destination.iter_mut() {
            *sample = self.next_sample();
        }
    }
}
