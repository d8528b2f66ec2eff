use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
| type      | constructed by     | passes          | rejects      |
| --------- | ------------------ | --------------- | ------------ |
| low-pass  | LPF                | below cutoff    | above cutoff |
| high-pass | HPF                | above cutoff    | below cutoff |
| band-pass | LPF ∘ HPF (series) | around cutoff   | outside      |

Topology-preserving-transform state variable filter. Damping `k` sets the
bandwidth: k = 1 / Q, so Q = 0.5 gives k = 2 (no resonance) and large Q
narrows the band.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

/// Per-sample coefficients, computed once per block.
#[derive(Debug, Clone, Copy)]
pub struct Coefficients {
    g: f32,
    k: f32,
}

#[derive(Debug, Clone)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    pub cutoff_hz: f32,
    pub q: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            q: 0.5,
            filter_type,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz)
    }

    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::BandPass, cutoff_hz)
    }

    pub fn with_q(mut self, q: f32) -> Self {
        self.set_q(q);
        self
    }

    pub fn coefficients(&self, sample_rate: f32) -> Coefficients {
        // Keep the cutoff below Nyquist or tan() blows up.
        let cutoff = self.cutoff_hz.clamp(1.0, sample_rate * 0.49);
        let wd = TAU * cutoff;
        let wa = (2.0 * sample_rate) * (wd / (2.0 * sample_rate)).tan();
        Coefficients {
            g: wa / (2.0 * sample_rate),
            k: 1.0 / self.q,
        }
    }

    pub fn next_sample(&mut self, sample: f32, coefficients: Coefficients) -> FilterOutputs {
        let Coefficients { g, k } = coefficients;
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
        }
    }

    /// Filter one sample, returning the configured response.
    #[inline]
    pub fn process(&mut self, sample: f32, coefficients: Coefficients) -> f32 {
        let outputs = self.next_sample(sample, coefficients);
        match self.filter_type {
            FilterType::LowPass => outputs.lowpass,
            FilterType::HighPass => outputs.highpass,
            // Scaled by k for unity gain at the center frequency.
            FilterType::BandPass => outputs.bandpass * coefficients.k,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let coefficients = self.coefficients(ctx.sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, coefficients);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q.max(0.01);
    }
}
