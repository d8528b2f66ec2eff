/*
Slice Envelope Implementation
=============================

Every remixed slice is shaped by a three-part gain envelope: a linear rise to
a fixed ceiling, a flat hold for the rest of the slice, and an optional linear
fall to silence after the slice ends.

Vocabulary
----------

  ceiling     The gain the attack rises to. Fixed at 0.158 (about -16 dB) so
              stacked slices leave headroom under the background loop.

  attack      Milliseconds to rise from 0 to the ceiling. Zero means the
              slice starts at the ceiling immediately.

  slice       The entry's own duration in milliseconds. The envelope holds
              until this point no matter how many source samples remain.

  release     Milliseconds to fall from the slice-end level to 0. Zero means
              the gain drops straight to 0 when the slice ends.


The Shape
---------

  Gain
  0.158 ┐    ___________
        │   ╱           ╲
        │  ╱             ╲
        │ ╱               ╲
    0.0 └╱─────────────────╲──→ Time
        Attack   Hold    Release
        |<----- slice ---->|

If the attack is longer than the slice, the rise is cut short and the release
starts from whatever level the rise had reached.


The Math
--------

The curve is a pure function of elapsed time, so `gain_at` can be sampled
anywhere without running the state machine:

    rise(t)    = ceiling * t / attack             (t < attack)
               = ceiling                          (otherwise)

    gain(t)    = rise(t)                          (t < slice)
               = rise(slice) * (1 - (t - slice) / release)
                                                  (slice <= t < slice + release)
               = 0                                (afterwards)

The per-sample renderer converts its sample counter to milliseconds and
evaluates the same function, so block size never changes the result.
*/

use crate::MIN_TIME;

/// Peak gain of a slice, roughly -16 dB.
pub const HEADROOM_GAIN: f32 = 0.158;

/// Which part of the curve the envelope is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,  // Rising toward the ceiling
    Hold,    // At the ceiling until the slice ends
    Release, // Falling to zero after the slice
    Idle,    // Finished, level = 0
}

#[derive(Debug, Clone)]
pub struct SliceEnvelope {
    // Shape parameters, milliseconds
    attack_ms: f64,
    slice_ms: f64,
    release_ms: f64,
    ceiling: f32,

    // Runtime state
    elapsed_samples: u64,
    level: f32,
    stage: EnvelopeStage,
}

impl SliceEnvelope {
    pub fn new(attack_ms: f64, slice_ms: f64, release_ms: f64) -> Self {
        let min_ms = (MIN_TIME * 1000.0) as f64;
        let mut envelope = Self {
            attack_ms: attack_ms.max(0.0),
            slice_ms: slice_ms.max(min_ms),
            release_ms: release_ms.max(0.0),
            ceiling: HEADROOM_GAIN,
            elapsed_samples: 0,
            level: 0.0,
            stage: EnvelopeStage::Idle,
        };
        envelope.stage = envelope.stage_at(0.0);
        envelope
    }

    pub fn with_ceiling(mut self, ceiling: f32) -> Self {
        self.ceiling = ceiling.max(0.0);
        self
    }

    /// Level reached during the rise at `t_ms`.
    fn rise(&self, t_ms: f64) -> f32 {
        if self.attack_ms > 0.0 && t_ms < self.attack_ms {
            (self.ceiling as f64 * t_ms / self.attack_ms) as f32
        } else {
            self.ceiling
        }
    }

    /// Gain at `t_ms` after the slice started.
    pub fn gain_at(&self, t_ms: f64) -> f32 {
        if t_ms < 0.0 {
            return 0.0;
        }
        if t_ms < self.slice_ms {
            return self.rise(t_ms);
        }

        let into_release = t_ms - self.slice_ms;
        if into_release < self.release_ms {
            let start = self.rise(self.slice_ms) as f64;
            return (start * (1.0 - into_release / self.release_ms)).max(0.0) as f32;
        }

        0.0
    }

    pub fn stage_at(&self, t_ms: f64) -> EnvelopeStage {
        if t_ms < self.slice_ms {
            if self.attack_ms > 0.0 && t_ms < self.attack_ms {
                EnvelopeStage::Attack
            } else {
                EnvelopeStage::Hold
            }
        } else if t_ms - self.slice_ms < self.release_ms {
            EnvelopeStage::Release
        } else {
            EnvelopeStage::Idle
        }
    }

    /// Slice length plus release: how long the voice stays audible.
    pub fn total_ms(&self) -> f64 {
        self.slice_ms + self.release_ms
    }

    pub fn slice_ms(&self) -> f64 {
        self.slice_ms
    }

    pub fn release_ms(&self) -> f64 {
        self.release_ms
    }

    /// Produce the gain for the current sample and advance by one.
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let t_ms = self.elapsed_samples as f64 * 1000.0 / sample_rate as f64;
        self.level = self.gain_at(t_ms);
        self.stage = self.stage_at(t_ms);
        self.elapsed_samples = self.elapsed_samples.saturating_add(1);

        debug_assert!((0.0..=self.ceiling.max(1.0)).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(sample_rate);
        }
    }

    /// Returns true until the release has finished.
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeStage::Idle)
    }

    /// Get the most recently produced level
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn render_samples(env: &mut SliceEnvelope, samples: usize) -> Vec<f32> {
        (0..samples).map(|_| env.next_sample(SAMPLE_RATE)).collect()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn attack_rises_linearly_to_ceiling() {
        let env = SliceEnvelope::new(10.0, 100.0, 50.0);

        assert!(approx(env.gain_at(0.0), 0.0));
        assert!(approx(env.gain_at(5.0), HEADROOM_GAIN * 0.5));
        assert!(approx(env.gain_at(10.0), HEADROOM_GAIN));
        assert!(approx(env.gain_at(99.0), HEADROOM_GAIN));
    }

    #[test]
    fn zero_attack_starts_at_ceiling() {
        let env = SliceEnvelope::new(0.0, 100.0, 0.0);
        assert!(approx(env.gain_at(0.0), HEADROOM_GAIN));
        assert_eq!(env.stage_at(0.0), EnvelopeStage::Hold);
    }

    #[test]
    fn release_falls_to_zero() {
        let env = SliceEnvelope::new(10.0, 100.0, 50.0);

        assert!(approx(env.gain_at(100.0), HEADROOM_GAIN));
        assert!(approx(env.gain_at(125.0), HEADROOM_GAIN * 0.5));
        assert!(approx(env.gain_at(150.0), 0.0));
        assert_eq!(env.stage_at(125.0), EnvelopeStage::Release);
        assert_eq!(env.stage_at(150.0), EnvelopeStage::Idle);
        assert_eq!(env.total_ms(), 150.0);
    }

    #[test]
    fn zero_release_cuts_at_slice_end() {
        let env = SliceEnvelope::new(0.0, 100.0, 0.0);
        assert!(approx(env.gain_at(99.9), HEADROOM_GAIN));
        assert!(approx(env.gain_at(100.0), 0.0));
        assert_eq!(env.stage_at(100.0), EnvelopeStage::Idle);
    }

    #[test]
    fn long_attack_releases_from_reached_level() {
        // Attack never completes inside a 50 ms slice.
        let env = SliceEnvelope::new(100.0, 50.0, 20.0);
        let reached = HEADROOM_GAIN * 0.5;

        assert!(approx(env.gain_at(50.0), reached));
        assert!(approx(env.gain_at(60.0), reached * 0.5));
    }

    #[test]
    fn gain_never_exceeds_ceiling() {
        let env = SliceEnvelope::new(3.0, 40.0, 30.0);
        for i in 0..1_000 {
            let t = i as f64 * 0.1;
            assert!(env.gain_at(t) <= HEADROOM_GAIN + f32::EPSILON);
        }
    }

    #[test]
    fn renderer_matches_curve_and_goes_idle() {
        let mut env = SliceEnvelope::new(10.0, 100.0, 50.0);
        let samples = render_samples(&mut env, 160);

        for (i, &level) in samples.iter().enumerate() {
            assert!(approx(level, env.gain_at(i as f64)), "sample {i}");
        }
        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn custom_ceiling() {
        let env = SliceEnvelope::new(0.0, 10.0, 0.0).with_ceiling(1.0);
        assert!(approx(env.gain_at(1.0), 1.0));
    }
}
