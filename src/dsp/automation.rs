//! Breakpoint automation for one-shot percussion.
//!
//! An [`Automation`] is a list of `(time, value)` breakpoints, each reached
//! by a step, a straight line, or an exponential curve from the previous
//! point. Drum voices use it for both amplitude and pitch:
//!
//! ```text
//!   value
//!     1.0 ┐╲
//!         │ ╲                  exponential_to(0.01, 0.5)
//!         │  ╲___
//!    0.01 └──────‾‾‾‾────→ t
//! ```
//!
//! Exponential segments follow `v0 * (v1 / v0) ^ progress`, which is why
//! they never target exactly zero. After the last breakpoint the value holds.

/// How a breakpoint is approached from the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Step,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub time_s: f32,
    pub value: f32,
    pub curve: Curve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Automation {
    points: Vec<Breakpoint>,
}

impl Automation {
    /// Start at `value` from time zero.
    pub fn starting_at(value: f32) -> Self {
        Self {
            points: vec![Breakpoint {
                time_s: 0.0,
                value,
                curve: Curve::Step,
            }],
        }
    }

    fn push(mut self, time_s: f32, value: f32, curve: Curve) -> Self {
        let floor = self.end_time();
        self.points.push(Breakpoint {
            time_s: time_s.max(floor),
            value,
            curve,
        });
        self
    }

    /// Jump to `value` at `time_s`.
    pub fn set_at(self, time_s: f32, value: f32) -> Self {
        self.push(time_s, value, Curve::Step)
    }

    /// Ramp in a straight line to `value`, arriving at `time_s`.
    pub fn linear_to(self, value: f32, time_s: f32) -> Self {
        self.push(time_s, value, Curve::Linear)
    }

    /// Ramp exponentially to `value`, arriving at `time_s`.
    pub fn exponential_to(self, value: f32, time_s: f32) -> Self {
        self.push(time_s, value, Curve::Exponential)
    }

    /// Time of the final breakpoint.
    pub fn end_time(&self) -> f32 {
        self.points.last().map_or(0.0, |p| p.time_s)
    }

    pub fn value_at(&self, t: f32) -> f32 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        if t <= first.time_s {
            return first.value;
        }

        for pair in self.points.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if t >= to.time_s {
                continue;
            }

            let span = to.time_s - from.time_s;
            let progress = if span > 0.0 { (t - from.time_s) / span } else { 1.0 };

            return match to.curve {
                Curve::Step => from.value,
                Curve::Linear => from.value + (to.value - from.value) * progress,
                Curve::Exponential if from.value > 0.0 && to.value > 0.0 => {
                    from.value * (to.value / from.value).powf(progress)
                }
                // Exponential ramps cannot start from zero; fall back to linear.
                Curve::Exponential => from.value + (to.value - from.value) * progress,
            };
        }

        self.points.last().map_or(0.0, |p| p.value)
    }
}
