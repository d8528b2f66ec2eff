//! Waveshapers
//!
//! Two transfer functions, applied per sample:
//!
//! ```text
//!   soft_clip   f(x) = d·x / (1 + |d·x|)    saturation on the bass sub
//!   clip        f(x) = clamp(x, -c, c)      last stage of a bus
//! ```
//!
//! `soft_clip` never reaches ±1, it only approaches it, so driving it harder
//! thickens the tone without ever producing an overshoot. `clip` is the
//! blunt guard that keeps whatever reaches the device inside full scale.

/// Largest magnitude a device sample may take.
pub const FULL_SCALE: f32 = 1.0;

/// Saturate `sample` after scaling it by `drive`.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Clamp `sample` into `-ceiling..=ceiling`.
#[inline]
pub fn clip(sample: f32, ceiling: f32) -> f32 {
    sample.clamp(-ceiling, ceiling)
}

/// Clamp a whole block in place. NaN samples are passed through untouched.
pub fn clip_block(block: &mut [f32], ceiling: f32) {
    for sample in block.iter_mut() {
        if sample.abs() > ceiling {
            *sample = clip(*sample, ceiling);
        }
    }
}
