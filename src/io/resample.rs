//! Offline sample-rate conversion through `rubato`.
//!
//! Sources are converted once, on load, so the whole buffer goes through a
//! single band-limited sinc pass. The resampler's filter delay is trimmed off
//! the front and the output is cut to `round(frames * to / from)` frames, so
//! converted audio lines up with the original in time.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::RemixError;

/// Convert planar `channels` from `from` Hz to `to` Hz.
pub fn resample(channels: &[Vec<f32>], from: u32, to: u32) -> Result<Vec<Vec<f32>>, RemixError> {
    let frames = channels.first().map_or(0, Vec::len);
    if frames == 0 {
        return Err(RemixError::EmptySample);
    }

    let ratio = to as f64 / from as f64;
    let expected = ((frames as f64 * ratio).round() as usize).max(1);

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, frames, channels.len())
        .map_err(|_| RemixError::Resample(from, to))?;
    let delay = resampler.output_delay();

    let mut output = resampler
        .process(channels, None)
        .map_err(|_| RemixError::Resample(from, to))?;
    // Flush the filter tail with one chunk of silence.
    let tail = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|_| RemixError::Resample(from, to))?;

    for (channel, rest) in output.iter_mut().zip(tail) {
        channel.extend(rest);
        channel.drain(..delay.min(channel.len()));
        channel.resize(expected, 0.0);
    }
    Ok(output)
}
