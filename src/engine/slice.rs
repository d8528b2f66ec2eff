//! Slice playback
//!
//! A slice is a window of the source buffer, as long as the sequence entry
//! that fired it, played once through a [`SliceEnvelope`]. Slices keep a
//! handle to the shared source rather than copying the region.
//!
//! # How It Works
//!
//! Start positions are drawn uniformly from `[0, length - 0.5 s)` so a slice
//! never begins right at the tail of the file. While holding, the previous
//! start is reused and every re-trigger replays the same fragment.
//!
//! The envelope is sized from the entry duration, not from how many frames
//! are actually left in the buffer. A slice that runs off the end of the
//! source plays silence for the remainder, and the release tail always
//! runs over silence once the region has played.

use std::ops::Range;

use rand::Rng;

use crate::dsp::envelope::SliceEnvelope;
use crate::io::SourceBuffer;
use crate::sequencing::SequenceEntry;

/// Tail of the source that random starts stay clear of.
pub const START_GUARD_SECS: f64 = 0.5;

/// Picks slice positions and builds voices for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlicePlayer;

impl SlicePlayer {
    pub fn new() -> Self {
        Self
    }

    /// Choose where the next slice begins.
    ///
    /// Holding reuses `last_start` (clamped into the buffer). Otherwise a new
    /// start is drawn and recorded in `last_start`.
    pub fn choose_start<R: Rng + ?Sized>(
        &self,
        source: &SourceBuffer,
        holding: bool,
        last_start: &mut Option<usize>,
        rng: &mut R,
    ) -> usize {
        if holding {
            if let Some(start) = *last_start {
                return start.min(source.len().saturating_sub(1));
            }
        }

        let guard = (START_GUARD_SECS * source.sample_rate() as f64) as usize;
        let max_start = source.len().saturating_sub(guard);
        let start = if max_start == 0 {
            0
        } else {
            (rng.gen::<f64>() * max_start as f64).floor() as usize
        };
        *last_start = Some(start);
        start
    }

    /// Build a voice for `entry` starting at `start`.
    pub fn trigger(
        &self,
        source: &SourceBuffer,
        entry: &SequenceEntry,
        start: usize,
        attack_ms: f64,
        release_ms: f64,
    ) -> SliceVoice {
        SliceVoice::new(source.clone(), start, entry.duration_ms, attack_ms, release_ms)
    }
}

/// One playing slice.
#[derive(Debug, Clone)]
pub struct SliceVoice {
    source: SourceBuffer,
    start: usize,
    /// Requested length in frames, before clipping.
    len: usize,
    end: usize,
    position: usize,
    envelope: SliceEnvelope,
}

impl SliceVoice {
    pub fn new(
        source: SourceBuffer,
        start: usize,
        duration_ms: f64,
        attack_ms: f64,
        release_ms: f64,
    ) -> Self {
        let sample_rate = source.sample_rate() as f64;
        let len = (duration_ms / 1000.0 * sample_rate).floor().max(0.0) as usize;
        let start = start.min(source.len());
        let end = start.saturating_add(len).min(source.len());

        Self {
            source,
            start,
            len,
            end,
            position: start,
            envelope: SliceEnvelope::new(attack_ms, duration_ms, release_ms),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Requested length in frames.
    pub fn duration_samples(&self) -> usize {
        self.len
    }

    /// Frames that actually exist in the source for this slice.
    pub fn region(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn envelope(&self) -> &SliceEnvelope {
        &self.envelope
    }

    /// Add this slice into `bus[..][range]`. Output channels beyond the
    /// source's channel count wrap around.
    pub fn render_into(&mut self, bus: &mut [Vec<f32>], range: Range<usize>, sample_rate: f32) {
        for frame in range {
            let gain = self.envelope.next_sample(sample_rate);
            if self.position < self.end {
                for (ch, channel) in bus.iter_mut().enumerate() {
                    if let Some(out) = channel.get_mut(frame) {
                        *out += self.source.channel(ch)[self.position] * gain;
                    }
                }
            }
            self.position += 1;
        }
    }

    /// True until the envelope has finished its release.
    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }
}
