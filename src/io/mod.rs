// Purpose - external interfaces: decoded sources, output buffers, sinks, UI bridge

pub mod bridge;
pub mod resample;
pub mod wav;

use std::sync::Arc;

use crate::error::RemixError;

/// A decoded, immutable audio source shared between the background loop and
/// every slice cut from it. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    inner: Arc<SourceData>,
}

#[derive(Debug)]
struct SourceData {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
    frames: usize,
}

impl SourceBuffer {
    /// Planar channel data at `sample_rate`. All channels must be the same
    /// non-zero length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, RemixError> {
        let frames = channels.first().map_or(0, Vec::len);
        if frames == 0 {
            return Err(RemixError::EmptySample);
        }
        if channels.iter().any(|c| c.len() != frames) {
            return Err(RemixError::UnsupportedFormat(
                "channels have different lengths".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(RemixError::UnsupportedFormat("sample rate of 0 Hz".to_string()));
        }

        Ok(Self {
            inner: Arc::new(SourceData {
                channels,
                sample_rate,
                frames,
            }),
        })
    }

    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, RemixError> {
        Self::new(vec![samples], sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.inner.channels.len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.inner.channels[index % self.channel_count()]
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.inner.frames
    }

    pub fn is_empty(&self) -> bool {
        self.inner.frames == 0
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate() as f64
    }

    /// True if both handles point at the same decoded data.
    pub fn ptr_eq(&self, other: &SourceBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Band-limited resample to `sample_rate`. Returns a cheap clone when
    /// the rate already matches.
    pub fn resampled(&self, sample_rate: u32) -> Result<SourceBuffer, RemixError> {
        if sample_rate == self.sample_rate() {
            return Ok(self.clone());
        }
        if sample_rate == 0 {
            return Err(RemixError::UnsupportedFormat("sample rate of 0 Hz".to_string()));
        }

        let channels = resample::resample(&self.inner.channels, self.sample_rate(), sample_rate)?;
        SourceBuffer::new(channels, sample_rate)
    }

    /// Per-bucket RMS of the first channel, for waveform overviews.
    pub fn rms_overview(&self, buckets: usize) -> Vec<f32> {
        if buckets == 0 {
            return Vec::new();
        }
        let samples = self.channel(0);
        let bucket_len = (samples.len() / buckets).max(1);
        samples
            .chunks(bucket_len)
            .take(buckets)
            .map(|chunk| (chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32).sqrt())
            .collect()
    }
}

/// Planar output block. Each inner vec is one channel.
#[derive(Debug, Default)]
pub struct AudioOutput {
    pub buffers: Vec<Vec<f32>>,
}

impl AudioOutput {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; frames]; channels],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.buffers.len()
    }

    /// Frames per channel (the shortest channel wins).
    pub fn frames(&self) -> usize {
        self.buffers.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Resize every channel to `frames`. Only allocates when growing.
    pub fn set_frames(&mut self, frames: usize) {
        for buffer in &mut self.buffers {
            buffer.resize(frames, 0.0);
        }
    }

    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
    }

    /// Copy into an interleaved device buffer with `device_channels` slots per
    /// frame. Extra device channels repeat the planar channels in order.
    pub fn interleave_into(&self, out: &mut [f32], device_channels: usize) {
        if self.buffers.is_empty() || device_channels == 0 {
            out.fill(0.0);
            return;
        }
        for (i, frame) in out.chunks_mut(device_channels).enumerate() {
            for (ch, slot) in frame.iter_mut().enumerate() {
                let buffer = &self.buffers[ch % self.buffers.len()];
                *slot = buffer.get(i).copied().unwrap_or(0.0);
            }
        }
    }
}

/// The output device as the engine sees it.
///
/// Starting a remix or a hold asks a suspended sink to resume first. A failed
/// resume is logged and scheduling proceeds anyway.
pub trait AudioSink: Send {
    fn is_suspended(&self) -> bool;

    fn resume(&mut self) -> Result<(), RemixError>;
}

/// Something that can produce a decoded source, like a file on disk.
pub trait SampleProvider {
    fn load(&mut self) -> Result<SourceBuffer, RemixError>;
}

/// An already-decoded buffer provides itself.
impl SampleProvider for SourceBuffer {
    fn load(&mut self) -> Result<SourceBuffer, RemixError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_rejects_empty_and_ragged() {
        assert!(matches!(
            SourceBuffer::from_mono(Vec::new(), 44_100),
            Err(RemixError::EmptySample)
        ));
        assert!(matches!(
            SourceBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44_100),
            Err(RemixError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_source_channel_wraps() {
        let source = SourceBuffer::new(vec![vec![1.0; 4], vec![2.0; 4]], 8_000).unwrap();
        assert_eq!(source.channel(2)[0], 1.0);
        assert_eq!(source.channel(3)[0], 2.0);
        assert_eq!(source.len(), 4);
        assert!((source.duration_secs() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_clones_share_data() {
        let source = SourceBuffer::from_mono(vec![0.5; 16], 8_000).unwrap();
        let copy = source.clone();
        assert!(source.ptr_eq(&copy));

        let other = SourceBuffer::from_mono(vec![0.5; 16], 8_000).unwrap();
        assert!(!source.ptr_eq(&other));
    }

    #[test]
    fn test_resample_halves_length() {
        let source = SourceBuffer::from_mono(vec![0.25; 2_000], 16_000).unwrap();

        let same = source.resampled(16_000).unwrap();
        assert!(same.ptr_eq(&source));

        let down = source.resampled(8_000).unwrap();
        assert_eq!(down.len(), 1_000);
        assert_eq!(down.sample_rate(), 8_000);
        // DC passes the anti-alias filter unchanged away from the edges.
        assert!((down.channel(0)[500] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_rms_overview() {
        let mut samples = vec![0.0f32; 100];
        samples[50..].fill(0.5);
        let source = SourceBuffer::from_mono(samples, 8_000).unwrap();
        let overview = source.rms_overview(2);
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0], 0.0);
        assert!((overview[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_interleave_repeats_channels() {
        let mut output = AudioOutput::new(2, 2);
        output.buffers[0] = vec![1.0, 2.0];
        output.buffers[1] = vec![-1.0, -2.0];

        let mut device = [0.0f32; 8];
        output.interleave_into(&mut device, 4);
        assert_eq!(device, [1.0, -1.0, 1.0, -1.0, 2.0, -2.0, 2.0, -2.0]);
    }
}
