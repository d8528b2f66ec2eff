//! WAV decoding through `hound`.

use std::io::Read;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};
use tracing::debug;

use super::{SampleProvider, SourceBuffer};
use crate::error::RemixError;

/// A WAV file on disk, decoded on `load`.
#[derive(Debug, Clone)]
pub struct WavFile {
    path: PathBuf,
}

impl WavFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleProvider for WavFile {
    fn load(&mut self) -> Result<SourceBuffer, RemixError> {
        let reader = WavReader::open(&self.path)?;
        let source = decode(reader)?;
        debug!(
            path = %self.path.display(),
            channels = source.channel_count(),
            sample_rate = source.sample_rate(),
            frames = source.len(),
            "decoded WAV file"
        );
        Ok(source)
    }
}

/// Decode every sample from `reader` into a planar [`SourceBuffer`].
pub fn decode<R: Read>(reader: WavReader<R>) -> Result<SourceBuffer, RemixError> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(RemixError::UnsupportedFormat("zero channels".to_string()));
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ 8..=32) => {
            let max_val = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(RemixError::UnsupportedFormat(format!(
                "{bits}-bit {format:?} samples"
            )))
        }
    };

    let frames = interleaved.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (channel, &sample) in planar.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    SourceBuffer::new(planar, spec.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn encode(spec: WavSpec, write: impl FnOnce(&mut WavWriter<&mut Cursor<Vec<u8>>>)) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_stereo_int16() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = encode(spec, |writer| {
            for _ in 0..10 {
                writer.write_sample(16_384i16).unwrap();
                writer.write_sample(-32_768i16).unwrap();
            }
        });

        let source = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap();
        assert_eq!(source.channel_count(), 2);
        assert_eq!(source.len(), 10);
        assert_eq!(source.sample_rate(), 22_050);
        assert!((source.channel(0)[3] - 0.5).abs() < 1e-6);
        assert!((source.channel(1)[3] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_float() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let bytes = encode(spec, |writer| {
            for i in 0..8 {
                writer.write_sample(i as f32 * 0.1).unwrap();
            }
        });

        let source = decode(WavReader::new(Cursor::new(bytes)).unwrap()).unwrap();
        assert_eq!(source.len(), 8);
        assert!((source.channel(0)[7] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_empty_wav_is_rejected() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let bytes = encode(spec, |_| {});
        let result = decode(WavReader::new(Cursor::new(bytes)).unwrap());
        assert!(matches!(result, Err(RemixError::EmptySample)));
    }

    #[test]
    fn test_missing_file_reports_wav_error() {
        let mut file = WavFile::new("/definitely/not/here.wav");
        assert!(matches!(file.load(), Err(RemixError::Wav(_))));
    }
}
