//! Error type shared by the library.

/// Everything the remix library can fail with.
///
/// `EmptySelection` is the one callers are expected to recover from: it
/// means every note-value weight is zero, which the user fixes by raising a
/// slider. The rest are construction or loading failures.
#[derive(Debug, thiserror::Error)]
pub enum RemixError {
    #[error("no note value has a weight above zero")]
    EmptySelection,

    #[error("invalid tempo {0} BPM: must be greater than zero")]
    InvalidBpm(u32),

    #[error("unknown note value: {0:?}")]
    UnknownNoteValue(String),

    #[error("unknown preset: {0:?}")]
    UnknownPreset(String),

    #[error("unknown sound source: {0:?}")]
    UnknownSoundSource(String),

    #[error("sample contains no audio frames")]
    EmptySample,

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to resample from {0} Hz to {1} Hz")]
    Resample(u32, u32),

    #[error("audio output error: {0}")]
    Sink(String),

    #[error("failed to read WAV data: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T, E = RemixError> = std::result::Result<T, E>;
