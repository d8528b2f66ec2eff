pub mod dsp;
pub mod engine; // Timer queue, scheduler, slice playback, mixing
pub mod error;
pub mod graph; // Node trait shared by the percussion voices
pub mod io;
pub mod sequencing; // Note values, probability tables, remix sequences
pub mod voices; // Synthesized percussion sources

pub use engine::{RemixEngine, RemixEngineBuilder};
pub use error::{RemixError, Result};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
