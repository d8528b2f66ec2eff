//! Low-level DSP primitives used by the slice player and percussion voices.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! so they can live directly inside voice structs.

/// Breakpoint automation (linear and exponential ramps).
pub mod automation;
/// Soft and hard waveshapers.
pub mod distortion;
/// Attack/hold/release envelope for remix slices.
pub mod envelope;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Oscillator waveforms and noise sources.
pub mod oscillator;

pub use automation::Automation;
pub use envelope::{EnvelopeStage, SliceEnvelope, HEADROOM_GAIN};
