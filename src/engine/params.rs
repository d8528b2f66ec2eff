//! Live-editable remix parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sequencing::{Bpm, ProbabilityTable};
use crate::voices::DrumPatch;

/// Read access to the values the engine consults while scheduling.
///
/// The engine reads these when an event fires, so a parameter changed
/// mid-sequence affects the next slice without a reschedule.
pub trait ParameterSource {
    fn bpm(&self) -> Bpm;
    fn attack_ms(&self) -> f64;
    fn release_ms(&self) -> f64;
    /// Output gain, 0.0..=1.0
    fn master_volume(&self) -> f32;
    /// Layer balance: 0.0 is all remix, 1.0 is all background.
    fn mix_fader(&self) -> f32;
    fn weights(&self) -> ProbabilityTable;
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct RemixParams {
    pub bpm: Bpm,
    pub attack_ms: f64,
    pub release_ms: f64,
    pub master_volume: f32,
    pub mix_fader: f32,
    pub weights: ProbabilityTable,
}

impl Default for RemixParams {
    fn default() -> Self {
        Self {
            bpm: Bpm::DEFAULT,
            attack_ms: 5.0,
            release_ms: 0.0,
            master_volume: 1.0,
            mix_fader: 0.0,
            weights: ProbabilityTable::default(),
        }
    }
}

impl ParameterSource for RemixParams {
    fn bpm(&self) -> Bpm {
        self.bpm
    }

    fn attack_ms(&self) -> f64 {
        self.attack_ms.max(0.0)
    }

    fn release_ms(&self) -> f64 {
        self.release_ms.max(0.0)
    }

    fn master_volume(&self) -> f32 {
        unit(self.master_volume)
    }

    fn mix_fader(&self) -> f32 {
        unit(self.mix_fader)
    }

    fn weights(&self) -> ProbabilityTable {
        self.weights
    }
}

/// Clamp to 0.0..=1.0, reading NaN as silence.
fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// What each sequence step plays.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SoundSource {
    /// A slice of the loaded sample, shaped by the slice envelope.
    #[default]
    Slice,
    /// A synthesized percussion hit.
    Drum(DrumPatch),
}

impl SoundSource {
    pub fn label(&self) -> &'static str {
        match self {
            SoundSource::Slice => "slice",
            SoundSource::Drum(patch) => patch.kind().name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_clamped() {
        let params = RemixParams {
            attack_ms: -3.0,
            release_ms: -1.0,
            master_volume: 1.7,
            mix_fader: -0.2,
            ..RemixParams::default()
        };

        assert_eq!(params.attack_ms(), 0.0);
        assert_eq!(params.release_ms(), 0.0);
        assert_eq!(params.master_volume(), 1.0);
        assert_eq!(params.mix_fader(), 0.0);
    }

    #[test]
    fn test_nan_levels_read_as_zero() {
        let params = RemixParams {
            attack_ms: f64::NAN,
            release_ms: f64::NAN,
            master_volume: f32::NAN,
            mix_fader: f32::NAN,
            ..RemixParams::default()
        };

        assert_eq!(params.attack_ms(), 0.0);
        assert_eq!(params.release_ms(), 0.0);
        assert_eq!(params.master_volume(), 0.0);
        assert_eq!(params.mix_fader(), 0.0);
    }

    #[test]
    fn test_defaults() {
        let params = RemixParams::default();
        assert_eq!(params.bpm.get(), 120);
        assert_eq!(params.weights(), ProbabilityTable::default());
        assert_eq!(SoundSource::default().label(), "slice");
    }
}
