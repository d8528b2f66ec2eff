use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::RemixError;

/// Musical note duration represented as a rational fraction of a whole note.
/// All operations preserve exact ratios; floats only appear at `to_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    /// Numerator: how many parts
    pub numerator: u32,
    /// Denominator: of what size (4 = quarter, 8 = eighth, etc.)
    pub denominator: u32,
}

impl Duration {
    pub const HALF: Duration = Duration {
        numerator: 1,
        denominator: 2,
    };
    pub const QUARTER: Duration = Duration {
        numerator: 1,
        denominator: 4,
    };
    pub const EIGHTH: Duration = Duration {
        numerator: 1,
        denominator: 8,
    };
    /// A third of a beat
    pub const TWELFTH: Duration = Duration {
        numerator: 1,
        denominator: 12,
    };
    pub const SIXTEENTH: Duration = Duration {
        numerator: 1,
        denominator: 16,
    };

    /// General tuplet: `played` notes in the time of `in_time_of` notes
    /// E.g., `.tuplet(2, 3)` = triplet (3 in time of 2)
    ///       `.tuplet(4, 3)` = 3 in the time of 4, each note a third longer
    pub const fn tuplet(self, in_time_of: u32, played: u32) -> Self {
        Duration {
            numerator: self.numerator * in_time_of,
            denominator: self.denominator * played,
        }
    }

    /// Stretch the duration by 4/3, the "T" variants of the remix catalog.
    pub const fn extended(self) -> Self {
        self.tuplet(4, 3).reduce()
    }

    /// Reduce the fraction to lowest terms using GCD
    pub const fn reduce(self) -> Self {
        let gcd = const_gcd(self.numerator, self.denominator);
        Duration {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }

    /// Convert this duration to milliseconds at the given tempo.
    ///
    /// A beat is a quarter note, so a whole note spans four beats:
    ///   ms = beat_ms * 4 * numerator / denominator
    pub fn to_ms(self, bpm: Bpm) -> f64 {
        bpm.beat_ms() * (4 * self.numerator) as f64 / self.denominator as f64
    }
}

/// Compute greatest common divisor (Euclidean algorithm)
/// Used to reduce fractions to lowest terms
const fn const_gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

/// Tempo in beats per minute. Always greater than zero.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "u32", into = "u32")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bpm(u32);

impl Bpm {
    pub const DEFAULT: Bpm = Bpm(120);

    pub fn new(bpm: u32) -> Result<Self, RemixError> {
        if bpm == 0 {
            return Err(RemixError::InvalidBpm(bpm));
        }
        Ok(Self(bpm))
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Length of one beat (a quarter note) in milliseconds.
    pub fn beat_ms(self) -> f64 {
        60_000.0 / self.0 as f64
    }

    /// Step the tempo by `delta`, staying at or above 1 BPM.
    pub fn saturating_add(self, delta: i32) -> Self {
        Self(self.0.saturating_add_signed(delta).max(1))
    }
}

impl Default for Bpm {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Bpm {
    type Error = RemixError;

    fn try_from(bpm: u32) -> Result<Self, Self::Error> {
        Self::new(bpm)
    }
}

impl From<Bpm> for u32 {
    fn from(bpm: Bpm) -> Self {
        bpm.0
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// One of the ten note values a remix sequence is built from.
///
/// Declaration order is the catalog order: it fixes how weights are laid out
/// in a probability table and the order entries are visited when sampling.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoteValue {
    Sixteenth,
    SixteenthExtended,
    Twelfth,
    TwelfthExtended,
    Eighth,
    EighthExtended,
    Quarter,
    QuarterExtended,
    Half,
    HalfExtended,
}

impl NoteValue {
    pub const COUNT: usize = 10;

    pub const ALL: [NoteValue; NoteValue::COUNT] = [
        NoteValue::Sixteenth,
        NoteValue::SixteenthExtended,
        NoteValue::Twelfth,
        NoteValue::TwelfthExtended,
        NoteValue::Eighth,
        NoteValue::EighthExtended,
        NoteValue::Quarter,
        NoteValue::QuarterExtended,
        NoteValue::Half,
        NoteValue::HalfExtended,
    ];

    /// Position in the catalog.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn label(self) -> &'static str {
        match self {
            NoteValue::Sixteenth => "1/16",
            NoteValue::SixteenthExtended => "1/16T",
            NoteValue::Twelfth => "1/12",
            NoteValue::TwelfthExtended => "1/12T",
            NoteValue::Eighth => "1/8",
            NoteValue::EighthExtended => "1/8T",
            NoteValue::Quarter => "1/4",
            NoteValue::QuarterExtended => "1/4T",
            NoteValue::Half => "1/2",
            NoteValue::HalfExtended => "1/2T",
        }
    }

    pub const fn is_extended(self) -> bool {
        matches!(
            self,
            NoteValue::SixteenthExtended
                | NoteValue::TwelfthExtended
                | NoteValue::EighthExtended
                | NoteValue::QuarterExtended
                | NoteValue::HalfExtended
        )
    }

    pub const fn duration(self) -> Duration {
        match self {
            NoteValue::Sixteenth => Duration::SIXTEENTH,
            NoteValue::SixteenthExtended => Duration::SIXTEENTH.extended(),
            NoteValue::Twelfth => Duration::TWELFTH,
            NoteValue::TwelfthExtended => Duration::TWELFTH.extended(),
            NoteValue::Eighth => Duration::EIGHTH,
            NoteValue::EighthExtended => Duration::EIGHTH.extended(),
            NoteValue::Quarter => Duration::QUARTER,
            NoteValue::QuarterExtended => Duration::QUARTER.extended(),
            NoteValue::Half => Duration::HALF,
            NoteValue::HalfExtended => Duration::HALF.extended(),
        }
    }

    pub fn duration_ms(self, bpm: Bpm) -> f64 {
        self.duration().to_ms(bpm)
    }
}

/// Milliseconds spanned by `note` at `bpm`.
pub fn duration_ms(note: NoteValue, bpm: Bpm) -> f64 {
    note.duration_ms(bpm)
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NoteValue {
    type Err = RemixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NoteValue::ALL
            .into_iter()
            .find(|note| note.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RemixError::UnknownNoteValue(s.to_string()))
    }
}
