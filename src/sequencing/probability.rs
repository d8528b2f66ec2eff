//! Weighted note-value selection.
//!
//! A [`ProbabilityTable`] holds one integer weight (0..=100) per note value.
//! Drawing walks the catalog in order, accumulating weights, and returns the
//! first value whose running total reaches the draw:
//!
//! ```text
//!   weights   1/16:50   1/8:30   1/4:20        total = 100
//!   ranges    [0, 50]   (50, 80]  (80, 100)
//! ```
//!
//! The weights need not sum to 100. Zero-weight entries are never chosen.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::duration::NoteValue;
use crate::error::RemixError;

/// Largest weight a single note value can hold.
pub const MAX_WEIGHT: u8 = 100;
/// Ceiling on the table total when edits go through the constrained setter.
pub const MAX_TOTAL_WEIGHT: u32 = 100;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbabilityTable {
    weights: [u8; NoteValue::COUNT],
}

impl ProbabilityTable {
    /// A table with every weight at zero.
    pub const fn empty() -> Self {
        Self {
            weights: [0; NoteValue::COUNT],
        }
    }

    pub fn from_weights(pairs: &[(NoteValue, u8)]) -> Self {
        let mut table = Self::empty();
        for &(note, weight) in pairs {
            table.set_weight(note, weight);
        }
        table
    }

    pub fn weight(&self, note: NoteValue) -> u8 {
        self.weights[note.index()]
    }

    /// Set a weight directly, clamped to [`MAX_WEIGHT`].
    pub fn set_weight(&mut self, note: NoteValue, weight: u8) {
        self.weights[note.index()] = weight.min(MAX_WEIGHT);
    }

    /// Set a weight so the table total never exceeds [`MAX_TOTAL_WEIGHT`].
    ///
    /// If the requested value would push the total over, the edited entry is
    /// lowered to whatever headroom the other entries leave. Returns the value
    /// actually stored.
    pub fn set_weight_constrained(&mut self, note: NoteValue, weight: u8) -> u8 {
        let weight = weight.min(MAX_WEIGHT);
        let others = self.total() - self.weight(note) as u32;
        let applied = if others + weight as u32 > MAX_TOTAL_WEIGHT {
            MAX_TOTAL_WEIGHT.saturating_sub(others) as u8
        } else {
            weight
        };
        self.weights[note.index()] = applied;
        applied
    }

    pub fn total(&self) -> u32 {
        self.weights.iter().map(|&w| w as u32).sum()
    }

    /// True when no note value can be drawn.
    pub fn is_empty(&self) -> bool {
        self.weights.iter().all(|&w| w == 0)
    }

    /// Note values with a non-zero weight, in catalog order.
    pub fn enabled(&self) -> impl Iterator<Item = (NoteValue, u8)> + '_ {
        NoteValue::ALL
            .into_iter()
            .map(|note| (note, self.weight(note)))
            .filter(|&(_, weight)| weight > 0)
    }

    /// Map a draw in `[0, total)` onto a note value.
    ///
    /// Pure: the same draw always yields the same note. Draws at or past the
    /// total land on the last enabled entry.
    pub fn pick(&self, draw: f64) -> Result<NoteValue, RemixError> {
        let mut cumulative = 0.0;
        let mut last = None;
        for (note, weight) in self.enabled() {
            cumulative += weight as f64;
            if cumulative >= draw {
                return Ok(note);
            }
            last = Some(note);
        }
        last.ok_or(RemixError::EmptySelection)
    }

    /// Draw a note value with probability proportional to its weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<NoteValue, RemixError> {
        if self.is_empty() {
            return Err(RemixError::EmptySelection);
        }
        let draw = rng.gen_range(0.0..self.total() as f64);
        self.pick(draw)
    }
}

impl Default for ProbabilityTable {
    fn default() -> Self {
        Preset::default().table()
    }
}

/// Named weight layouts offered as starting points.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Preset {
    /// Every note value weighted evenly.
    Equal,
    /// Straight sixteenths.
    #[default]
    Chop,
    Shuffle,
    Swing,
    Break,
    Dub,
    Slow,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Equal,
        Preset::Chop,
        Preset::Shuffle,
        Preset::Swing,
        Preset::Break,
        Preset::Dub,
        Preset::Slow,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Preset::Equal => "equal",
            Preset::Chop => "chop",
            Preset::Shuffle => "shuffle",
            Preset::Swing => "swing",
            Preset::Break => "break",
            Preset::Dub => "dub",
            Preset::Slow => "slow",
        }
    }

    pub fn table(self) -> ProbabilityTable {
        use NoteValue::*;

        match self {
            Preset::Equal => {
                let share = (MAX_TOTAL_WEIGHT / NoteValue::COUNT as u32) as u8;
                let mut remainder = MAX_TOTAL_WEIGHT % NoteValue::COUNT as u32;
                let mut table = ProbabilityTable::empty();
                for note in NoteValue::ALL {
                    let extra = if remainder > 0 {
                        remainder -= 1;
                        1
                    } else {
                        0
                    };
                    table.set_weight(note, share + extra);
                }
                table
            }
            Preset::Chop => ProbabilityTable::from_weights(&[(Sixteenth, 100)]),
            Preset::Shuffle => {
                ProbabilityTable::from_weights(&[(SixteenthExtended, 50), (Quarter, 50)])
            }
            Preset::Swing => ProbabilityTable::from_weights(&[
                (Eighth, 40),
                (EighthExtended, 30),
                (QuarterExtended, 30),
            ]),
            Preset::Break => {
                ProbabilityTable::from_weights(&[(Quarter, 60), (Eighth, 25), (Sixteenth, 15)])
            }
            Preset::Dub => ProbabilityTable::from_weights(&[(Half, 70), (Quarter, 20), (Eighth, 10)]),
            Preset::Slow => ProbabilityTable::from_weights(&[(Half, 100)]),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = RemixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RemixError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use NoteValue::*;

    #[test]
    fn test_pick_walks_cumulative_ranges() {
        let table = ProbabilityTable::from_weights(&[(Sixteenth, 50), (Eighth, 30), (Quarter, 20)]);

        assert_eq!(table.pick(0.0).unwrap(), Sixteenth);
        assert_eq!(table.pick(50.0).unwrap(), Sixteenth);
        assert_eq!(table.pick(50.5).unwrap(), Eighth);
        assert_eq!(table.pick(80.0).unwrap(), Eighth);
        assert_eq!(table.pick(99.9).unwrap(), Quarter);
        assert_eq!(table.pick(250.0).unwrap(), Quarter);
    }

    #[test]
    fn test_pick_on_empty_table_fails() {
        let table = ProbabilityTable::empty();
        assert!(matches!(table.pick(0.0), Err(RemixError::EmptySelection)));

        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(table.sample(&mut rng), Err(RemixError::EmptySelection)));
    }

    #[test]
    fn test_single_entry_always_chosen() {
        let table = ProbabilityTable::from_weights(&[(QuarterExtended, 7)]);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            assert_eq!(table.sample(&mut rng).unwrap(), QuarterExtended);
        }
    }

    #[test]
    fn test_zero_weights_never_drawn() {
        let table = ProbabilityTable::from_weights(&[(Eighth, 1), (Half, 99)]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let note = table.sample(&mut rng).unwrap();
            assert!(note == Eighth || note == Half, "drew disabled value {note}");
        }
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let table = ProbabilityTable::from_weights(&[(Sixteenth, 25), (Quarter, 75)]);
        let mut rng = StdRng::seed_from_u64(1234);
        let draws = 20_000;
        let quarters = (0..draws)
            .filter(|_| table.sample(&mut rng).unwrap() == Quarter)
            .count();

        let ratio = quarters as f64 / draws as f64;
        assert!((ratio - 0.75).abs() < 0.02, "quarter ratio was {ratio}");
    }

    #[test]
    fn test_set_weight_clamps() {
        let mut table = ProbabilityTable::empty();
        table.set_weight(Eighth, 250);
        assert_eq!(table.weight(Eighth), MAX_WEIGHT);
    }

    #[test]
    fn test_constrained_edit_respects_total() {
        let mut table = ProbabilityTable::from_weights(&[(Sixteenth, 60), (Eighth, 30)]);

        assert_eq!(table.set_weight_constrained(Quarter, 50), 10);
        assert_eq!(table.total(), 100);

        // Lowering is always allowed.
        assert_eq!(table.set_weight_constrained(Sixteenth, 20), 20);
        assert_eq!(table.total(), 60);

        // The edited entry's own weight does not count against it.
        assert_eq!(table.set_weight_constrained(Eighth, 70), 70);
        assert_eq!(table.total(), 100);
    }

    #[test]
    fn test_presets() {
        assert_eq!(Preset::default(), Preset::Chop);
        assert_eq!(ProbabilityTable::default().weight(Sixteenth), 100);

        let equal = Preset::Equal.table();
        assert!(NoteValue::ALL.iter().all(|&n| equal.weight(n) == 10));

        let swing = Preset::Swing.table();
        assert_eq!(swing.weight(Eighth), 40);
        assert_eq!(swing.weight(EighthExtended), 30);
        assert_eq!(swing.weight(QuarterExtended), 30);

        for preset in Preset::ALL {
            assert_eq!(preset.table().total(), 100, "{preset} should sum to 100");
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert!(matches!(
            "polka".parse::<Preset>(),
            Err(RemixError::UnknownPreset(_))
        ));
    }
}
