use rand::Rng;

use super::duration::{Bpm, NoteValue};
use super::probability::ProbabilityTable;
use crate::error::RemixError;

/// Number of entries in every generated remix sequence.
pub const SEQUENCE_LENGTH: usize = 128;

/// A single step of a remix sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceEntry {
    /// Which note value was drawn for this step
    pub note_value: NoteValue,
    /// How long the step lasts at the sequence tempo (milliseconds)
    pub duration_ms: f64,
}

impl SequenceEntry {
    pub fn new(note_value: NoteValue, bpm: Bpm) -> Self {
        Self {
            note_value,
            duration_ms: note_value.duration_ms(bpm),
        }
    }
}

/// An ordered list of timed steps played back to back
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    entries: Vec<SequenceEntry>,
    bpm: Bpm,
}

impl Sequence {
    /// Draw [`SEQUENCE_LENGTH`] independent note values from `table`.
    pub fn generate<R: Rng + ?Sized>(
        table: &ProbabilityTable,
        bpm: Bpm,
        rng: &mut R,
    ) -> Result<Self, RemixError> {
        if table.is_empty() {
            return Err(RemixError::EmptySelection);
        }

        let entries = (0..SEQUENCE_LENGTH)
            .map(|_| table.sample(rng).map(|note| SequenceEntry::new(note, bpm)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries, bpm })
    }

    /// Build a sequence from explicit note values (any length).
    pub fn from_note_values(notes: impl IntoIterator<Item = NoteValue>, bpm: Bpm) -> Self {
        let entries = notes
            .into_iter()
            .map(|note| SequenceEntry::new(note, bpm))
            .collect();
        Self { entries, bpm }
    }

    /// Recompute every duration for a new tempo, keeping the note values.
    pub fn retime(&mut self, bpm: Bpm) {
        self.bpm = bpm;
        for entry in &mut self.entries {
            entry.duration_ms = entry.note_value.duration_ms(bpm);
        }
    }

    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&SequenceEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bpm(&self) -> Bpm {
        self.bpm
    }

    pub fn note_values(&self) -> impl Iterator<Item = NoteValue> + '_ {
        self.entries.iter().map(|entry| entry.note_value)
    }

    /// Start offset of each entry: the running sum of the durations before it.
    pub fn offsets(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().scan(0.0, |elapsed, entry| {
            let start = *elapsed;
            *elapsed += entry.duration_ms;
            Some(start)
        })
    }

    /// Sum of all durations; the point where the next pass begins.
    pub fn total_ms(&self) -> f64 {
        self.entries.iter().fold(0.0, |acc, entry| acc + entry.duration_ms)
    }
}
