pub mod duration;
pub mod probability;
pub mod sequence;

pub use duration::{duration_ms, Bpm, Duration, NoteValue};
pub use probability::{Preset, ProbabilityTable, MAX_TOTAL_WEIGHT, MAX_WEIGHT};
pub use sequence::{Sequence, SequenceEntry, SEQUENCE_LENGTH};
