//! Display state for the UI
//!
//! Two sources feed the screen: a snapshot copied out of the engine under its
//! lock once per frame, and the bridge events drained from the ring buffer.

use saavy_remix::{
    engine::{ParameterSource, RemixParams},
    io::bridge::{DelayPhaseId, RingBridge, VisualizationBridge},
    sequencing::{Bpm, NoteValue, ProbabilityTable},
    RemixEngine,
};

/// Engine values shown on screen.
#[derive(Clone, Debug)]
pub struct EngineSnapshot {
    pub bpm: Bpm,
    pub attack_ms: f64,
    pub release_ms: f64,
    pub master_volume: f32,
    pub mix_fader: f32,
    pub weights: ProbabilityTable,
    pub is_remixing: bool,
    pub is_holding: bool,
    pub current_index: usize,
    pub pending_events: usize,
    pub active_events: usize,
    pub active_voices: usize,
    pub sound: &'static str,
    /// Note values of the active sequence (empty when idle)
    pub sequence: Vec<NoteValue>,
    pub sample_rate: u32,
    pub source_frames: usize,
    /// Audio-clock seconds
    pub now: f64,
}

impl EngineSnapshot {
    pub fn capture(engine: &RemixEngine<RemixParams, RingBridge>) -> Self {
        let params = engine.params();
        Self {
            bpm: params.bpm(),
            attack_ms: params.attack_ms(),
            release_ms: params.release_ms(),
            master_volume: params.master_volume(),
            mix_fader: params.mix_fader(),
            weights: params.weights(),
            is_remixing: engine.is_remixing(),
            is_holding: engine.is_holding(),
            current_index: engine.current_index(),
            pending_events: engine.pending_event_count(),
            active_events: engine.active_event_count(),
            active_voices: engine.active_voices(),
            sound: engine.sound_source().label(),
            sequence: engine
                .active_sequence()
                .map(|s| s.note_values().collect())
                .unwrap_or_default(),
            sample_rate: engine.sample_rate(),
            source_frames: engine.source().map_or(0, |s| s.len()),
            now: engine.now(),
        }
    }

    /// Note value playing right now, if any.
    pub fn current_note(&self) -> Option<NoteValue> {
        if self.is_remixing {
            self.sequence.get(self.current_index).copied()
        } else {
            None
        }
    }
}

/// An open release tail.
#[derive(Clone, Copy, Debug)]
pub struct DelayPhase {
    pub id: DelayPhaseId,
    pub note_value: NoteValue,
    pub start_time: f64,
    pub end_time: f64,
}

/// Bridge events folded into what the screen needs.
#[derive(Clone, Debug, Default)]
pub struct BridgeView {
    /// (start frame, length in frames) of the latest slice
    pub last_slice: Option<(usize, usize)>,
    /// (index, total, active events) of the latest progress report
    pub progress: Option<(usize, usize, usize)>,
    pub delay_phases: Vec<DelayPhase>,
    pub slices_started: u64,
}

impl BridgeView {
    /// Forget everything, e.g. after a stop.
    pub fn reset(&mut self) {
        self.progress = None;
        self.delay_phases.clear();
    }

    /// True if a release tail of `note` is sounding at `now`.
    pub fn in_delay_phase(&self, note: NoteValue, now: f64) -> bool {
        self.delay_phases
            .iter()
            .any(|phase| phase.note_value == note && phase.start_time <= now)
    }
}

impl VisualizationBridge for BridgeView {
    fn on_slice_start(&mut self, start_sample: usize, duration_samples: usize) {
        self.last_slice = Some((start_sample, duration_samples));
        self.slices_started += 1;
    }

    fn on_sequence_progress(&mut self, index: usize, total: usize, active_events: usize) {
        self.progress = Some((index, total, active_events));
    }

    fn on_delay_phase_start(&mut self, id: DelayPhaseId, note_value: NoteValue, start_time: f64, end_time: f64) {
        self.delay_phases.push(DelayPhase {
            id,
            note_value,
            start_time,
            end_time,
        });
    }

    fn on_delay_phase_end(&mut self, id: DelayPhaseId) {
        self.delay_phases.retain(|phase| phase.id != id);
    }
}
