//! Remix engine
//!
//! [`RemixEngine`] owns everything a running remix needs: parameters, the
//! loaded source, the scheduler, slice player, mixer and the visualization
//! bridge. All mutation happens through `&mut self`, one call at a time.
//!
//! # How It Works
//!
//! Time only moves when audio is rendered. [`RemixEngine::process_block`]
//! converts the scheduler's next due time into a frame offset, renders up to
//! that frame, dispatches the event, and repeats until the block is full.
//! Slices therefore start on the exact frame their timer names, whatever the
//! device block size is.
//!
//! ```text
//!   block:  |-------- render --------|E|---- render ----|E|-- render --|
//!                                     ^                  ^
//!                              Fire index 3        Cleanup index 1
//! ```
//!
//! Events dispatched here are the only place the session's sequence and
//! current index change.

pub mod mixer;
pub mod params;
pub mod scheduler;
pub mod slice;
pub mod timer;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

pub use params::{ParameterSource, RemixParams, SoundSource};
pub use scheduler::{EventScheduler, RemixEvent, ScheduledEvent, SchedulerState};

use self::mixer::LayerMixer;
use self::scheduler::DelayPhaseMarker;
use self::slice::SlicePlayer;
use self::timer::TimerHandle;
use crate::error::RemixError;
use crate::graph::node::RenderCtx;
use crate::io::bridge::{DelayPhaseId, NullBridge, VisualizationBridge};
use crate::io::{AudioOutput, AudioSink, SampleProvider, SourceBuffer};
use crate::sequencing::{Bpm, NoteValue, Preset, ProbabilityTable, Sequence, SequenceEntry};
use crate::MAX_BLOCK_SIZE;

pub struct RemixEngine<P: ParameterSource = RemixParams, B: VisualizationBridge = NullBridge> {
    params: P,
    bridge: B,
    source: Option<SourceBuffer>,
    scheduler: EventScheduler,
    player: SlicePlayer,
    mixer: LayerMixer,
    sound: SoundSource,
    rng: StdRng,
    sink: Option<Box<dyn AudioSink>>,
    sample_rate: u32,
    channels: usize,
    frames_rendered: u64,
}

impl RemixEngine {
    pub fn builder() -> RemixEngineBuilder {
        RemixEngineBuilder::new()
    }
}

impl<P: ParameterSource, B: VisualizationBridge> RemixEngine<P, B> {
    /// Replace the source buffer. A running remix is stopped first and the
    /// buffer is resampled to the engine rate if needed.
    pub fn load_source(&mut self, source: SourceBuffer) -> Result<(), RemixError> {
        if self.is_remixing() {
            self.stop_remix();
        }

        let source = source.resampled(self.sample_rate)?;
        self.scheduler.set_last_start(None);
        info!(
            frames = source.len(),
            channels = source.channel_count(),
            seconds = source.duration_secs(),
            "source loaded"
        );
        self.source = Some(source);
        Ok(())
    }

    pub fn load_from(&mut self, provider: &mut impl SampleProvider) -> Result<(), RemixError> {
        let source = provider.load()?;
        self.load_source(source)
    }

    pub fn source(&self) -> Option<&SourceBuffer> {
        self.source.as_ref()
    }

    pub fn set_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.sink = Some(sink);
    }

    /// Choose what each fired entry plays. Takes effect on the next fire.
    pub fn set_sound_source(&mut self, sound: SoundSource) {
        self.sound = sound;
    }

    pub fn sound_source(&self) -> SoundSource {
        self.sound
    }

    fn resume_sink(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            if sink.is_suspended() {
                if let Err(err) = sink.resume() {
                    warn!(%err, "audio sink did not resume");
                }
            }
        }
    }

    /// Generate a sequence and start scheduling it.
    ///
    /// Returns `Ok(false)` without doing anything when no source is loaded.
    /// An all-zero probability table fails with [`RemixError::EmptySelection`]
    /// and leaves the engine idle.
    pub fn start_remix(&mut self) -> Result<bool, RemixError> {
        let Some(source) = self.source.clone() else {
            warn!("no source loaded, remix not started");
            return Ok(false);
        };
        if self.is_remixing() {
            return Ok(true);
        }

        self.resume_sink();
        let bpm = self.params.bpm();
        let sequence = Sequence::generate(&self.params.weights(), bpm, &mut self.rng)?;

        self.mixer.set_fader(self.params.mix_fader());
        self.mixer.set_master(self.params.master_volume());
        self.mixer.start_background(source);

        let pass = self.scheduler.start(sequence);
        info!(pass, %bpm, "remix started");
        Ok(true)
    }

    /// Cancel every pending event and silence both layers. Safe to call in
    /// any state.
    pub fn stop_remix(&mut self) {
        let was_remixing = self.is_remixing();
        for id in self.scheduler.stop() {
            self.bridge.on_delay_phase_end(id);
        }
        self.mixer.stop();
        if was_remixing {
            info!("remix stopped");
        }
    }

    /// Start when idle, stop when running. Returns whether the engine is
    /// remixing afterwards.
    pub fn toggle_remix(&mut self) -> Result<bool, RemixError> {
        if self.is_remixing() {
            self.stop_remix();
            Ok(false)
        } else {
            self.start_remix()
        }
    }

    /// Freeze on the current entry, re-triggering it every eighth note at
    /// the current tempo. Ignored unless remixing.
    pub fn hold_press(&mut self) -> bool {
        if !self.is_remixing() {
            return false;
        }
        self.resume_sink();
        let interval_ms = NoteValue::Eighth.duration_ms(self.params.bpm());
        let held = self.scheduler.hold_press(interval_ms);
        if held {
            debug!(interval_ms, index = self.current_index(), "hold on");
        }
        held
    }

    pub fn hold_release(&mut self) -> bool {
        let released = self.scheduler.hold_release();
        if released {
            debug!("hold off");
        }
        released
    }

    /// Edit parameters and react to what changed.
    ///
    /// While remixing, a changed probability table regenerates the sequence
    /// and a changed tempo alone retimes it. Fader and master volume apply
    /// immediately. If regeneration fails the previous schedule keeps
    /// running and the error is returned.
    pub fn update_params(&mut self, edit: impl FnOnce(&mut P)) -> Result<(), RemixError> {
        let bpm = self.params.bpm();
        let weights = self.params.weights();
        let fader = self.params.mix_fader();
        let master = self.params.master_volume();

        edit(&mut self.params);

        if self.params.mix_fader() != fader {
            self.mixer.set_fader(self.params.mix_fader());
        }
        if self.params.master_volume() != master {
            self.mixer.set_master(self.params.master_volume());
        }
        if !self.is_remixing() {
            return Ok(());
        }

        let new_bpm = self.params.bpm();
        let new_weights = self.params.weights();
        if new_weights != weights {
            let sequence = Sequence::generate(&new_weights, new_bpm, &mut self.rng)?;
            let pass = self.scheduler.reschedule(sequence);
            debug!(pass, "probabilities changed, sequence regenerated");
        } else if new_bpm != bpm {
            if let Some(pass) = self.scheduler.retime(new_bpm) {
                debug!(pass, from = %bpm, to = %new_bpm, "tempo changed, sequence retimed");
            }
        }
        Ok(())
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Audio-clock time in seconds.
    pub fn now(&self) -> f64 {
        self.scheduler.now_ms() / 1000.0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_remixing(&self) -> bool {
        self.scheduler.is_remixing()
    }

    pub fn is_holding(&self) -> bool {
        self.scheduler.is_holding()
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn current_index(&self) -> usize {
        self.scheduler.current_index()
    }

    pub fn pending_event_count(&self) -> usize {
        self.scheduler.pending_event_count()
    }

    pub fn active_event_count(&self) -> usize {
        self.scheduler.active_event_count()
    }

    pub fn active_sequence(&self) -> Option<&Sequence> {
        self.scheduler.active_sequence()
    }

    pub fn scheduled_events(&self) -> Vec<ScheduledEvent> {
        self.scheduler.scheduled_events()
    }

    pub fn delay_phases(&self) -> impl Iterator<Item = (DelayPhaseId, &DelayPhaseMarker)> {
        self.scheduler.delay_phases()
    }

    /// Start frame of the most recent freshly drawn slice.
    pub fn last_start(&self) -> Option<usize> {
        self.scheduler.last_start()
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.active_voices()
    }

    pub fn background_gain(&self) -> f32 {
        self.mixer.background_gain()
    }

    pub fn remix_gain(&self) -> f32 {
        self.mixer.remix_gain()
    }

    pub fn master_gain(&self) -> f32 {
        self.mixer.master_gain()
    }

    fn render_ctx(&self) -> RenderCtx {
        RenderCtx::new(self.sample_rate as f32).with_time(self.now())
    }

    /// Render one block into `output`, dispatching every event that falls
    /// inside it at its own frame.
    pub fn process_block(&mut self, output: &mut AudioOutput) {
        let frames = output.frames();
        output.clear();

        let sample_rate = self.sample_rate as f64;
        let mut cursor = 0;

        while let Some(due_ms) = self.scheduler.next_due_ms() {
            let due_frame = (due_ms * sample_rate / 1000.0).round().max(0.0) as u64;
            let offset = due_frame.saturating_sub(self.frames_rendered) as usize;
            if offset > frames {
                break;
            }

            let offset = offset.max(cursor);
            let ctx = self.render_ctx();
            self.mixer.render(output, cursor..offset, &ctx);
            cursor = offset;

            if let Some((handle, event)) = self.scheduler.pop_due(due_ms) {
                self.dispatch(handle, event);
            }
        }

        let ctx = self.render_ctx();
        self.mixer.render(output, cursor..frames, &ctx);

        self.frames_rendered += frames as u64;
        self.scheduler
            .advance_to(self.frames_rendered as f64 * 1000.0 / sample_rate);
    }

    /// Render `ms` of audio and throw it away. Used to drive the engine
    /// without a device.
    pub fn advance(&mut self, ms: f64) {
        let total = (ms.max(0.0) * self.sample_rate as f64 / 1000.0).round() as usize;
        let mut output = AudioOutput::new(self.channels, MAX_BLOCK_SIZE);
        let mut remaining = total;
        while remaining > 0 {
            let frames = remaining.min(MAX_BLOCK_SIZE);
            output.set_frames(frames);
            self.process_block(&mut output);
            remaining -= frames;
        }
    }

    fn dispatch(&mut self, handle: TimerHandle, event: RemixEvent) {
        match event {
            RemixEvent::Fire { pass, index } => {
                if !self.scheduler.accepts(pass) {
                    warn!(pass, index, "dropping fire from a superseded pass");
                    return;
                }
                self.fire(handle, index);
            }
            RemixEvent::Cleanup { pass, index, fire } => {
                if !self.scheduler.accepts(pass) {
                    warn!(pass, index, "dropping cleanup from a superseded pass");
                    return;
                }
                self.scheduler.retire(fire, handle);
                self.report_progress(index);
            }
            RemixEvent::Continuation { pass } => {
                if !self.scheduler.accepts(pass) {
                    warn!(pass, "dropping continuation from a superseded pass");
                    return;
                }
                self.continue_remix();
            }
            RemixEvent::HoldTick => {
                if self.is_holding() && self.is_remixing() {
                    let index = self.current_index();
                    if let Some(entry) = self.entry(index) {
                        self.trigger(entry);
                    }
                }
                self.scheduler.rearm_hold();
            }
            RemixEvent::DelayPhaseEnd(id) => {
                if self.scheduler.close_delay_phase(id) {
                    self.bridge.on_delay_phase_end(id);
                }
            }
        }
    }

    fn entry(&self, index: usize) -> Option<SequenceEntry> {
        self.scheduler.active_sequence()?.get(index).copied()
    }

    fn fire(&mut self, handle: TimerHandle, index: usize) {
        let Some(entry) = self.entry(index) else {
            return;
        };
        self.trigger(entry);
        self.scheduler
            .mark_fired(index, handle, entry.duration_ms + self.params.release_ms());
        self.report_progress(index);
    }

    fn report_progress(&mut self, index: usize) {
        let total = self.scheduler.active_sequence().map_or(0, Sequence::len);
        let active = self.scheduler.active_event_count();
        self.bridge.on_sequence_progress(index, total, active);
    }

    /// Start a voice for `entry` on the remix layer.
    fn trigger(&mut self, entry: SequenceEntry) {
        let attack_ms = self.params.attack_ms();
        let release_ms = self.params.release_ms();

        match self.sound {
            SoundSource::Slice => {
                let Some(source) = self.source.as_ref() else {
                    return;
                };
                let mut last_start = self.scheduler.last_start();
                let start = self.player.choose_start(
                    source,
                    self.scheduler.is_holding(),
                    &mut last_start,
                    &mut self.rng,
                );
                self.scheduler.set_last_start(last_start);

                let voice = self
                    .player
                    .trigger(source, &entry, start, attack_ms, release_ms);
                self.bridge
                    .on_slice_start(voice.start(), voice.duration_samples());
                self.mixer.add_slice(voice);
            }
            SoundSource::Drum(patch) => {
                let ctx = self.render_ctx();
                let voice = patch.voice(self.rng.gen());
                self.mixer.add_drum(voice, &ctx);
            }
        }

        if let Some((id, marker)) =
            self.scheduler
                .open_delay_phase(entry.note_value, entry.duration_ms, release_ms)
        {
            self.bridge
                .on_delay_phase_start(id, marker.note_value, marker.start_time, marker.end_time);
        }
    }

    /// The armed pass ran out: draw the next sequence, or stop if the table
    /// has been emptied since.
    fn continue_remix(&mut self) {
        match Sequence::generate(&self.params.weights(), self.params.bpm(), &mut self.rng) {
            Ok(sequence) => {
                let pass = self.scheduler.reschedule(sequence);
                debug!(pass, "sequence exhausted, next pass armed");
            }
            Err(err) => {
                warn!(%err, "cannot continue remix, stopping");
                self.stop_remix();
            }
        }
    }
}

/// Configures and builds a [`RemixEngine`].
///
/// ```
/// use saavy_remix::RemixEngine;
/// use saavy_remix::sequencing::Preset;
///
/// let engine = RemixEngine::builder()
///     .sample_rate(44_100)
///     .channels(2)
///     .bpm(96)
///     .preset(Preset::Break)
///     .seed(7)
///     .build();
///
/// assert_eq!(engine.params().bpm.get(), 96);
/// assert!(!engine.is_remixing());
/// ```
pub struct RemixEngineBuilder<P: ParameterSource = RemixParams, B: VisualizationBridge = NullBridge> {
    params: P,
    bridge: B,
    sample_rate: u32,
    channels: usize,
    seed: Option<u64>,
    sound: SoundSource,
}

impl RemixEngineBuilder {
    pub fn new() -> Self {
        Self {
            params: RemixParams::default(),
            bridge: NullBridge,
            sample_rate: 48_000,
            channels: 2,
            seed: None,
            sound: SoundSource::Slice,
        }
    }
}

impl Default for RemixEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: VisualizationBridge> RemixEngineBuilder<RemixParams, B> {
    /// Tempo; values of 0 are raised to 1.
    pub fn bpm(mut self, bpm: u32) -> Self {
        self.params.bpm = Bpm::new(bpm.max(1)).unwrap_or_default();
        self
    }

    pub fn preset(mut self, preset: Preset) -> Self {
        self.params.weights = preset.table();
        self
    }

    pub fn weights(mut self, weights: ProbabilityTable) -> Self {
        self.params.weights = weights;
        self
    }

    pub fn attack_ms(mut self, attack_ms: f64) -> Self {
        self.params.attack_ms = attack_ms;
        self
    }

    pub fn release_ms(mut self, release_ms: f64) -> Self {
        self.params.release_ms = release_ms;
        self
    }

    pub fn mix_fader(mut self, fader: f32) -> Self {
        self.params.mix_fader = fader;
        self
    }

    pub fn master_volume(mut self, volume: f32) -> Self {
        self.params.master_volume = volume;
        self
    }
}

impl<P: ParameterSource, B: VisualizationBridge> RemixEngineBuilder<P, B> {
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate.max(1);
        self
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels.max(1);
        self
    }

    /// Fix the random seed for reproducible sequences and slice positions.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn sound_source(mut self, sound: SoundSource) -> Self {
        self.sound = sound;
        self
    }

    /// Use a custom parameter source.
    pub fn params<Q: ParameterSource>(self, params: Q) -> RemixEngineBuilder<Q, B> {
        RemixEngineBuilder {
            params,
            bridge: self.bridge,
            sample_rate: self.sample_rate,
            channels: self.channels,
            seed: self.seed,
            sound: self.sound,
        }
    }

    pub fn bridge<C: VisualizationBridge>(self, bridge: C) -> RemixEngineBuilder<P, C> {
        RemixEngineBuilder {
            params: self.params,
            bridge,
            sample_rate: self.sample_rate,
            channels: self.channels,
            seed: self.seed,
            sound: self.sound,
        }
    }

    pub fn build(self) -> RemixEngine<P, B> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut mixer = LayerMixer::new(self.channels);
        mixer.set_fader(self.params.mix_fader());
        mixer.set_master(self.params.master_volume());

        RemixEngine {
            params: self.params,
            bridge: self.bridge,
            source: None,
            scheduler: EventScheduler::new(),
            player: SlicePlayer::new(),
            mixer,
            sound: self.sound,
            rng,
            sink: None,
            sample_rate: self.sample_rate,
            channels: self.channels,
            frames_rendered: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::bridge::BridgeEvent;
    use crate::voices::{DrumKind, DrumPatch};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SAMPLE_RATE: u32 = 8_000;

    fn engine(weights: ProbabilityTable) -> RemixEngine<RemixParams, Vec<BridgeEvent>> {
        let mut engine = RemixEngine::builder()
            .sample_rate(SAMPLE_RATE)
            .channels(1)
            .weights(weights)
            .seed(11)
            .bridge(Vec::new())
            .build();
        let source = SourceBuffer::from_mono(vec![0.25; SAMPLE_RATE as usize * 4], SAMPLE_RATE).unwrap();
        engine.load_source(source).unwrap();
        engine
    }

    fn quarters() -> ProbabilityTable {
        ProbabilityTable::from_weights(&[(NoteValue::Quarter, 100)])
    }

    #[test]
    fn test_start_without_source_is_noop() {
        let mut engine = RemixEngine::builder().seed(1).build();
        assert!(!engine.start_remix().unwrap());
        assert_eq!(engine.state(), SchedulerState::Idle);
        assert_eq!(engine.pending_event_count(), 0);
    }

    #[test]
    fn test_empty_table_refuses_to_start() {
        let mut engine = engine(ProbabilityTable::empty());
        assert!(matches!(engine.start_remix(), Err(RemixError::EmptySelection)));
        assert!(!engine.is_remixing());
        assert!(engine.active_sequence().is_none());
    }

    #[test]
    fn test_fire_reports_slice_and_progress() {
        let mut engine = engine(quarters());
        assert!(engine.start_remix().unwrap());
        engine.advance(10.0);

        let events = engine.bridge().clone();
        assert!(matches!(
            events[0],
            BridgeEvent::SliceStart {
                duration_samples: 4_000,
                ..
            }
        ));
        assert!(matches!(
            events[1],
            BridgeEvent::SequenceProgress {
                index: 0,
                total: 128,
                ..
            }
        ));
        assert_eq!(engine.active_voices(), 1);
    }

    #[test]
    fn test_fire_lands_on_exact_frame() {
        let mut engine = engine(quarters());
        engine.start_remix().unwrap();

        engine.advance(499.0);
        assert_eq!(engine.current_index(), 0);
        engine.advance(1.0);
        assert_eq!(engine.current_index(), 1);
    }

    #[test]
    fn test_cleanup_retires_events() {
        let mut engine = engine(quarters());
        engine.start_remix().unwrap();
        // 128 fires + continuation
        assert_eq!(engine.active_event_count(), 129);

        engine.advance(10.0);
        // fire 0 fired and armed its cleanup
        assert_eq!(engine.active_event_count(), 130);
        engine.advance(490.0);
        // cleanup 0 retired its pair, fire 1 armed another cleanup
        assert_eq!(engine.active_event_count(), 129);
    }

    #[test]
    fn test_stop_resets_immediately() {
        let mut engine = engine(quarters());
        engine.start_remix().unwrap();
        engine.advance(1_200.0);
        assert_eq!(engine.current_index(), 2);

        engine.stop_remix();
        assert_eq!(engine.pending_event_count(), 0);
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.active_voices(), 0);
        assert!(engine.active_sequence().is_none());

        let before = engine.bridge().len();
        engine.advance(5_000.0);
        assert_eq!(engine.bridge().len(), before, "nothing fires after stop");
    }

    #[test]
    fn test_stop_closes_delay_phases() {
        let mut engine = engine(quarters());
        engine.update_params(|p| p.release_ms = 200.0).unwrap();
        engine.start_remix().unwrap();
        engine.advance(10.0);
        assert_eq!(engine.delay_phases().count(), 1);

        engine.stop_remix();
        assert!(matches!(
            engine.bridge().last(),
            Some(BridgeEvent::DelayPhaseEnd { .. })
        ));
        assert_eq!(engine.delay_phases().count(), 0);
    }

    #[test]
    fn test_weight_edit_regenerates() {
        let mut engine = engine(quarters());
        engine.start_remix().unwrap();
        engine.advance(100.0);

        engine
            .update_params(|p| p.weights = ProbabilityTable::from_weights(&[(NoteValue::Half, 100)]))
            .unwrap();
        let sequence = engine.active_sequence().unwrap();
        assert!(sequence.note_values().all(|n| n == NoteValue::Half));

        let offsets: Vec<f64> = engine
            .scheduled_events()
            .iter()
            .take(2)
            .map(|e| e.fire_at_ms)
            .collect();
        assert_eq!(offsets, vec![100.0, 1_100.0]);
    }

    #[test]
    fn test_failed_regeneration_keeps_schedule() {
        let mut engine = engine(quarters());
        engine.start_remix().unwrap();
        let pending = engine.pending_event_count();

        let result = engine.update_params(|p| p.weights = ProbabilityTable::empty());
        assert!(matches!(result, Err(RemixError::EmptySelection)));
        assert!(engine.is_remixing());
        assert_eq!(engine.pending_event_count(), pending);
    }

    #[test]
    fn test_bpm_edit_retimes() {
        let mut engine = engine(Preset::Break.table());
        engine.start_remix().unwrap();
        let before: Vec<NoteValue> = engine.active_sequence().unwrap().note_values().collect();
        let old_durations: Vec<f64> = engine
            .active_sequence()
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.duration_ms)
            .collect();

        engine.update_params(|p| p.bpm = Bpm::new(60).unwrap()).unwrap();
        let sequence = engine.active_sequence().unwrap();
        let after: Vec<NoteValue> = sequence.note_values().collect();
        assert_eq!(before, after);
        for (old, entry) in old_durations.iter().zip(sequence.entries()) {
            assert!((entry.duration_ms - old * 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_idle_edits_only_change_params() {
        let mut engine = engine(quarters());
        engine.update_params(|p| p.bpm = Bpm::new(90).unwrap()).unwrap();
        assert_eq!(engine.params().bpm.get(), 90);
        assert_eq!(engine.pending_event_count(), 0);
    }

    #[test]
    fn test_fader_applies_immediately() {
        let mut engine = engine(quarters());
        engine.update_params(|p| p.mix_fader = 1.0).unwrap();
        assert_eq!((engine.background_gain(), engine.remix_gain()), (1.0, 0.0));
        engine.update_params(|p| p.mix_fader = 0.0).unwrap();
        assert_eq!((engine.background_gain(), engine.remix_gain()), (0.0, 1.0));
    }

    #[test]
    fn test_hold_reuses_last_start() {
        let mut engine = engine(quarters());
        engine.start_remix().unwrap();
        engine.advance(10.0);
        let held_start = engine.last_start().unwrap();

        assert!(engine.hold_press());
        engine.advance(2_000.0);
        let starts: Vec<usize> = engine
            .bridge()
            .iter()
            .filter_map(|e| match e {
                BridgeEvent::SliceStart { start_sample, .. } => Some(*start_sample),
                _ => None,
            })
            .collect();
        // 4 scheduled fires plus 8 hold ticks, all from the same place
        assert_eq!(starts.len(), 13);
        assert!(starts.iter().all(|&s| s == held_start));

        assert!(engine.hold_release());
        engine.advance(1_000.0);
        assert_ne!(engine.last_start(), Some(held_start));
    }

    #[test]
    fn test_continuation_replaces_sequence() {
        let mut engine = engine(quarters());
        engine.start_remix().unwrap();
        let first_pass = engine.scheduled_events()[0].handle;

        // 128 quarters at 120 BPM
        engine.advance(64_000.0);
        assert!(engine.is_remixing());
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.active_sequence().unwrap().len(), 128);
        assert!(engine.scheduled_events().iter().all(|e| e.handle != first_pass));
    }

    #[test]
    fn test_emptied_table_stops_at_continuation() {
        let mut engine = engine(ProbabilityTable::from_weights(&[(NoteValue::Sixteenth, 100)]));
        engine.start_remix().unwrap();

        // Edits to an empty table fail and keep the old schedule running...
        let _ = engine.update_params(|p| p.weights = ProbabilityTable::empty());
        // ...until the pass runs out.
        engine.advance(128.0 * 125.0);
        assert!(!engine.is_remixing());
        assert_eq!(engine.pending_event_count(), 0);
    }

    #[test]
    fn test_drum_source_skips_slice_events() {
        let mut engine = engine(quarters());
        engine.set_sound_source(SoundSource::Drum(DrumPatch::new(DrumKind::Kick)));
        engine.start_remix().unwrap();
        engine.advance(10.0);

        assert!(engine
            .bridge()
            .iter()
            .all(|e| !matches!(e, BridgeEvent::SliceStart { .. })));
        assert_eq!(engine.active_voices(), 1);
    }

    #[test]
    fn test_suspended_sink_is_resumed() {
        struct CountingSink(Arc<AtomicUsize>);

        impl AudioSink for CountingSink {
            fn is_suspended(&self) -> bool {
                true
            }

            fn resume(&mut self) -> Result<(), RemixError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(RemixError::Sink("device unplugged".to_string()))
            }
        }

        let resumes = Arc::new(AtomicUsize::new(0));
        let mut engine = engine(quarters());
        engine.set_sink(Box::new(CountingSink(resumes.clone())));

        assert!(engine.start_remix().unwrap(), "resume failure is not fatal");
        assert_eq!(resumes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_output_mixes_background() {
        let mut engine = engine(quarters());
        engine.update_params(|p| p.mix_fader = 1.0).unwrap();
        engine.start_remix().unwrap();

        let mut output = AudioOutput::new(1, 64);
        engine.process_block(&mut output);
        assert!(output.buffers[0].iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }
}
