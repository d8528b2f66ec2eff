//! TUI module for remix
//!
//! Draws the engine state and turns key presses into engine calls. The
//! engine is locked briefly for each key and once per frame for a snapshot.

pub mod state;
mod timeline;
mod transport;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use std::sync::MutexGuard;
use std::time::Duration;
use tracing::warn;

use saavy_remix::{
    engine::{RemixParams, SoundSource},
    io::bridge::{BridgeEvent, RingBridge},
    sequencing::{NoteValue, Preset},
    voices::{DrumKind, DrumPatch},
    RemixEngine, RemixError,
};

pub use state::{BridgeView, EngineSnapshot};

use super::app::{SharedEngine, StreamControl};
use timeline::{render_sequence, render_weights};
use transport::{render_transport, AudioStats};
use waveform::render_waveform;

/// Level meter window
const VIS_BUFFER_SIZE: usize = 1024;
/// Buckets in the source overview
const OVERVIEW_BUCKETS: usize = 256;

const WEIGHT_STEP: u8 = 5;
const FADER_STEP: f32 = 0.05;
const ATTACK_STEP_MS: f64 = 5.0;
const RELEASE_STEP_MS: f64 = 10.0;

/// UI application state
pub struct UiApp {
    engine: SharedEngine,
    /// Bridge events from the audio thread
    bridge_rx: Consumer<BridgeEvent>,
    /// Output samples for the level meter
    scope_rx: Consumer<f32>,
    control: StreamControl,

    view: BridgeView,
    snapshot: EngineSnapshot,
    audio_buffer: Vec<f32>,
    overview: Vec<f32>,

    preset: Option<Preset>,
    /// Highlighted row of the probability table
    selected: usize,
    status: Option<String>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        engine: SharedEngine,
        bridge_rx: Consumer<BridgeEvent>,
        scope_rx: Consumer<f32>,
        control: StreamControl,
        preset: Preset,
    ) -> Self {
        let (snapshot, overview) = {
            let guard = lock(&engine);
            let overview = guard
                .source()
                .map(|s| s.rms_overview(OVERVIEW_BUCKETS))
                .unwrap_or_default();
            (EngineSnapshot::capture(&guard), overview)
        };

        Self {
            engine,
            bridge_rx,
            scope_rx,
            control,
            view: BridgeView::default(),
            snapshot,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            overview,
            preset: Some(preset),
            selected: 0,
            status: None,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_bridge();
            self.snapshot = EngineSnapshot::capture(&lock(&self.engine));
            self.control.service()?;

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code)?;
                    }
                }
            }
        }

        lock(&self.engine).stop_remix();
        Ok(())
    }

    /// Keep the last VIS_BUFFER_SIZE output samples
    fn poll_audio(&mut self) {
        while let Ok(sample) = self.scope_rx.pop() {
            self.audio_buffer.push(sample);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn poll_bridge(&mut self) {
        while let Ok(event) = self.bridge_rx.pop() {
            event.dispatch(&mut self.view);
        }
    }

    fn handle_key(&mut self, key: KeyCode) -> EyreResult<()> {
        self.status = None;
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                let result = lock(&self.engine).toggle_remix();
                match result {
                    Ok(true) => {}
                    Ok(false) => self.view.reset(),
                    Err(err) => self.report(err),
                }
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                let mut engine = lock(&self.engine);
                if engine.is_holding() {
                    engine.hold_release();
                } else if !engine.hold_press() {
                    self.status = Some("Hold needs a running remix".to_string());
                }
            }
            KeyCode::Char('p') | KeyCode::Char('P') => self.control.toggle_pause()?,
            KeyCode::Char('s') | KeyCode::Char('S') => {
                let mut engine = lock(&self.engine);
                let next = next_sound(engine.sound_source());
                engine.set_sound_source(next);
            }
            KeyCode::Char(c @ '1'..='7') => {
                let index = c as usize - '1' as usize;
                if let Some(&preset) = Preset::ALL.get(index) {
                    self.preset = Some(preset);
                    self.edit(|p| p.weights = preset.table());
                }
            }
            KeyCode::Up => self.selected = self.selected.checked_sub(1).unwrap_or(NoteValue::COUNT - 1),
            KeyCode::Down => self.selected = (self.selected + 1) % NoteValue::COUNT,
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_weight(WEIGHT_STEP as i16),
            KeyCode::Char('-') => self.nudge_weight(-(WEIGHT_STEP as i16)),
            KeyCode::Left => self.edit(|p| p.bpm = p.bpm.saturating_add(-1)),
            KeyCode::Right => self.edit(|p| p.bpm = p.bpm.saturating_add(1)),
            KeyCode::PageDown => self.edit(|p| p.bpm = p.bpm.saturating_add(-10)),
            KeyCode::PageUp => self.edit(|p| p.bpm = p.bpm.saturating_add(10)),
            KeyCode::Char('[') => self.edit(|p| p.mix_fader = (p.mix_fader - FADER_STEP).clamp(0.0, 1.0)),
            KeyCode::Char(']') => self.edit(|p| p.mix_fader = (p.mix_fader + FADER_STEP).clamp(0.0, 1.0)),
            KeyCode::Char(',') => self.edit(|p| p.master_volume = (p.master_volume - FADER_STEP).clamp(0.0, 1.0)),
            KeyCode::Char('.') => self.edit(|p| p.master_volume = (p.master_volume + FADER_STEP).clamp(0.0, 1.0)),
            KeyCode::Char('a') => self.edit(|p| p.attack_ms = (p.attack_ms - ATTACK_STEP_MS).max(0.0)),
            KeyCode::Char('A') => self.edit(|p| p.attack_ms += ATTACK_STEP_MS),
            KeyCode::Char('r') => self.edit(|p| p.release_ms = (p.release_ms - RELEASE_STEP_MS).max(0.0)),
            KeyCode::Char('R') => self.edit(|p| p.release_ms += RELEASE_STEP_MS),
            _ => {}
        }
        Ok(())
    }

    /// Apply a parameter edit, surfacing engine errors in the status line.
    fn edit(&mut self, change: impl FnOnce(&mut RemixParams)) {
        let result = lock(&self.engine).update_params(change);
        if let Err(err) = result {
            self.report(err);
        }
    }

    /// Move the selected weight, capping the table total at 100.
    fn nudge_weight(&mut self, delta: i16) {
        let note = NoteValue::ALL[self.selected];
        self.preset = None;
        self.edit(|p| {
            let weight = (p.weights.weight(note) as i16 + delta).clamp(0, u8::MAX as i16) as u8;
            p.weights.set_weight_constrained(note, weight);
        });
    }

    fn report(&mut self, err: RemixError) {
        warn!(%err, "engine rejected the request");
        self.status = Some(match err {
            RemixError::EmptySelection => "Set at least one note probability above 0".to_string(),
            other => other.to_string(),
        });
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Main layout: transport, tables, source overview, help
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Transport bar
                Constraint::Min(12),    // Probabilities + sequence
                Constraint::Length(8),  // Source overview
                Constraint::Length(1),  // Help / status bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_transport(frame, chunks[0], &self.snapshot, &stats, self.control.is_paused());

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(20)])
            .split(chunks[1]);
        render_weights(frame, middle[0], &self.snapshot, &self.view, self.selected);
        render_sequence(frame, middle[1], &self.snapshot);

        render_waveform(frame, chunks[2], &self.overview, &self.snapshot, &self.view);

        let help = match &self.status {
            Some(message) => Paragraph::new(format!(" {message}")).style(Style::default().fg(Color::Red)),
            None => {
                let preset = self.preset.map_or("custom", Preset::name);
                Paragraph::new(format!(
                    " [Space] Remix  [H] Hold  [1-7] Preset ({preset})  [↑↓ +-] Weights  [←→] BPM  \
                     [[ ]] Mix  [, .] Vol  [a/A] Atk  [r/R] Rel  [S] Source  [P] Pause  [Q] Quit"
                ))
                .style(Style::default().fg(Color::DarkGray))
            }
        };
        frame.render_widget(help, chunks[3]);
    }
}

/// Lock the engine, recovering it if the audio thread panicked mid-block.
fn lock(engine: &SharedEngine) -> MutexGuard<'_, RemixEngine<RemixParams, RingBridge>> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Slice, then every percussion kind, then back to slice.
fn next_sound(current: SoundSource) -> SoundSource {
    match current {
        SoundSource::Slice => SoundSource::Drum(DrumPatch::new(DrumKind::ALL[0])),
        SoundSource::Drum(patch) => {
            let position = DrumKind::ALL
                .iter()
                .position(|&kind| kind == patch.kind())
                .unwrap_or(0);
            match DrumKind::ALL.get(position + 1) {
                Some(&kind) => SoundSource::Drum(DrumPatch::new(kind)),
                None => SoundSource::Slice,
            }
        }
    }
}
