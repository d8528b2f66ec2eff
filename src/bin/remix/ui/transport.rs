//! Transport bar widget - shows tempo, remix state, position, mix and levels

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::EngineSnapshot;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

/// Render the transport bar
pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    state: &EngineSnapshot,
    audio_stats: &AudioStats,
    paused: bool,
) {
    let block = Block::default().title(" remix ").borders(Borders::ALL);

    let (symbol, label, color) = match (state.is_remixing, paused) {
        (_, true) => ("⏸", "Paused", Color::Yellow),
        (true, false) => ("▶", "Remixing", Color::Green),
        (false, false) => ("■", "Stopped", Color::DarkGray),
    };

    let step = if state.is_remixing && !state.sequence.is_empty() {
        format!("Step {:>3}/{}  ", state.current_index + 1, state.sequence.len())
    } else {
        "Step   -/-    ".to_string()
    };

    let mut spans = vec![
        Span::styled(
            format!(" BPM: {}  ", state.bpm),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{symbol} {label}  "), Style::default().fg(color)),
    ];
    if state.is_holding {
        spans.push(Span::styled(
            "HOLD  ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans.extend([
        Span::styled(step, Style::default().fg(Color::White)),
        Span::styled(
            format!(
                "Events: {} ({} live)  Voices: {}  ",
                state.pending_events, state.active_events, state.active_voices
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Source: {}  ", state.sound),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "Mix: {:.2}  Vol: {:.2}  Atk: {:.0}ms  Rel: {:.0}ms  ",
                state.mix_fader, state.master_volume, state.attack_ms, state.release_ms
            ),
            Style::default().fg(Color::Blue),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", audio_stats.peak, audio_stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
