//! Probability table and sequence strip

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use saavy_remix::sequencing::{NoteValue, MAX_TOTAL_WEIGHT, MAX_WEIGHT};

use super::{BridgeView, EngineSnapshot};

/// Bar length for a weight of 100
const WEIGHT_BAR_WIDTH: usize = 10;

/// Render one row per note value: label, weight bar, weight.
///
/// Rows are highlighted like the sequence: the note playing now, notes in a
/// release tail, and notes that appear anywhere in the active sequence.
pub fn render_weights(
    frame: &mut Frame,
    area: Rect,
    state: &EngineSnapshot,
    view: &BridgeView,
    selected: usize,
) {
    let block = Block::default()
        .title(format!(
            " Probabilities ({}/{MAX_TOTAL_WEIGHT}) ",
            state.weights.total()
        ))
        .borders(Borders::ALL);

    let current = state.current_note();
    let lines: Vec<Line> = NoteValue::ALL
        .iter()
        .enumerate()
        .map(|(row, &note)| {
            let weight = state.weights.weight(note);
            let filled = weight as usize * WEIGHT_BAR_WIDTH / MAX_WEIGHT as usize;
            let bar = format!(
                "{}{}",
                "█".repeat(filled),
                "░".repeat(WEIGHT_BAR_WIDTH - filled)
            );

            let color = if current == Some(note) {
                Color::Green
            } else if view.in_delay_phase(note, state.now) {
                Color::Magenta
            } else if state.sequence.contains(&note) {
                Color::White
            } else {
                Color::DarkGray
            };

            let marker = if row == selected { "›" } else { " " };
            let mut style = Style::default().fg(color);
            if row == selected {
                style = style.add_modifier(Modifier::BOLD);
            }

            Line::from(vec![
                Span::styled(format!("{marker}{:<6}", note.label()), style),
                Span::styled(bar, style),
                Span::styled(format!(" {weight:>3}"), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Glyph for a note value: taller blocks for longer notes.
fn glyph(note: NoteValue) -> char {
    match note {
        NoteValue::Sixteenth | NoteValue::SixteenthExtended => '▁',
        NoteValue::Twelfth | NoteValue::TwelfthExtended => '▂',
        NoteValue::Eighth | NoteValue::EighthExtended => '▄',
        NoteValue::Quarter | NoteValue::QuarterExtended => '▆',
        NoteValue::Half | NoteValue::HalfExtended => '█',
    }
}

/// Render the active sequence as a wrapped strip with the current step
/// highlighted.
pub fn render_sequence(frame: &mut Frame, area: Rect, state: &EngineSnapshot) {
    let title = match state.current_note() {
        Some(note) => format!(" Sequence - now {} ", note),
        None => " Sequence ".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    if state.sequence.is_empty() {
        let idle = Paragraph::new(" [Space] to start remixing")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(idle, area);
        return;
    }

    let spans: Vec<Span> = state
        .sequence
        .iter()
        .enumerate()
        .map(|(i, &note)| {
            let base = if note.is_extended() {
                Color::Magenta
            } else {
                Color::Cyan
            };
            let style = if i == state.current_index {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else if i < state.current_index {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(base)
            };
            Span::styled(format!("{} ", glyph(note)), style)
        })
        .collect();

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
