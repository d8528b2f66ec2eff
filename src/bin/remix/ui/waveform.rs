//! Source overview widget - RMS envelope of the sample with the latest slice

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use super::{BridgeView, EngineSnapshot};

/// Render the source overview with the most recent slice marked.
pub fn render_waveform(frame: &mut Frame, area: Rect, overview: &[f32], state: &EngineSnapshot, view: &BridgeView) {
    let title = match view.last_slice {
        Some((start, len)) if state.sample_rate > 0 => format!(
            " Source - slice {:.2}s +{:.0}ms ",
            start as f64 / state.sample_rate as f64,
            len as f64 * 1000.0 / state.sample_rate as f64
        ),
        _ => " Source ".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let peak = overview.iter().fold(0.0f32, |acc, &x| acc.max(x)).max(1e-6) as f64;
    let envelope: Vec<(f64, f64)> = overview
        .iter()
        .enumerate()
        .flat_map(|(i, &rms)| {
            let x = i as f64 / overview.len().max(1) as f64;
            let y = rms as f64 / peak;
            [(x, y), (x, -y)]
        })
        .collect();

    // Slice region as a band of points across the top
    let slice: Vec<(f64, f64)> = match view.last_slice {
        Some((start, len)) if state.source_frames > 0 => {
            let from = start as f64 / state.source_frames as f64;
            let to = ((start + len) as f64 / state.source_frames as f64).min(1.0);
            let steps = ((to - from) * area.width as f64 * 2.0).ceil().max(1.0) as usize;
            (0..=steps)
                .map(|i| (from + (to - from) * i as f64 / steps as f64, 0.95))
                .collect()
        }
        _ => Vec::new(),
    };

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&envelope),
        Dataset::default()
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&slice),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
