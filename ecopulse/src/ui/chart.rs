//! Line chart of cpu/memory/disk over the fetched history.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
};

use crate::history::MetricSeries;
use crate::ui::theme;

fn dataset<'a>(name: &'a str, data: &'a [(f64, f64)], color: Color, dimmed: bool) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme::fg(color, dimmed))
        .data(data)
}

pub fn draw_history_chart(f: &mut ratatui::Frame<'_>, area: Rect, series: &MetricSeries, dimmed: bool) {
    let cpu = series.channel(|p| p.cpu);
    let mem = series.channel(|p| p.memory);
    let disk = series.channel(|p| p.disk);

    let datasets = vec![
        dataset("cpu", &cpu, theme::CPU, dimmed),
        dataset("memory", &mem, theme::MEMORY, dimmed),
        dataset("disk", &disk, theme::DISK, dimmed),
    ];

    // first / middle / last time labels
    let points = series.points();
    let x_labels: Vec<Span> = match points.len() {
        0 => vec![],
        1 => vec![Span::raw(points[0].time.clone())],
        n => vec![
            Span::raw(points[0].time.clone()),
            Span::raw(points[n / 2].time.clone()),
            Span::raw(points[n - 1].time.clone()),
        ],
    };
    let x_max = points.len().saturating_sub(1).max(1) as f64;
    let axis_style = Style::default().fg(theme::MUTED);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Live Resource Monitor"),
        )
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds([0.0, 100.0])
                .labels(vec![Span::raw("0"), Span::raw("50"), Span::raw("100")]),
        );
    f.render_widget(chart, area);
}
