//! Latest-value cards for each channel plus the forecast card.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::history::MetricSeries;
use crate::types::Prediction;
use crate::ui::theme;
use crate::ui::util::pct;

// Forecast channel shown on the card
const FORECAST_CHANNEL: &str = "cpu";

fn card<'a>(title: &'a str, color: Color, dimmed: bool, body: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(body).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme::fg(color, dimmed))
            .title(Span::styled(title, theme::fg(color, dimmed))),
    )
}

pub fn draw_cards(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    series: &MetricSeries,
    prediction: Option<&Prediction>,
    dimmed: bool,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    let latest = series.latest();
    let big = |v: Option<f64>, color: Color| {
        Line::from(Span::styled(
            pct(v),
            theme::fg(color, dimmed).add_modifier(Modifier::BOLD),
        ))
    };

    f.render_widget(
        card("CPU Load", theme::CPU, dimmed, vec![big(latest.map(|p| p.cpu), theme::CPU)]),
        cols[0],
    );
    f.render_widget(
        card(
            "Memory Usage",
            theme::MEMORY,
            dimmed,
            vec![big(latest.map(|p| p.memory), theme::MEMORY)],
        ),
        cols[1],
    );
    f.render_widget(
        card("Disk Usage", theme::DISK, dimmed, vec![big(latest.map(|p| p.disk), theme::DISK)]),
        cols[2],
    );

    let mut body = vec![big(
        prediction.and_then(|p| p.consensus(FORECAST_CHANNEL)),
        theme::FORECAST,
    )];
    if let Some(models) = prediction.and_then(|p| p.channel(FORECAST_CHANNEL)) {
        let detail = models
            .iter()
            .map(|(name, v)| format!("{name} {v:.1}"))
            .collect::<Vec<_>>()
            .join(" · ");
        body.push(Line::from(Span::styled(detail, theme::fg(theme::MUTED, dimmed))));
    }
    if let Some(status) = prediction.and_then(|p| p.status.as_deref()) {
        body.push(Line::from(Span::styled(
            status.to_string(),
            theme::fg(theme::FORECAST, dimmed),
        )));
    }
    f.render_widget(card("AI Forecast (CPU)", theme::FORECAST, dimmed, body), cols[3]);
}
