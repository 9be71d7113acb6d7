//! Full-panel notice while the API is unreachable, and the stalled-stream banner.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::ui::theme;

pub fn draw_connecting(f: &mut ratatui::Frame<'_>, area: Rect) {
    let p = Paragraph::new("Waiting for the first response from the metrics API...")
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme::MUTED))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

pub fn draw_offline(f: &mut ratatui::Frame<'_>, area: Rect, error: Option<&str>) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "API Connection Failed",
            Style::default()
                .fg(theme::OFFLINE)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("Check that the metrics API server is running."),
    ];
    if let Some(e) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            e.to_string(),
            Style::default().fg(theme::MUTED),
        )));
    }
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::OFFLINE))
                .title("System Offline"),
        );
    f.render_widget(p, area);
}

pub fn draw_stalled_banner(f: &mut ratatui::Frame<'_>, area: Rect, stuck_polls: u32) {
    let line = Line::from(vec![
        Span::styled(
            "⚠ Data Stream Interrupted: ",
            Style::default()
                .fg(theme::WARNING)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "no new samples for {stuck_polls} polls. Is the collector running?"
        )),
    ]);
    let p = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::WARNING)),
    );
    f.render_widget(p, area);
}
