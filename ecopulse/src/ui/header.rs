//! Top header with host name and liveness badge.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::monitor::DashboardSnapshot;
use crate::ui::theme;

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, snap: &DashboardSnapshot) {
    let mut spans = vec![Span::styled(
        "ecopulse",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if snap.polls_completed == 0 {
        spans.push(Span::raw(" | connecting..."));
    } else {
        let host = snap
            .system
            .as_ref()
            .map(|s| s.hostname.as_str())
            .unwrap_or("unknown");
        let color = theme::liveness_color(snap.liveness);
        spans.push(Span::raw(format!(" | host: {host} | ")));
        spans.push(Span::styled(
            format!("● {}", snap.liveness.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        "  (Tab: chat, q: quit)",
        Style::default().fg(theme::MUTED),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
