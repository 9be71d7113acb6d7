//! Host descriptor panel.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::types::SystemInfo;
use crate::ui::theme;
use crate::ui::util::{gb, truncate_middle};

pub fn draw_system(f: &mut ratatui::Frame<'_>, area: Rect, info: Option<&SystemInfo>, dimmed: bool) {
    let block = Block::default().borders(Borders::ALL).title("System");
    let Some(s) = info else {
        f.render_widget(block, area);
        return;
    };
    let label = |k: &'static str| Span::styled(k, theme::fg(theme::MUTED, dimmed));
    let value = |v: String| Span::styled(v, theme::fg(ratatui::style::Color::White, dimmed));
    let width = area.width.saturating_sub(12) as usize;

    let lines = vec![
        Line::from(vec![
            label("host  "),
            value(truncate_middle(&s.hostname, width)),
        ]),
        Line::from(vec![
            label("os    "),
            value(format!("{} ({})", s.os, s.cpu_arch)),
        ]),
        Line::from(vec![
            label("cpu   "),
            value(format!("{} cores", s.cpu_cores)),
            label("   ram "),
            value(gb(s.ram_total)),
        ]),
        Line::from(vec![
            label("disk  "),
            value(format!("{} / {}", gb(s.disk_used), gb(s.disk_total))),
        ]),
    ];
    f.render_widget(Paragraph::new(lines).block(block), area);
}
