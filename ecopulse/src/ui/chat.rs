//! Chat pane: transcript, reply indicator and input line.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::chat::{ChatMessage, Role};
use crate::ui::theme;
use crate::ui::util::wrap_chars;

pub struct ChatView<'a> {
    pub transcript: &'a [ChatMessage],
    pub draft: &'a str,
    pub awaiting: bool,
    pub focused: bool,
    /// Lines scrolled up from the bottom.
    pub scroll: usize,
}

fn transcript_lines(transcript: &[ChatMessage], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for msg in transcript {
        let (who, color) = match msg.role {
            Role::User => ("you", theme::USER),
            Role::Bot => ("analyst", theme::ONLINE),
        };
        lines.push(Line::from(Span::styled(
            who,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for l in wrap_chars(&msg.text, width.saturating_sub(2)) {
            lines.push(Line::from(format!("  {l}")));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Returns the largest useful scroll value for the given area, so the
/// caller can clamp its offset.
pub fn draw_chat(f: &mut ratatui::Frame<'_>, area: Rect, view: &ChatView<'_>) -> usize {
    let border = if view.focused {
        Style::default().fg(theme::ONLINE)
    } else {
        Style::default().fg(theme::MUTED)
    };
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title("AI System Analyst");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(inner);

    let lines = transcript_lines(view.transcript, rows[0].width as usize);
    let height = rows[0].height as usize;
    let max_scroll = lines.len().saturating_sub(height);
    let from_top = max_scroll.saturating_sub(view.scroll.min(max_scroll));
    let visible: Vec<Line> = lines.into_iter().skip(from_top).take(height).collect();
    f.render_widget(Paragraph::new(visible), rows[0]);

    if view.awaiting {
        f.render_widget(
            Paragraph::new(Span::styled(
                "⟳ Analyzing logs...",
                Style::default().fg(theme::MUTED),
            )),
            rows[1],
        );
    }

    let (input_text, input_style) = if view.awaiting {
        ("waiting for reply...".to_string(), Style::default().fg(theme::MUTED))
    } else if view.draft.is_empty() && !view.focused {
        (
            "Tab to ask a question...".to_string(),
            Style::default().fg(theme::MUTED),
        )
    } else {
        let cursor = if view.focused { "▏" } else { "" };
        (format!("{}{cursor}", view.draft), Style::default())
    };
    // keep the tail of a long draft visible
    let width = rows[2].width.saturating_sub(2) as usize;
    let skip = input_text.chars().count().saturating_sub(width);
    let shown: String = input_text.chars().skip(skip).collect();
    f.render_widget(
        Paragraph::new(Span::styled(shown, input_style)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if view.awaiting {
                    Style::default().fg(theme::MUTED)
                } else {
                    border
                }),
        ),
        rows[2],
    );
    max_scroll
}
