//! Shared UI theme constants.

use ratatui::style::{Color, Modifier, Style};

use crate::liveness::LivenessState;

pub const ONLINE: Color = Color::Rgb(74, 222, 128);
pub const WARNING: Color = Color::Rgb(250, 204, 21);
pub const OFFLINE: Color = Color::Rgb(239, 68, 68);

// Chart/card channel colors
pub const CPU: Color = Color::Rgb(248, 113, 113);
pub const MEMORY: Color = Color::Rgb(96, 165, 250);
pub const DISK: Color = Color::Rgb(74, 222, 128);
pub const FORECAST: Color = Color::Rgb(192, 132, 252);

pub const MUTED: Color = Color::Rgb(115, 115, 115);
pub const USER: Color = Color::Rgb(59, 130, 246);

pub fn liveness_color(state: LivenessState) -> Color {
    match state {
        LivenessState::Online => ONLINE,
        LivenessState::Warning => WARNING,
        LivenessState::Offline => OFFLINE,
    }
}

/// Foreground style, dimmed while the data stream is stalled.
pub fn fg(color: Color, dimmed: bool) -> Style {
    let style = Style::default().fg(color);
    if dimmed {
        style.add_modifier(Modifier::DIM)
    } else {
        style
    }
}
