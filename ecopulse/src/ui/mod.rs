//! UI module root: exposes drawing functions for individual panels.

pub mod cards;
pub mod chart;
pub mod chat;
pub mod header;
pub mod status;
pub mod system;
pub mod theme;
pub mod util;
