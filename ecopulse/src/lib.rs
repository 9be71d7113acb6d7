//! ecopulse: terminal command center for a remote system-metrics API.
//!
//! The [`monitor::Monitor`] polls history, forecast and host details and
//! classifies the data stream as online, stalled or offline. The
//! [`chat::ChatSession`] keeps the analyst conversation. Both talk to the
//! backend through [`api::DashboardApi`].

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod history;
pub mod liveness;
pub mod logging;
pub mod monitor;
pub mod profiles;
pub mod types;
pub mod ui;
