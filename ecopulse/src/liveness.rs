//! Liveness classification from repeated timestamps.

use std::fmt;

use crate::types::Timestamp;

/// Consecutive polls with an unchanged latest timestamp tolerated before the
/// pipeline is reported as stalled. At the default 2s cadence that is ~10s.
pub const STUCK_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LivenessState {
    Online,
    /// Fetches succeed but the newest sample has stopped changing.
    Warning,
    /// The most recent fetch failed outright.
    #[default]
    Offline,
}

impl LivenessState {
    pub fn label(self) -> &'static str {
        match self {
            LivenessState::Online => "System Online",
            LivenessState::Warning => "Monitor Paused",
            LivenessState::Offline => "System Offline",
        }
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LivenessState::Online => "online",
            LivenessState::Warning => "warning",
            LivenessState::Offline => "offline",
        })
    }
}

/// Counts successful polls whose latest timestamp matched the previous one.
#[derive(Debug, Clone, Default)]
pub struct StuckCounter {
    count: u32,
    last: Option<Timestamp>,
}

impl StuckCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest timestamp from a successful poll and classify.
    /// `None` means the poll returned no samples at all; the counter and the
    /// remembered timestamp are left as they were.
    pub fn observe(&mut self, latest: Option<&Timestamp>) -> LivenessState {
        match latest {
            Some(ts) if self.last.as_ref() == Some(ts) => {
                self.count = self.count.saturating_add(1);
            }
            Some(ts) => {
                self.count = 0;
                self.last = Some(ts.clone());
            }
            None => {}
        }
        self.classify()
    }

    pub fn classify(&self) -> LivenessState {
        if self.count > STUCK_THRESHOLD {
            LivenessState::Warning
        } else {
            LivenessState::Online
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_timestamp(&self) -> Option<&Timestamp> {
        self.last.as_ref()
    }
}
