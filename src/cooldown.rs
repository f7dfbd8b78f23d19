use chrono::{DateTime, Local};
use std::time::Duration;

/// Debounce for automatic captures.
///
/// Only the last successful capture time is stored. A capture is allowed
/// when nothing has been captured yet or strictly more than `interval` has
/// passed since then.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownGate {
    interval: Duration,
    last_capture: Option<DateTime<Local>>,
}

impl CooldownGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_capture: None,
        }
    }

    pub fn last_capture(&self) -> Option<DateTime<Local>> {
        self.last_capture
    }

    pub fn may_capture(&self, now: DateTime<Local>) -> bool {
        match self.last_capture {
            None => true,
            Some(last) => elapsed(last, now) > self.interval,
        }
    }

    /// Call only once the image is on disk.
    pub fn record_capture(&mut self, now: DateTime<Local>) {
        self.last_capture = Some(now);
    }

    /// Time left until the next capture is allowed, zero when open.
    pub fn remaining(&self, now: DateTime<Local>) -> Duration {
        match self.last_capture {
            None => Duration::ZERO,
            Some(last) => self.interval.saturating_sub(elapsed(last, now)),
        }
    }
}

// a clock that stepped backwards counts as no time passed
fn elapsed(from: DateTime<Local>, to: DateTime<Local>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}
