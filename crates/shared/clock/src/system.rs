use chrono::{DateTime, Utc};
use dinex_core::Timestamp;
use dinex_ports::Clock;

/// Wall clock, cut to whole milliseconds
///
/// Offering start instants are persisted and compared against later
/// readings, so every reading has the same resolution as the manual clock
/// and survives a JSON round trip unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let now = Utc::now();
        DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }

    fn name(&self) -> &str {
        "system clock"
    }
}
