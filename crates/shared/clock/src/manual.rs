use chrono::{DateTime, Duration, Utc};
use dinex_core::Timestamp;
use dinex_ports::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Clock that only moves when told to
///
/// Used for deterministic tests of the offering price decay. Time is kept
/// with millisecond resolution.
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `initial_time`
    pub fn new(initial_time: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(initial_time.timestamp_millis()),
        }
    }

    /// Shared clock frozen at the current wall time
    pub fn arc_now() -> Arc<Self> {
        Arc::new(Self::new(Utc::now()))
    }

    /// Advance the clock by a specified duration
    pub fn advance(&self, duration: Duration) {
        self.millis
            .fetch_add(duration.num_milliseconds(), Ordering::SeqCst);
    }

    /// Explicitly set the time
    ///
    /// Warning: This can move time backwards. Use with caution.
    pub fn set_time(&self, time: Timestamp) {
        self.millis.store(time.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn name(&self) -> &str {
        "manual clock"
    }
}
