use dinex_core::Timestamp;

/// Source of "now" for the offering price and trade timestamps
///
/// The engine never calls `Utc::now()` itself; tests swap in a clock they
/// can move by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Shown in startup logs
    fn name(&self) -> &str {
        "clock"
    }
}
