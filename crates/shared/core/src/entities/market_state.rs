use serde::{Deserialize, Serialize};

use crate::values::Timestamp;

/// Singleton offering state
///
/// The start instant is set at most once; the offering price is derived from
/// it on every query and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub offering_started_at: Option<Timestamp>,
    pub offering_active: bool,
}

impl MarketState {
    pub fn is_started(&self) -> bool {
        self.offering_started_at.is_some()
    }

    /// Record the start instant. Returns false (and changes nothing) if the
    /// offering was already started.
    pub fn start(&mut self, now: Timestamp) -> bool {
        if self.offering_started_at.is_some() {
            return false;
        }
        self.offering_started_at = Some(now);
        self.offering_active = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_start_is_set_once() {
        let mut state = MarketState::default();
        assert!(!state.is_started());

        let first = Utc::now();
        assert!(state.start(first));
        assert!(state.offering_active);

        assert!(!state.start(first + Duration::seconds(30)));
        assert_eq!(state.offering_started_at, Some(first));
    }
}
