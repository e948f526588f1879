use chrono::Duration;
use dinex_core::{MarketState, Price, Timestamp};
use dinex_ports::Clock;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Step-decay price curve of the house offering
///
/// `price = max(0, start_price - floor(elapsed / decay_interval) * decay_rate)`
#[derive(Debug, Clone, PartialEq)]
pub struct OfferingSchedule {
    pub start_price: Price,
    /// Amount knocked off the price at every step
    pub decay_rate: Price,
    /// Length of one step
    pub decay_interval: Duration,
}

impl Default for OfferingSchedule {
    fn default() -> Self {
        Self {
            start_price: Decimal::from(200),
            decay_rate: Decimal::ONE,
            decay_interval: Duration::seconds(3),
        }
    }
}

impl OfferingSchedule {
    /// Number of whole decay steps contained in `elapsed`
    pub fn decay_steps(&self, elapsed: Duration) -> i64 {
        let interval = self.decay_interval.num_milliseconds();
        let elapsed = elapsed.num_milliseconds();
        if interval <= 0 || elapsed <= 0 {
            return 0;
        }
        elapsed / interval
    }

    /// Price after `elapsed` time since the start
    pub fn price_after(&self, elapsed: Duration) -> Price {
        let decay = self.decay_rate * Decimal::from(self.decay_steps(elapsed));
        (self.start_price - decay).max(Decimal::ZERO)
    }

    /// Price at `now` for an offering started at `started_at`.
    ///
    /// An offering that has not started sells at the start price.
    pub fn price_at(&self, started_at: Option<Timestamp>, now: Timestamp) -> Price {
        match started_at {
            Some(start) => self.price_after(now - start),
            None => self.start_price,
        }
    }
}

/// Offering price as a pure function of the clock and the recorded start
///
/// Nothing here ticks or caches: every query recomputes from the fixed
/// start instant, so concurrent readers and restarts all agree.
pub struct PricingClock<C: Clock + ?Sized> {
    schedule: OfferingSchedule,
    clock: Arc<C>,
}

impl<C: Clock + ?Sized> PricingClock<C> {
    pub fn new(schedule: OfferingSchedule, clock: Arc<C>) -> Self {
        Self { schedule, clock }
    }

    pub fn schedule(&self) -> &OfferingSchedule {
        &self.schedule
    }

    /// Current time from the underlying clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn current_price(&self, state: &MarketState) -> Price {
        self.schedule.price_at(state.offering_started_at, self.clock.now())
    }
}
