//! Dinex Clock Infrastructure
//!
//! Time sources and the offering price schedule.
//!
//! ## Usage
//!
//! ```ignore
//! use dinex_clock::{ManualClock, OfferingSchedule, PricingClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::arc_now();
//! let pricing = PricingClock::new(OfferingSchedule::default(), clock.clone());
//!
//! let mut state = MarketState::default();
//! state.start(clock.now());
//! clock.advance(Duration::seconds(30));
//! assert_eq!(pricing.current_price(&state), dec!(190));
//! ```

mod manual;
mod pricing;
mod system;

pub use manual::ManualClock;
pub use pricing::{OfferingSchedule, PricingClock};
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use dinex_ports::Clock;
