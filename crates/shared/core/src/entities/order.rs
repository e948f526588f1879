use serde::{Deserialize, Serialize};

use super::{OrderStatus, Side};
use crate::instruments::InstrumentId;
use crate::values::{Price, Quantity, Timestamp};

/// Unique identifier for an order
///
/// Ids are issued from a single monotonic counter, so the id also serves as
/// the order's creation sequence for time priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl OrderId {
    /// Creation sequence used for FIFO tie-breaks at equal prices
    pub fn sequence(&self) -> u64 {
        self.0
    }

    /// The id issued right after this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A resting limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// The instrument being traded
    pub instrument_id: InstrumentId,
    pub side: Side,
    /// Participant that placed the order
    pub owner: String,
    pub price: Price,
    /// Quantity the order was created with
    pub quantity: Quantity,
    /// Quantity still open; zero once filled
    pub remaining: Quantity,
    pub status: OrderStatus,
    pub created_at: Timestamp,
}

impl Order {
    /// Create a new active order
    pub fn new(
        id: OrderId,
        instrument_id: impl Into<InstrumentId>,
        side: Side,
        owner: impl Into<String>,
        price: Price,
        quantity: Quantity,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            instrument_id: instrument_id.into(),
            side,
            owner: owner.into(),
            price,
            quantity,
            remaining: quantity,
            status: OrderStatus::Active,
            created_at,
        }
    }

    /// Get the instrument identifier as a string slice
    pub fn symbol(&self) -> &str {
        self.instrument_id.as_str()
    }

    /// Creation sequence (earlier orders have priority at equal price)
    pub fn sequence(&self) -> u64 {
        self.id.sequence()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Quantity already executed against this order
    pub fn filled_quantity(&self) -> Quantity {
        self.quantity - self.remaining
    }

    /// Consume `quantity` from the open amount.
    ///
    /// The order becomes `Filled` when nothing remains. Fills larger than the
    /// remaining quantity are clamped; callers size fills with
    /// `min(incoming, remaining)`.
    pub fn fill(&mut self, quantity: Quantity) {
        debug_assert!(self.is_active(), "fill on terminal order {}", self.id);
        self.remaining = self.remaining.saturating_sub(quantity);
        if self.remaining == 0 {
            self.status = OrderStatus::Filled;
        }
    }

    /// Withdraw the order. Returns false if it was already terminal.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = OrderStatus::Cancelled;
        true
    }
}
