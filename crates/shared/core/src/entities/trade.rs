use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::instruments::InstrumentId;
use crate::values::{Price, Quantity, Timestamp, notional};

/// Unique identifier for a trade
pub type TradeId = Uuid;

/// Selling side of a trade: another participant, or the house offering
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Counterparty {
    /// Offering sentinel; never holds a balance or position
    House,
    Participant(String),
}

impl Counterparty {
    pub fn participant(name: impl Into<String>) -> Self {
        Counterparty::Participant(name.into())
    }

    pub fn is_house(&self) -> bool {
        matches!(self, Counterparty::House)
    }

    /// Participant name, or None for the house
    pub fn username(&self) -> Option<&str> {
        match self {
            Counterparty::House => None,
            Counterparty::Participant(name) => Some(name),
        }
    }
}

impl std::fmt::Display for Counterparty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Counterparty::House => write!(f, "HOUSE"),
            Counterparty::Participant(name) => write!(f, "{}", name),
        }
    }
}

/// An executed trade. Immutable once appended to the trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    /// The instrument that was traded
    pub instrument_id: InstrumentId,
    pub buyer: String,
    pub seller: Counterparty,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: Timestamp,
}

impl Trade {
    /// Create a new trade with explicit timestamp
    pub fn new(
        instrument_id: impl Into<InstrumentId>,
        buyer: impl Into<String>,
        seller: Counterparty,
        price: Price,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id: instrument_id.into(),
            buyer: buyer.into(),
            seller,
            price,
            quantity,
            timestamp,
        }
    }

    /// Get the instrument identifier as a string slice
    pub fn symbol(&self) -> &str {
        self.instrument_id.as_str()
    }

    /// Cash that changed hands (price * quantity)
    pub fn notional(&self) -> Option<Price> {
        notional(self.price, self.quantity)
    }

    /// True for purchases from the house offering
    pub fn is_offering(&self) -> bool {
        self.seller.is_house()
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <- {} | {} {} @ ${:.2}",
            self.buyer, self.seller, self.quantity, self.instrument_id, self.price
        )
    }
}
