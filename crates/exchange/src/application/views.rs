//! Read models returned by the query surface

use dinex_core::{Category, InstrumentId, Order, OrderId, Price, Quantity, Role, Shares};
use serde::Serialize;

/// Top of book and supply for one instrument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSummary {
    pub instrument_id: InstrumentId,
    pub category: Category,
    pub house_supply: Quantity,
    pub best_ask: Option<Price>,
    pub best_bid: Option<Price>,
    /// Best ask minus best bid, when both exist
    pub spread: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    pub offering_price: Price,
    pub offering_active: bool,
    /// Every catalog instrument, in catalog order
    pub instruments: Vec<InstrumentSummary>,
}

impl MarketSummary {
    pub fn instrument(&self, name: &str) -> Option<&InstrumentSummary> {
        self.instruments
            .iter()
            .find(|summary| summary.instrument_id.as_str() == name)
    }
}

/// One resting order as shown in a book listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookEntry {
    pub order_id: OrderId,
    pub owner: String,
    pub price: Price,
    pub remaining: Quantity,
}

impl From<&Order> for BookEntry {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            owner: order.owner.clone(),
            price: order.price,
            remaining: order.remaining,
        }
    }
}

/// Full depth of one book in priority order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookView {
    pub instrument_id: InstrumentId,
    /// Lowest price first, then oldest
    pub asks: Vec<BookEntry>,
    /// Highest price first, then oldest
    pub bids: Vec<BookEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holding {
    pub instrument_id: InstrumentId,
    pub shares: Shares,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub username: String,
    pub balance: Price,
    /// Non-zero positions only
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn shares(&self, name: &str) -> Shares {
        self.holdings
            .iter()
            .find(|h| h.instrument_id.as_str() == name)
            .map(|h| h.shares)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraderActivity {
    pub username: String,
    pub trades: usize,
}

/// Market-wide counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketStats {
    pub accounts: usize,
    pub instruments: usize,
    pub open_positions: usize,
    pub active_orders: usize,
    pub total_trades: usize,
    /// Most frequent buyers, busiest first
    pub top_buyers: Vec<TraderActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalance {
    pub username: String,
    pub role: Role,
    pub balance: Price,
}
