//! Dinex Core Domain
//!
//! Pure domain types for the dining exchange.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod instruments;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    Account, AccountError, Counterparty, MarketState, Order, OrderId, OrderStatus, Role, Side, Trade, TradeId,
};
pub use instruments::{Category, Instrument, InstrumentId};
pub use values::{Price, Quantity, Shares, Timestamp, notional, shares_of};
