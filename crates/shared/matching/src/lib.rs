//! Dinex Matching
//!
//! The per-instrument order book and the price-time crossing rules used by
//! the matching engine. Books are plain data: callers provide the locking.

mod order_book;
mod price_time;

pub use order_book::{BookSnapshot, OrderBook};
pub use price_time::{Fill, crosses, execution_price};
