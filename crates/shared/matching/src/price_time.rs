//! Standard price-time priority rules (FIFO)
//!
//! Orders are matched based on:
//! 1. Best price (highest bid, lowest ask)
//! 2. Time priority (first in, first out at same price)
//!
//! The resting order sets the execution price, so an aggressive limit
//! gets any price improvement.

use dinex_core::{Order, OrderId, Price, Quantity, Side};

/// One prospective execution against a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Resting order being hit
    pub order_id: OrderId,
    /// Execution price (the resting order's price)
    pub price: Price,
    pub quantity: Quantity,
}

/// Whether an incoming order on `side` with `limit` may trade against a
/// resting order priced at `resting`.
pub fn crosses(side: Side, limit: Price, resting: Price) -> bool {
    match side {
        Side::Bid => resting <= limit,
        Side::Ask => resting >= limit,
    }
}

/// Price a trade between an aggressor and a resting order executes at
pub fn execution_price(resting: &Order) -> Price {
    resting.price
}

/// Size of the next fill: whatever is smaller of the two open amounts
pub(crate) fn fill_quantity(incoming: Quantity, resting: &Order) -> Quantity {
    incoming.min(resting.remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bid_crosses_cheaper_ask() {
        assert!(crosses(Side::Bid, dec!(60), dec!(50)));
        assert!(crosses(Side::Bid, dec!(50), dec!(50)));
        assert!(!crosses(Side::Bid, dec!(49.99), dec!(50)));
    }

    #[test]
    fn test_ask_crosses_richer_bid() {
        assert!(crosses(Side::Ask, dec!(40), dec!(45)));
        assert!(crosses(Side::Ask, dec!(45), dec!(45)));
        assert!(!crosses(Side::Ask, dec!(45.01), dec!(45)));
    }
}
