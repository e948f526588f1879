use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price and cash value - uses Decimal for precision
pub type Price = Decimal;

/// Order and trade quantity - always a whole, positive number of shares
pub type Quantity = u64;

/// Signed holding of one instrument (negative = short)
pub type Shares = i64;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Cash value of `quantity` shares at `price`, `None` if it does not fit
/// in a `Decimal`
pub fn notional(price: Price, quantity: Quantity) -> Option<Price> {
    price.checked_mul(Decimal::from(quantity))
}

/// Quantity as a signed share count, `None` above `Shares::MAX`
pub fn shares_of(quantity: Quantity) -> Option<Shares> {
    Shares::try_from(quantity).ok()
}
