mod account;
mod market_state;
mod order;
mod order_status;
mod side;
mod trade;

pub use account::{Account, AccountError, Role};
pub use market_state::MarketState;
pub use order::{Order, OrderId};
pub use order_status::OrderStatus;
pub use side::Side;
pub use trade::{Counterparty, Trade, TradeId};
