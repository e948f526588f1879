use async_trait::async_trait;
use dinex_core::{Account, Instrument, InstrumentId, MarketState, Order, OrderId, Trade};

use crate::error::RepositoryResult;

/// Writes produced by one atomic step of the engine
///
/// Adapters must apply a change set all-or-nothing: after a failed
/// `commit` none of its writes may be observable.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub accounts: Vec<Account>,
    pub orders: Vec<Order>,
    pub instruments: Vec<Instrument>,
    pub trades: Vec<Trade>,
    pub market_state: Option<MarketState>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account (keyed by username)
    pub fn save_account(&mut self, account: Account) -> &mut Self {
        self.accounts.retain(|a| a.username != account.username);
        self.accounts.push(account);
        self
    }

    /// Insert or replace an order (keyed by id)
    pub fn save_order(&mut self, order: Order) -> &mut Self {
        self.orders.retain(|o| o.id != order.id);
        self.orders.push(order);
        self
    }

    /// Insert or replace an instrument (keyed by id)
    pub fn save_instrument(&mut self, instrument: Instrument) -> &mut Self {
        self.instruments.retain(|i| i.id != instrument.id);
        self.instruments.push(instrument);
        self
    }

    /// Append to the trade log
    pub fn append_trade(&mut self, trade: Trade) -> &mut Self {
        self.trades.push(trade);
        self
    }

    pub fn save_market_state(&mut self, state: MarketState) -> &mut Self {
        self.market_state = Some(state);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
            && self.orders.is_empty()
            && self.instruments.is_empty()
            && self.trades.is_empty()
            && self.market_state.is_none()
    }
}

/// Port for market storage
///
/// The engine reads through the `load_*` methods and writes only through
/// `commit`, so every adapter gets atomicity from a single entry point.
#[async_trait]
pub trait MarketRepository: Send + Sync {
    /// Get an account by username
    async fn load_account(&self, username: &str) -> RepositoryResult<Option<Account>>;

    /// Get all accounts
    async fn load_accounts(&self) -> RepositoryResult<Vec<Account>>;

    /// Get an instrument by id
    async fn load_instrument(&self, id: &InstrumentId) -> RepositoryResult<Option<Instrument>>;

    /// Get all stored instruments
    async fn load_instruments(&self) -> RepositoryResult<Vec<Instrument>>;

    /// Get an order by id, whatever its status
    async fn load_order(&self, id: OrderId) -> RepositoryResult<Option<Order>>;

    /// Get every order still active, in id order
    async fn load_active_orders(&self) -> RepositoryResult<Vec<Order>>;

    /// Highest order id ever issued
    async fn last_order_id(&self) -> RepositoryResult<Option<OrderId>>;

    /// Most recent trades, newest first
    async fn recent_trades(&self, limit: usize) -> RepositoryResult<Vec<Trade>>;

    /// Number of trades in the log
    async fn trade_count(&self) -> RepositoryResult<usize>;

    /// Full trade log, oldest first
    async fn load_trades(&self) -> RepositoryResult<Vec<Trade>>;

    async fn load_market_state(&self) -> RepositoryResult<MarketState>;

    /// Apply a change set atomically
    async fn commit(&self, changes: ChangeSet) -> RepositoryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinex_core::{Counterparty, Role, Side};
    use rust_decimal_macros::dec;

    #[test]
    fn test_save_replaces_same_key() {
        let mut changes = ChangeSet::new();
        let mut account = Account::new("Josh", Role::Admin, dec!(100));
        changes.save_account(account.clone());
        account.balance = dec!(50);
        changes.save_account(account);

        assert_eq!(changes.accounts.len(), 1);
        assert_eq!(changes.accounts[0].balance, dec!(50));
    }

    #[test]
    fn test_trades_append() {
        let mut changes = ChangeSet::new();
        assert!(changes.is_empty());

        let now = chrono::Utc::now();
        let trade = Trade::new("Beef Stew", "Josh", Counterparty::House, dec!(200), 1, now);
        changes.append_trade(trade.clone()).append_trade(trade);
        let order = Order::new(OrderId(1), "Beef Stew", Side::Bid, "Josh", dec!(1), 1, now);
        changes.save_order(order);

        assert_eq!(changes.trades.len(), 2);
        assert_eq!(changes.orders.len(), 1);
        assert!(!changes.is_empty());
    }
}
