use async_trait::async_trait;
use dinex_core::{Account, Instrument, InstrumentId, MarketState, Order, OrderId, Trade};
use dinex_ports::{ChangeSet, MarketRepository, RepositoryResult};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::snapshot::MarketSnapshot;

/// In-memory market repository
///
/// Thread-safe storage behind a single `RwLock`, so a commit is observed
/// either entirely or not at all. Suitable for simulation and testing.
pub struct InMemoryRepository {
    state: Arc<RwLock<MarketSnapshot>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::with_snapshot(MarketSnapshot::default())
    }

    /// Start from existing state
    pub fn with_snapshot(snapshot: MarketSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Copy of everything stored
    pub async fn snapshot(&self) -> MarketSnapshot {
        self.state.read().await.clone()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryRepository {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl MarketRepository for InMemoryRepository {
    async fn load_account(&self, username: &str) -> RepositoryResult<Option<Account>> {
        Ok(self.state.read().await.accounts.get(username).cloned())
    }

    async fn load_accounts(&self) -> RepositoryResult<Vec<Account>> {
        Ok(self.state.read().await.accounts.values().cloned().collect())
    }

    async fn load_instrument(&self, id: &InstrumentId) -> RepositoryResult<Option<Instrument>> {
        Ok(self.state.read().await.instruments.get(id).cloned())
    }

    async fn load_instruments(&self) -> RepositoryResult<Vec<Instrument>> {
        Ok(self.state.read().await.instruments.values().cloned().collect())
    }

    async fn load_order(&self, id: OrderId) -> RepositoryResult<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn load_active_orders(&self) -> RepositoryResult<Vec<Order>> {
        Ok(self.state.read().await.active_orders())
    }

    async fn last_order_id(&self) -> RepositoryResult<Option<OrderId>> {
        Ok(self.state.read().await.last_order_id())
    }

    async fn recent_trades(&self, limit: usize) -> RepositoryResult<Vec<Trade>> {
        Ok(self.state.read().await.recent_trades(limit))
    }

    async fn trade_count(&self) -> RepositoryResult<usize> {
        Ok(self.state.read().await.trades.len())
    }

    async fn load_trades(&self) -> RepositoryResult<Vec<Trade>> {
        Ok(self.state.read().await.trades.clone())
    }

    async fn load_market_state(&self) -> RepositoryResult<MarketState> {
        Ok(self.state.read().await.market_state.clone())
    }

    async fn commit(&self, changes: ChangeSet) -> RepositoryResult<()> {
        self.state.write().await.apply(changes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dinex_core::{Counterparty, Role, Side};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_commit_and_load() {
        let repo = InMemoryRepository::new();

        let mut changes = ChangeSet::new();
        changes.save_account(Account::new("Josh", Role::Admin, dec!(10000)));
        repo.commit(changes).await.unwrap();

        let account = repo.load_account("Josh").await.unwrap().unwrap();
        assert_eq!(account.role, Role::Admin);
        assert!(repo.load_account("Jack").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_orders_and_last_id() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();

        let mut filled = Order::new(OrderId(2), "Beef Stew", Side::Bid, "Sam", dec!(10), 1, now);
        filled.fill(1);
        let mut changes = ChangeSet::new();
        changes
            .save_order(Order::new(OrderId(1), "Beef Stew", Side::Ask, "Sam", dec!(12), 3, now))
            .save_order(filled);
        repo.commit(changes).await.unwrap();

        let active = repo.load_active_orders().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, OrderId(1));
        assert_eq!(repo.last_order_id().await.unwrap(), Some(OrderId(2)));
    }

    #[tokio::test]
    async fn test_recent_trades_newest_first() {
        let repo = InMemoryRepository::new();
        let now = Utc::now();

        let mut changes = ChangeSet::new();
        for price in [dec!(200), dec!(199), dec!(198)] {
            changes.append_trade(Trade::new("Lamb Korma", "Max", Counterparty::House, price, 1, now));
        }
        repo.commit(changes).await.unwrap();

        let recent = repo.recent_trades(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].price, dec!(198));
        assert_eq!(recent[1].price, dec!(199));
        assert_eq!(repo.trade_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let repo = InMemoryRepository::new();
        let other = repo.clone();

        let mut state = MarketState::default();
        state.start(Utc::now());
        let mut changes = ChangeSet::new();
        changes.save_market_state(state);
        repo.commit(changes).await.unwrap();

        assert!(other.load_market_state().await.unwrap().is_started());
    }
}
