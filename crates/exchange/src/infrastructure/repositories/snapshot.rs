use dinex_core::{Account, Instrument, InstrumentId, MarketState, Order, OrderId, Trade};
use dinex_ports::ChangeSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entire market state held by the repository adapters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub accounts: BTreeMap<String, Account>,
    pub instruments: BTreeMap<InstrumentId, Instrument>,
    pub orders: BTreeMap<OrderId, Order>,
    /// Oldest first
    pub trades: Vec<Trade>,
    pub market_state: MarketState,
}

impl MarketSnapshot {
    /// Apply every write of a change set
    pub fn apply(&mut self, changes: ChangeSet) {
        for account in changes.accounts {
            self.accounts.insert(account.username.clone(), account);
        }
        for instrument in changes.instruments {
            self.instruments.insert(instrument.id.clone(), instrument);
        }
        for order in changes.orders {
            self.orders.insert(order.id, order);
        }
        self.trades.extend(changes.trades);
        if let Some(state) = changes.market_state {
            self.market_state = state;
        }
    }

    pub fn active_orders(&self) -> Vec<Order> {
        self.orders.values().filter(|o| o.is_active()).cloned().collect()
    }

    pub fn last_order_id(&self) -> Option<OrderId> {
        self.orders.keys().next_back().copied()
    }

    /// Newest first
    pub fn recent_trades(&self, limit: usize) -> Vec<Trade> {
        self.trades.iter().rev().take(limit).cloned().collect()
    }
}

/// On-disk layout of a snapshot
///
/// Collections are stored as lists so that no key type has to be a JSON
/// string.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoredMarket {
    #[serde(default)]
    pub market_state: MarketState,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub trades: Vec<Trade>,
}

impl From<&MarketSnapshot> for StoredMarket {
    fn from(snapshot: &MarketSnapshot) -> Self {
        Self {
            market_state: snapshot.market_state.clone(),
            accounts: snapshot.accounts.values().cloned().collect(),
            instruments: snapshot.instruments.values().cloned().collect(),
            orders: snapshot.orders.values().cloned().collect(),
            trades: snapshot.trades.clone(),
        }
    }
}

impl From<StoredMarket> for MarketSnapshot {
    fn from(stored: StoredMarket) -> Self {
        let mut snapshot = MarketSnapshot {
            market_state: stored.market_state,
            trades: stored.trades,
            ..Default::default()
        };
        snapshot.apply(ChangeSet {
            accounts: stored.accounts,
            instruments: stored.instruments,
            orders: stored.orders,
            ..Default::default()
        });
        snapshot
    }
}
