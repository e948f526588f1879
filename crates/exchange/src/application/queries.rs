use dinex_core::{InstrumentId, MarketState, Order, Price, Trade};
use dinex_matching::OrderBook;
use dinex_ports::MarketRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::engine::MatchingEngine;
use super::participant::Participant;
use super::views::{
    AccountBalance, BookEntry, BookView, Holding, InstrumentSummary, MarketStats, MarketSummary,
    Portfolio, TraderActivity,
};
use crate::error::Result;

const TOP_BUYERS: usize = 5;

/// Read-only side of the engine. Nothing here writes, and records that
/// do not exist yet are shown as they would be created.
impl<R: MarketRepository + ?Sized> MatchingEngine<R> {
    /// Offering price right now
    pub async fn current_price(&self) -> Price {
        let state = self.market_state.read().await;
        self.pricing.current_price(&state)
    }

    pub async fn market_state(&self) -> MarketState {
        self.market_state.read().await.clone()
    }

    fn existing_book(&self, instrument_id: &InstrumentId) -> Option<Arc<Mutex<OrderBook>>> {
        self.books
            .get(instrument_id)
            .map(|entry| entry.value().clone())
    }

    fn all_books(&self) -> Vec<Arc<Mutex<OrderBook>>> {
        self.books.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Offering status plus supply and top of book for every meal
    pub async fn market_summary(&self) -> Result<MarketSummary> {
        let state = self.market_state().await;
        let stored: HashMap<InstrumentId, _> = self
            .repository
            .load_instruments()
            .await?
            .into_iter()
            .map(|instrument| (instrument.id.clone(), instrument))
            .collect();

        let mut instruments = Vec::with_capacity(self.config.catalog.len());
        for entry in &self.config.catalog {
            let id = InstrumentId::new(&entry.name);
            let house_supply = stored
                .get(&id)
                .map(|instrument| instrument.house_supply)
                .unwrap_or(self.config.house_supply);

            let (best_ask, best_bid, spread) = match self.existing_book(&id) {
                Some(book) => {
                    let book = book.lock().await;
                    (book.best_ask_price(), book.best_bid_price(), book.spread())
                }
                None => (None, None, None),
            };

            instruments.push(InstrumentSummary {
                instrument_id: id,
                category: entry.category,
                house_supply,
                best_ask,
                best_bid,
                spread,
            });
        }

        Ok(MarketSummary {
            offering_price: self.pricing.current_price(&state),
            offering_active: state.offering_active,
            instruments,
        })
    }

    /// Full depth of one meal's book
    pub async fn order_book(&self, instrument: &str) -> Result<BookView> {
        let entry = self.catalog_entry(instrument)?;
        let id = InstrumentId::new(&entry.name);

        let (asks, bids) = match self.existing_book(&id) {
            Some(book) => {
                let snapshot = book.lock().await.snapshot();
                (
                    snapshot.asks.iter().map(BookEntry::from).collect(),
                    snapshot.bids.iter().map(BookEntry::from).collect(),
                )
            }
            None => (Vec::new(), Vec::new()),
        };

        Ok(BookView {
            instrument_id: id,
            asks,
            bids,
        })
    }

    /// Most recent trades, newest first. `None` uses the configured length.
    pub async fn trade_history(&self, limit: Option<usize>) -> Result<Vec<Trade>> {
        let limit = limit.unwrap_or(self.config.trade_history_limit);
        Ok(self.repository.recent_trades(limit).await?)
    }

    pub async fn portfolio(&self, participant: &Participant) -> Result<Portfolio> {
        let account = self.ledger.account(participant.username()).await?;
        let holdings = account
            .open_positions()
            .map(|(instrument_id, shares)| Holding {
                instrument_id: instrument_id.clone(),
                shares,
            })
            .collect();

        Ok(Portfolio {
            username: account.username.clone(),
            balance: account.balance,
            holdings,
        })
    }

    /// The caller's resting orders, oldest first
    pub async fn open_orders(&self, participant: &Participant) -> Result<Vec<Order>> {
        let mut orders = Vec::new();
        for book in self.all_books() {
            let book = book.lock().await;
            orders.extend(book.orders_of(participant.username()).cloned());
        }
        orders.sort_by_key(|order| order.id);
        Ok(orders)
    }

    pub async fn market_stats(&self) -> Result<MarketStats> {
        let accounts = self.repository.load_accounts().await?;
        let open_positions: usize = accounts
            .iter()
            .map(|account| account.open_positions().count())
            .sum();
        let active_orders = self.repository.load_active_orders().await?.len();
        let trades = self.repository.load_trades().await?;

        let mut per_buyer: HashMap<&str, usize> = HashMap::new();
        for trade in &trades {
            *per_buyer.entry(trade.buyer.as_str()).or_default() += 1;
        }
        let mut top_buyers: Vec<TraderActivity> = per_buyer
            .into_iter()
            .map(|(username, trades)| TraderActivity {
                username: username.to_string(),
                trades,
            })
            .collect();
        top_buyers.sort_by(|a, b| b.trades.cmp(&a.trades).then_with(|| a.username.cmp(&b.username)));
        top_buyers.truncate(TOP_BUYERS);

        Ok(MarketStats {
            accounts: accounts.len(),
            instruments: self.config.catalog.len(),
            open_positions,
            active_orders,
            total_trades: trades.len(),
            top_buyers,
        })
    }

    /// Cash of every roster member, in roster order
    pub async fn balances(&self) -> Result<Vec<AccountBalance>> {
        let mut balances = Vec::with_capacity(self.config.participants.len());
        for username in &self.config.participants {
            let account = self.ledger.account(username).await?;
            balances.push(AccountBalance {
                username: account.username,
                role: account.role,
                balance: account.balance,
            });
        }
        Ok(balances)
    }
}
