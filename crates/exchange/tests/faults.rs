//! Storage Fault Integration Tests
//!
//! Wraps the in-memory repository so that a chosen commit fails, then
//! checks what the engine leaves behind.

use async_trait::async_trait;
use dinex_clock::ManualClock;
use dinex_core::{Account, Instrument, InstrumentId, MarketState, Order, OrderId, OrderStatus, Trade};
use dinex_exchange::{CommandReply, InMemoryRepository, MarketConfig, MatchingEngine, Participant};
use dinex_ports::{ChangeSet, MarketRepository, RepositoryError, RepositoryResult};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const STEW: &str = "Beef Stew";

/// In-memory store whose n-th commit from an armed point fails
#[derive(Default)]
struct FlakyRepository {
    inner: InMemoryRepository,
    commits: AtomicUsize,
    failing: AtomicUsize,
}

impl FlakyRepository {
    /// Make the `nth` commit from now fail (1 = the very next one)
    fn fail_commit(&self, nth: usize) {
        let done = self.commits.load(Ordering::SeqCst);
        self.failing.store(done + nth, Ordering::SeqCst);
    }
}

#[async_trait]
impl MarketRepository for FlakyRepository {
    async fn load_account(&self, username: &str) -> RepositoryResult<Option<Account>> {
        self.inner.load_account(username).await
    }

    async fn load_accounts(&self) -> RepositoryResult<Vec<Account>> {
        self.inner.load_accounts().await
    }

    async fn load_instrument(&self, id: &InstrumentId) -> RepositoryResult<Option<Instrument>> {
        self.inner.load_instrument(id).await
    }

    async fn load_instruments(&self) -> RepositoryResult<Vec<Instrument>> {
        self.inner.load_instruments().await
    }

    async fn load_order(&self, id: OrderId) -> RepositoryResult<Option<Order>> {
        self.inner.load_order(id).await
    }

    async fn load_active_orders(&self) -> RepositoryResult<Vec<Order>> {
        self.inner.load_active_orders().await
    }

    async fn last_order_id(&self) -> RepositoryResult<Option<OrderId>> {
        self.inner.last_order_id().await
    }

    async fn recent_trades(&self, limit: usize) -> RepositoryResult<Vec<Trade>> {
        self.inner.recent_trades(limit).await
    }

    async fn trade_count(&self) -> RepositoryResult<usize> {
        self.inner.trade_count().await
    }

    async fn load_trades(&self) -> RepositoryResult<Vec<Trade>> {
        self.inner.load_trades().await
    }

    async fn load_market_state(&self) -> RepositoryResult<MarketState> {
        self.inner.load_market_state().await
    }

    async fn commit(&self, changes: ChangeSet) -> RepositoryResult<()> {
        let n = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("disk on fire".into()));
        }
        self.inner.commit(changes).await
    }
}

struct Setup {
    engine: MatchingEngine<FlakyRepository>,
    repository: Arc<FlakyRepository>,
}

impl Setup {
    async fn who(&self, name: &str) -> Participant {
        self.engine.identify(name).await.unwrap()
    }
}

async fn setup() -> Setup {
    let _ = env_logger::builder().is_test(true).try_init();
    let repository = Arc::new(FlakyRepository::default());
    let engine = MatchingEngine::bootstrap(
        MarketConfig::default(),
        repository.clone(),
        ManualClock::arc_now(),
    )
    .await
    .unwrap();
    Setup { engine, repository }
}

#[tokio::test]
async fn test_fault_mid_walk_keeps_earlier_fills() {
    let setup = setup().await;
    let levi = setup.who("Levi").await;
    let jack = setup.who("Jack").await;
    let sam = setup.who("Sam").await;

    setup.engine.place_sell(&levi, STEW, dec!(10), 2, true).await.unwrap();
    let jack_ask = setup
        .engine
        .place_sell(&jack, STEW, dec!(11), 3, true)
        .await
        .unwrap()
        .resting
        .unwrap();

    // First fill commits, the second one hits the fault
    setup.repository.fail_commit(2);
    let err = setup
        .engine
        .place_buy(&sam, STEW, dec!(11), 5, false)
        .await
        .unwrap_err();
    assert!(err.is_fatal());

    let trades = setup.repository.load_trades().await.unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].seller.to_string(), "Levi");
    assert_eq!(trades[0].quantity, 2);

    let sam_account = setup.repository.load_account("Sam").await.unwrap().unwrap();
    assert_eq!(sam_account.balance, dec!(9980));
    assert_eq!(sam_account.position(&InstrumentId::from(STEW)), 2);
    let jack_account = setup.repository.load_account("Jack").await.unwrap().unwrap();
    assert_eq!(jack_account.balance, dec!(10000));

    // Jack's ask keeps its place and its pre-fault remaining
    let book = setup.engine.order_book(STEW).await.unwrap();
    assert_eq!(book.asks.len(), 1);
    assert_eq!(book.asks[0].order_id, jack_ask);
    assert_eq!(book.asks[0].remaining, 3);
    let stored = setup.repository.load_order(jack_ask).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Active);
    assert_eq!(stored.remaining, 3);

    // No resting bid was created for the unfilled part
    assert!(book.bids.is_empty());
    assert_eq!(setup.repository.last_order_id().await.unwrap(), Some(jack_ask));
    assert!(setup.engine.open_orders(&sam).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fault_while_resting_leaves_no_order() {
    let setup = setup().await;
    let sam = setup.who("Sam").await;

    setup.repository.fail_commit(1);
    let result = setup.engine.place_buy(&sam, STEW, dec!(10), 4, false).await;

    let err = CommandReply::from_result(result).unwrap_err();
    assert!(err.is_fatal());
    assert!(setup.engine.order_book(STEW).await.unwrap().bids.is_empty());
    assert!(setup.repository.load_active_orders().await.unwrap().is_empty());

    // The engine keeps working once the store recovers
    let execution = setup.engine.place_buy(&sam, STEW, dec!(10), 4, false).await.unwrap();
    assert!(execution.resting.is_some());
}

#[tokio::test]
async fn test_fault_on_cancel_keeps_order_on_book() {
    let setup = setup().await;
    let levi = setup.who("Levi").await;
    let order_id = setup
        .engine
        .place_sell(&levi, STEW, dec!(30), 2, true)
        .await
        .unwrap()
        .resting
        .unwrap();

    setup.repository.fail_commit(1);
    assert!(setup.engine.cancel(&levi, order_id).await.unwrap_err().is_fatal());

    let book = setup.engine.order_book(STEW).await.unwrap();
    assert_eq!(book.asks.len(), 1);
    let stored = setup.repository.load_order(order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Active);

    setup.engine.cancel(&levi, order_id).await.unwrap();
    assert!(setup.engine.order_book(STEW).await.unwrap().asks.is_empty());
}
