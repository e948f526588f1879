//! Terminal Session Tests
//!
//! Drives a session line by line, the way the binary does, against an
//! in-memory market with a manual clock.

use chrono::Duration;
use dinex_clock::ManualClock;
use dinex_exchange::{InMemoryRepository, JsonFileRepository, MarketConfig, MatchingEngine};
use dinex_runner::{Outcome, Session};
use std::path::Path;
use std::sync::Arc;

async fn session() -> (Session<InMemoryRepository>, Arc<ManualClock>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = ManualClock::arc_now();
    let engine = MatchingEngine::bootstrap(
        MarketConfig::default(),
        Arc::new(InMemoryRepository::new()),
        clock.clone(),
    )
    .await
    .unwrap();
    (Session::new(Arc::new(engine)), clock)
}

async fn durable_session(path: &Path) -> Session<JsonFileRepository> {
    let repository = Arc::new(JsonFileRepository::open(path).await.unwrap());
    let engine = MatchingEngine::bootstrap(MarketConfig::default(), repository, ManualClock::arc_now())
        .await
        .unwrap();
    Session::new(Arc::new(engine))
}

async fn run<R>(session: &mut Session<R>, line: &str) -> String
where
    R: dinex_ports::MarketRepository + ?Sized,
{
    match session.handle_line(line).await.unwrap() {
        Outcome::Print(text) => text,
        Outcome::Quit => "<quit>".to_string(),
    }
}

#[tokio::test]
async fn test_trading_needs_login() {
    let (mut session, _) = session().await;

    assert_eq!(run(&mut session, "ipo 1 Beef Stew").await, "Error: Not logged in");
    assert_eq!(run(&mut session, "portfolio").await, "Error: Not logged in");
    assert!(run(&mut session, "market").await.contains("Beef Stew"));
}

#[tokio::test]
async fn test_unknown_user_is_refused() {
    let (mut session, _) = session().await;

    assert_eq!(run(&mut session, "login Mallory").await, "Error: Invalid user: Mallory");
    assert!(session.participant().is_none());
}

#[tokio::test]
async fn test_offering_flow() {
    let (mut session, clock) = session().await;

    run(&mut session, "login Sam").await;
    assert_eq!(
        run(&mut session, "start").await,
        "Error: Only an admin can start the IPO"
    );
    assert_eq!(run(&mut session, "ipo 10 Beef Stew").await, "Error: IPO not started");

    run(&mut session, "logout").await;
    assert_eq!(run(&mut session, "login Josh").await, "Logged in as Josh");
    assert_eq!(run(&mut session, "start").await, "IPO started");
    assert_eq!(run(&mut session, "start").await, "IPO already running");

    clock.advance(Duration::seconds(31));
    assert_eq!(run(&mut session, "price").await, "IPO price: $190.00");

    let bought = run(&mut session, "ipo 10 Beef Stew").await;
    assert!(bought.starts_with("Bought 10 shares of Beef Stew at $190.00"), "{}", bought);

    let portfolio = run(&mut session, "portfolio").await;
    assert!(portfolio.starts_with("Josh: $8100.00"), "{}", portfolio);
    assert!(portfolio.contains("10 Beef Stew"));
}

#[tokio::test]
async fn test_orders_and_cancel() {
    let (mut session, _) = session().await;

    run(&mut session, "login Levi").await;
    assert_eq!(
        run(&mut session, "ask 30 5 Scrambled Eggs").await,
        "Error: Insufficient shares: need 5, hold 0"
    );
    assert_eq!(
        run(&mut session, "short 30 5 Scrambled Eggs").await,
        "Executed 0 shares, 5 shares added to order book"
    );
    assert!(run(&mut session, "orders").await.starts_with("#1 ASK 5 of Scrambled Eggs @ $30.00"));
    assert!(run(&mut session, "book Scrambled Eggs").await.contains("Levi"));

    run(&mut session, "logout").await;
    run(&mut session, "login Max").await;
    assert_eq!(run(&mut session, "cancel 1").await, "Error: Not your order: 1");

    let filled = run(&mut session, "snap 31 2 Scrambled Eggs").await;
    assert!(filled.starts_with("Executed 2 shares"), "{}", filled);
    assert!(filled.contains("Max <- Levi | 2 Scrambled Eggs @ $30.00"));

    run(&mut session, "logout").await;
    run(&mut session, "login Levi").await;
    assert_eq!(run(&mut session, "cancel 1").await, "Order cancelled");
    assert_eq!(run(&mut session, "orders").await, "No open orders");
    assert_eq!(run(&mut session, "cancel 1").await, "Error: Order not active: 1");
}

#[tokio::test]
async fn test_parse_errors_are_printed() {
    let (mut session, _) = session().await;

    assert_eq!(run(&mut session, "").await, "");
    assert!(run(&mut session, "dance").await.starts_with("Error: Unknown command"));
    assert!(run(&mut session, "bid x 1 Beef Stew").await.starts_with("Error: Not a valid price"));
    assert_eq!(run(&mut session, "quit").await, "<quit>");
}

#[tokio::test]
async fn test_queries_without_login() {
    let (mut session, _) = session().await;

    assert_eq!(run(&mut session, "history").await, "No trades yet");
    assert_eq!(run(&mut session, "price").await, "IPO price: $200.00 (not started)");
    assert!(run(&mut session, "stats").await.contains("Meals: 42"));
    let balances = run(&mut session, "balances").await;
    assert_eq!(balances.lines().count(), 16);
    assert!(balances.lines().next().unwrap().contains("10000.00"));
    assert_eq!(run(&mut session, "book Pizza").await, "Error: Invalid meal: Pizza");
}

#[tokio::test]
async fn test_session_over_durable_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("market.json");

    {
        let mut session = durable_session(&path).await;
        run(&mut session, "login Jack").await;
        run(&mut session, "short 45 3 Lamb Korma").await;
    }

    let mut session = durable_session(&path).await;
    run(&mut session, "login Jack").await;
    assert!(run(&mut session, "orders").await.contains("3 of Lamb Korma @ $45.00"));
}
