//! Dinex Exchange
//!
//! The matching engine of the dining exchange: offering purchases, limit
//! orders with price-time matching, cancellation, and the ledger that keeps
//! balances, positions and the trade log consistent.
//!
//! ## Usage
//!
//! ```ignore
//! let repository = Arc::new(InMemoryRepository::new());
//! let engine = MatchingEngine::bootstrap(MarketConfig::default(), repository, clock).await?;
//!
//! let josh = engine.identify("Josh").await?;
//! engine.start_offering(&josh).await?;
//! let purchase = engine.buy_from_offering(&josh, "Beef Stew", 10).await?;
//! ```

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Cross-cutting concerns
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use application::views;
pub use application::{
    Cancellation, CommandReply, Execution, MatchingEngine, OfferingPurchase, OfferingStart,
    Participant,
};
pub use config::{CatalogEntry, ConfigError, MarketConfig, OfferingConfig, TradingPolicy};
pub use error::{MarketError, Result};
pub use infrastructure::{InMemoryRepository, JsonFileRepository, MarketSnapshot};
