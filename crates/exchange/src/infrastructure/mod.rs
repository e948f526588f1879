pub mod repositories;

pub use repositories::{InMemoryRepository, JsonFileRepository, MarketSnapshot};
