//! Dinex Ports
//!
//! Port definitions (traits) for the dining exchange.
//! These define the boundaries between domain logic and infrastructure.

mod clock;
mod error;
mod repository;

pub use clock::Clock;
pub use error::{RepositoryError, RepositoryResult};
pub use repository::{ChangeSet, MarketRepository};
