mod in_memory;
mod json_file;
mod snapshot;

pub use in_memory::InMemoryRepository;
pub use json_file::JsonFileRepository;
pub use snapshot::{MarketSnapshot, StoredMarket};
