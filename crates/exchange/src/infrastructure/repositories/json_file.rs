use async_trait::async_trait;
use dinex_core::{Account, Instrument, InstrumentId, MarketState, Order, OrderId, Trade};
use dinex_ports::{ChangeSet, MarketRepository, RepositoryError, RepositoryResult};
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::snapshot::{MarketSnapshot, StoredMarket};

/// Durable market repository backed by one JSON document
///
/// The whole market is kept in memory and the file is rewritten on every
/// commit: the new document goes to a sibling temp file which is then
/// renamed over the old one. A failed write leaves both the file and the
/// in-memory state as they were.
pub struct JsonFileRepository {
    path: PathBuf,
    state: RwLock<MarketSnapshot>,
}

impl JsonFileRepository {
    /// Open a store, starting empty if the file does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let stored: StoredMarket = serde_json::from_str(&content).map_err(|e| {
                    RepositoryError::Corrupt(format!("{}: {}", path.display(), e))
                })?;
                info!(
                    "Opened market store {} ({} accounts, {} orders, {} trades)",
                    path.display(),
                    stored.accounts.len(),
                    stored.orders.len(),
                    stored.trades.len()
                );
                MarketSnapshot::from(stored)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Creating new market store at {}", path.display());
                MarketSnapshot::default()
            }
            Err(e) => return Err(io_error(&path, e)),
        };

        Ok(Self {
            path,
            state: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn persist(&self, snapshot: &MarketSnapshot) -> RepositoryResult<()> {
        let json = serde_json::to_string_pretty(&StoredMarket::from(snapshot))
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| io_error(&temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> RepositoryError {
    RepositoryError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl MarketRepository for JsonFileRepository {
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
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.apply(changes);
        self.persist(&next).await?;
        *state = next;
        debug!("Committed market store {}", self.path.display());
        Ok(())
    }
}
