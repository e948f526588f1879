use dinex_core::{
    Account, Counterparty, Instrument, InstrumentId, Order, Price, Quantity, Timestamp, Trade,
    notional, shares_of,
};
use dinex_ports::{ChangeSet, MarketRepository};
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::MarketConfig;
use crate::error::{MarketError, Result};

/// Balances, positions and the trade log
///
/// Reads go straight to the repository. Writes go through a
/// [`LedgerSession`], which holds the ledger gate so that the
/// check-then-commit of one fill cannot interleave with another.
pub struct Ledger<R: MarketRepository + ?Sized> {
    repository: Arc<R>,
    config: Arc<MarketConfig>,
    gate: Mutex<()>,
}

impl<R: MarketRepository + ?Sized> Ledger<R> {
    pub fn new(repository: Arc<R>, config: Arc<MarketConfig>) -> Self {
        Self {
            repository,
            config,
            gate: Mutex::new(()),
        }
    }

    /// Stored account, or the one a first reference would create
    pub async fn account(&self, username: &str) -> Result<Account> {
        Ok(self
            .repository
            .load_account(username)
            .await?
            .unwrap_or_else(|| self.config.new_account(username)))
    }

    /// Persist the account on its first reference, and bring a stored
    /// account's role in line with the configured admins
    pub async fn ensure_account(&self, username: &str) -> Result<Account> {
        let mut session = self.session().await;
        let role = self.config.role_of(username).unwrap_or_default();
        let account = match self.repository.load_account(username).await? {
            Some(account) if account.role == role => return Ok(account),
            Some(mut account) => {
                info!("Role of {} changed from {:?} to {:?}", username, account.role, role);
                account.role = role;
                account
            }
            None => {
                debug!("Creating account for {} ({:?})", username, role);
                self.config.new_account(username)
            }
        };
        session.changes.save_account(account.clone());
        session.commit().await?;
        Ok(account)
    }

    /// Take the ledger gate and start staging writes
    pub async fn session(&self) -> LedgerSession<'_, R> {
        LedgerSession {
            ledger: self,
            _gate: self.gate.lock().await,
            accounts: HashMap::new(),
            changes: ChangeSet::new(),
        }
    }
}

/// Writes of one atomic step, staged under the ledger gate
///
/// Nothing is visible to other readers until [`commit`](Self::commit);
/// dropping the session discards everything it staged.
pub struct LedgerSession<'a, R: MarketRepository + ?Sized> {
    ledger: &'a Ledger<R>,
    _gate: MutexGuard<'a, ()>,
    accounts: HashMap<String, Account>,
    changes: ChangeSet,
}

impl<'a, R: MarketRepository + ?Sized> LedgerSession<'a, R> {
    /// Account as staged in this session
    pub async fn account(&mut self, username: &str) -> Result<&Account> {
        self.stage_account(username).await?;
        Ok(&self.accounts[username])
    }

    async fn stage_account(&mut self, username: &str) -> Result<()> {
        if !self.accounts.contains_key(username) {
            let account = self.ledger.account(username).await?;
            self.accounts.insert(username.to_string(), account);
        }
        Ok(())
    }

    fn account_mut(&mut self, username: &str) -> Option<&mut Account> {
        self.accounts.get_mut(username)
    }

    /// Move cash and shares between buyer and seller and log the trade.
    ///
    /// Callers have already run every domain check. The house side of an
    /// offering purchase has no account and is left untouched; a buyer
    /// trading with themselves nets to zero. A figure that would overflow
    /// fails the trade, and the session must then be dropped uncommitted.
    pub async fn execute_trade(
        &mut self,
        buyer: &str,
        seller: Counterparty,
        instrument_id: &InstrumentId,
        price: Price,
        quantity: Quantity,
        now: Timestamp,
    ) -> Result<Trade> {
        let cost = notional(price, quantity).ok_or(MarketError::ValueOutOfRange)?;
        let shares = shares_of(quantity).ok_or(MarketError::InvalidQuantity)?;

        self.stage_account(buyer).await?;
        if let Some(account) = self.account_mut(buyer) {
            account.apply_purchase(instrument_id, shares, cost)?;
        }

        if let Some(name) = seller.username() {
            let name = name.to_string();
            self.stage_account(&name).await?;
            if let Some(account) = self.account_mut(&name) {
                account.apply_sale(instrument_id, shares, cost)?;
            }
        }

        let trade = Trade::new(instrument_id.clone(), buyer, seller, price, quantity, now);
        self.changes.append_trade(trade.clone());
        Ok(trade)
    }

    pub fn save_order(&mut self, order: Order) {
        self.changes.save_order(order);
    }

    pub fn save_instrument(&mut self, instrument: Instrument) {
        self.changes.save_instrument(instrument);
    }

    /// Write everything staged as one change set
    pub async fn commit(mut self) -> Result<()> {
        for account in self.accounts.drain().map(|(_, account)| account) {
            self.changes.save_account(account);
        }
        if self.changes.is_empty() {
            return Ok(());
        }
        let changes = std::mem::take(&mut self.changes);
        self.ledger.repository.commit(changes).await.map_err(|e| {
            error!("Ledger commit failed: {}", e);
            MarketError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryRepository;
    use chrono::Utc;
    use dinex_core::Role;
    use rust_decimal_macros::dec;

    fn ledger() -> (Arc<InMemoryRepository>, Ledger<InMemoryRepository>) {
        let repository = Arc::new(InMemoryRepository::new());
        let ledger = Ledger::new(repository.clone(), Arc::new(MarketConfig::default()));
        (repository, ledger)
    }

    #[tokio::test]
    async fn test_trade_is_zero_sum() {
        let (repository, ledger) = ledger();
        let stew = InstrumentId::from("Beef Stew");

        let mut session = ledger.session().await;
        session
            .execute_trade("Josh", Counterparty::participant("Jack"), &stew, dec!(50), 3, Utc::now())
            .await
            .unwrap();
        session.commit().await.unwrap();

        let josh = repository.load_account("Josh").await.unwrap().unwrap();
        let jack = repository.load_account("Jack").await.unwrap().unwrap();
        assert_eq!(josh.balance, dec!(9850));
        assert_eq!(jack.balance, dec!(10150));
        assert_eq!(josh.position(&stew), 3);
        assert_eq!(jack.position(&stew), -3);
        assert_eq!(repository.trade_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_house_has_no_account() {
        let (repository, ledger) = ledger();
        let eggs = InstrumentId::from("Scrambled Eggs");

        let mut session = ledger.session().await;
        let trade = session
            .execute_trade("Sam", Counterparty::House, &eggs, dec!(200), 10, Utc::now())
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert!(trade.is_offering());
        assert_eq!(repository.load_accounts().await.unwrap().len(), 1);
        let sam = repository.load_account("Sam").await.unwrap().unwrap();
        assert_eq!(sam.balance, dec!(8000));
    }

    #[tokio::test]
    async fn test_self_trade_nets_to_zero() {
        let (repository, ledger) = ledger();
        let stew = InstrumentId::from("Beef Stew");

        let mut session = ledger.session().await;
        session
            .execute_trade("Max", Counterparty::participant("Max"), &stew, dec!(75), 4, Utc::now())
            .await
            .unwrap();
        session.commit().await.unwrap();

        let max = repository.load_account("Max").await.unwrap().unwrap();
        assert_eq!(max.balance, dec!(10000));
        assert_eq!(max.position(&stew), 0);
    }

    #[tokio::test]
    async fn test_dropped_session_writes_nothing() {
        let (repository, ledger) = ledger();
        let stew = InstrumentId::from("Beef Stew");

        {
            let mut session = ledger.session().await;
            session
                .execute_trade("Josh", Counterparty::House, &stew, dec!(1), 1, Utc::now())
                .await
                .unwrap();
        }

        assert_eq!(repository.trade_count().await.unwrap(), 0);
        assert!(repository.load_account("Josh").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_account_is_idempotent() {
        let (repository, ledger) = ledger();

        let first = ledger.ensure_account("Josh").await.unwrap();
        let second = ledger.ensure_account("Josh").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repository.load_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overflowing_trade_fails_without_writes() {
        let (repository, ledger) = ledger();
        let stew = InstrumentId::from("Beef Stew");

        let mut session = ledger.session().await;
        let result = session
            .execute_trade(
                "Josh",
                Counterparty::participant("Jack"),
                &stew,
                rust_decimal::Decimal::MAX,
                2,
                Utc::now(),
            )
            .await;
        assert!(matches!(result, Err(MarketError::ValueOutOfRange)));
        drop(session);

        assert_eq!(repository.trade_count().await.unwrap(), 0);
        assert!(repository.load_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_account_follows_configured_admins() {
        let repository = Arc::new(InMemoryRepository::new());
        let before = Ledger::new(repository.clone(), Arc::new(MarketConfig::default()));
        assert_eq!(before.ensure_account("Jack").await.unwrap().role, Role::Participant);

        let config = MarketConfig {
            admins: vec!["Jack".into()],
            ..MarketConfig::default()
        };
        let after = Ledger::new(repository.clone(), Arc::new(config));
        assert_eq!(after.ensure_account("Jack").await.unwrap().role, Role::Admin);
        assert_eq!(after.ensure_account("Josh").await.unwrap().role, Role::Participant);

        let stored = repository.load_account("Jack").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);
        assert_eq!(stored.balance, dec!(10000));
    }
}
