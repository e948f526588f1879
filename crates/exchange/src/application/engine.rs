use dashmap::DashMap;
use dinex_clock::PricingClock;
use dinex_core::{
    Counterparty, Instrument, InstrumentId, MarketState, Order, OrderId, Price, Quantity, Side,
    Trade, notional, shares_of,
};
use dinex_matching::OrderBook;
use dinex_ports::{ChangeSet, Clock, MarketRepository};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};

use super::ledger::Ledger;
use super::participant::Participant;
use super::reply::{Cancellation, Execution, OfferingPurchase, OfferingStart};
use crate::config::{CatalogEntry, MarketConfig};
use crate::error::{MarketError, Result};

/// The only writer of books and ledger
///
/// Each instrument's book sits behind its own mutex, which is held for a
/// whole command on that instrument (matching loop, offering purchase or
/// cancel). Every fill then takes the ledger gate for its
/// check-and-commit. Locks are always taken book first, ledger second.
pub struct MatchingEngine<R: MarketRepository + ?Sized> {
    pub(super) config: Arc<MarketConfig>,
    pub(super) repository: Arc<R>,
    pub(super) ledger: Ledger<R>,
    pub(super) pricing: PricingClock<dyn Clock>,
    pub(super) books: DashMap<InstrumentId, Arc<Mutex<OrderBook>>>,
    pub(super) market_state: RwLock<MarketState>,
    next_order_id: AtomicU64,
}

impl<R: MarketRepository + ?Sized> MatchingEngine<R> {
    /// Build the engine from whatever the repository holds.
    ///
    /// Books are rebuilt from the stored active orders, and order ids carry
    /// on after the highest one ever issued. Active orders for meals that
    /// left the catalog are cancelled in storage.
    pub async fn bootstrap(
        config: MarketConfig,
        repository: Arc<R>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let market_state = repository.load_market_state().await?;
        let next_order_id = repository
            .last_order_id()
            .await?
            .map(|id| id.next())
            .unwrap_or(OrderId(1));

        let mut by_instrument: HashMap<InstrumentId, Vec<Order>> = HashMap::new();
        let mut withdrawn = ChangeSet::new();
        for mut order in repository.load_active_orders().await? {
            if config.catalog_entry(order.symbol()).is_none() {
                warn!(
                    "Cancelling order {} of {}: {} is no longer on the menu",
                    order.id, order.owner, order.instrument_id
                );
                order.cancel();
                withdrawn.save_order(order);
                continue;
            }
            by_instrument
                .entry(order.instrument_id.clone())
                .or_default()
                .push(order);
        }
        if !withdrawn.is_empty() {
            repository.commit(withdrawn).await?;
        }

        let books = DashMap::new();
        let mut resting = 0;
        for (instrument_id, orders) in by_instrument {
            let book = OrderBook::from_orders(instrument_id.clone(), orders);
            resting += book.len();
            books.insert(instrument_id, Arc::new(Mutex::new(book)));
        }

        info!(
            "Market ready: {} participants, {} meals, {} resting orders, IPO {} ({})",
            config.participants.len(),
            config.catalog.len(),
            resting,
            if market_state.offering_active { "active" } else { "not started" },
            clock.name()
        );

        Ok(Self {
            pricing: PricingClock::new(config.offering.schedule(), clock),
            ledger: Ledger::new(repository.clone(), config.clone()),
            config,
            repository,
            books,
            market_state: RwLock::new(market_state),
            next_order_id: AtomicU64::new(next_order_id.0),
        })
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub(super) fn catalog_entry(&self, name: &str) -> Result<&CatalogEntry> {
        self.config
            .catalog_entry(name)
            .ok_or_else(|| MarketError::InvalidInstrument(name.to_string()))
    }

    /// Book of an instrument, registered on first use
    pub(super) fn book(&self, instrument_id: &InstrumentId) -> Arc<Mutex<OrderBook>> {
        self.books
            .entry(instrument_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(OrderBook::new(instrument_id.clone()))))
            .value()
            .clone()
    }

    /// Stored instrument, or the one a first reference would create
    pub(super) async fn instrument(&self, entry: &CatalogEntry) -> Result<Instrument> {
        let id = InstrumentId::new(&entry.name);
        Ok(self
            .repository
            .load_instrument(&id)
            .await?
            .unwrap_or_else(|| self.config.new_instrument(entry)))
    }

    fn allocate_order_id(&self) -> OrderId {
        OrderId(self.next_order_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Admit a roster member, creating their account on first sight
    pub async fn identify(&self, username: &str) -> Result<Participant> {
        if !self.config.is_participant(username) {
            debug!("Rejected unknown participant {}", username);
            return Err(MarketError::UnknownParticipant(username.to_string()));
        }
        let account = self.ledger.ensure_account(username).await?;
        Ok(Participant::new(username, account.role))
    }

    /// Start the offering clock. Only the first successful call has any
    /// effect.
    pub async fn start_offering(&self, participant: &Participant) -> Result<OfferingStart> {
        let account = self.ledger.account(participant.username()).await?;
        if !account.role.can_start_offering() {
            debug!("{} may not start the IPO", participant);
            return Err(MarketError::Unauthorized);
        }

        let mut state = self.market_state.write().await;
        if let Some(at) = state.offering_started_at {
            return Ok(OfferingStart::AlreadyStarted(at));
        }

        let now = self.pricing.now();
        let mut next = state.clone();
        next.start(now);
        let mut changes = ChangeSet::new();
        changes.save_market_state(next.clone());
        self.repository.commit(changes).await?;
        *state = next;

        info!("{} started the IPO at {}", participant, now);
        Ok(OfferingStart::Started(now))
    }

    /// Buy shares straight from the house at the current offering price
    pub async fn buy_from_offering(
        &self,
        participant: &Participant,
        instrument: &str,
        quantity: Quantity,
    ) -> Result<OfferingPurchase> {
        let state = self.market_state.read().await.clone();
        if !state.offering_active {
            return Err(MarketError::OfferingNotActive);
        }
        let entry = self.catalog_entry(instrument)?;
        if quantity == 0 {
            return Err(MarketError::InvalidQuantity);
        }

        let instrument_id = InstrumentId::new(&entry.name);
        let handle = self.book(&instrument_id);
        let _book = handle.lock().await;

        let mut meal = self.instrument(entry).await?;
        if !meal.issue(quantity) {
            return Err(MarketError::InsufficientSupply {
                requested: quantity,
                available: meal.house_supply,
            });
        }

        let price = self.pricing.current_price(&state);
        let cost = notional(price, quantity).ok_or(MarketError::ValueOutOfRange)?;
        let mut session = self.ledger.session().await;
        let account = session.account(participant.username()).await?;
        if !account.can_afford(cost) {
            return Err(MarketError::InsufficientFunds {
                required: cost,
                available: account.balance,
            });
        }

        session.save_instrument(meal);
        let trade = session
            .execute_trade(
                participant.username(),
                Counterparty::House,
                &instrument_id,
                price,
                quantity,
                self.pricing.now(),
            )
            .await?;
        session.commit().await?;

        info!("IPO: {} bought {} {} at {:.2}", participant, quantity, instrument_id, price);
        Ok(OfferingPurchase {
            instrument_id,
            quantity,
            price,
            cost,
            trade,
        })
    }

    /// Buy against resting asks up to `limit`.
    ///
    /// Whatever is left rests as a bid, unless `snap` is set, in which case
    /// it is dropped.
    pub async fn place_buy(
        &self,
        participant: &Participant,
        instrument: &str,
        limit: Price,
        quantity: Quantity,
        snap: bool,
    ) -> Result<Execution> {
        let entry = self.catalog_entry(instrument)?;
        validate_order(limit, quantity)?;

        let instrument_id = InstrumentId::new(&entry.name);
        let handle = self.book(&instrument_id);
        let mut book = handle.lock().await;

        let (remaining, trades) = self
            .match_incoming(&mut book, participant, Side::Bid, limit, quantity)
            .await?;

        let resting = if remaining > 0 && !snap {
            Some(
                self.rest_order(&mut book, participant, Side::Bid, limit, remaining)
                    .await?,
            )
        } else {
            None
        };

        execution(instrument_id, Side::Bid, quantity, remaining, resting, trades)
    }

    /// Sell against resting bids down to `limit`; the rest always rests.
    ///
    /// A `short` sell skips the position check entirely, if the trading
    /// policy allows it.
    pub async fn place_sell(
        &self,
        participant: &Participant,
        instrument: &str,
        limit: Price,
        quantity: Quantity,
        short: bool,
    ) -> Result<Execution> {
        let entry = self.catalog_entry(instrument)?;
        validate_order(limit, quantity)?;
        if short && !self.config.policy.allow_short_selling {
            return Err(MarketError::ShortSellingDisabled);
        }

        let instrument_id = InstrumentId::new(&entry.name);
        let handle = self.book(&instrument_id);
        let mut book = handle.lock().await;

        if !short {
            let needed = shares_of(quantity).ok_or(MarketError::InvalidQuantity)?;
            let held = self
                .ledger
                .account(participant.username())
                .await?
                .position(&instrument_id);
            if held < needed {
                return Err(MarketError::InsufficientShares {
                    required: quantity,
                    held,
                });
            }
        }

        let (remaining, trades) = self
            .match_incoming(&mut book, participant, Side::Ask, limit, quantity)
            .await?;

        let resting = if remaining > 0 {
            Some(
                self.rest_order(&mut book, participant, Side::Ask, limit, remaining)
                    .await?,
            )
        } else {
            None
        };

        execution(instrument_id, Side::Ask, quantity, remaining, resting, trades)
    }

    /// Withdraw one of the caller's active orders
    pub async fn cancel(&self, participant: &Participant, order_id: OrderId) -> Result<Cancellation> {
        let order = self.checked_for_cancel(participant, order_id).await?;

        let handle = self.book(&order.instrument_id);
        let mut book = handle.lock().await;

        // Re-read under the book lock; a fill may have landed meanwhile
        let mut order = self.checked_for_cancel(participant, order_id).await?;
        order.cancel();
        let mut changes = ChangeSet::new();
        changes.save_order(order.clone());
        self.repository.commit(changes).await?;
        book.remove(order_id);

        info!("{} cancelled order {}", participant, order_id);
        Ok(Cancellation { order })
    }

    async fn checked_for_cancel(&self, participant: &Participant, order_id: OrderId) -> Result<Order> {
        let order = self
            .repository
            .load_order(order_id)
            .await?
            .ok_or(MarketError::OrderNotFound(order_id))?;
        if order.owner != participant.username() {
            return Err(MarketError::NotOwner(order_id));
        }
        if !order.is_active() {
            return Err(MarketError::OrderNotActive(order_id));
        }
        Ok(order)
    }

    /// Walk the opposite side of the book while prices cross.
    ///
    /// Each fill commits on its own. A buyer who cannot pay for the next
    /// fill stops the walk; fills already made stand. Returns the unfilled
    /// quantity and the trades.
    async fn match_incoming(
        &self,
        book: &mut OrderBook,
        participant: &Participant,
        side: Side,
        limit: Price,
        quantity: Quantity,
    ) -> Result<(Quantity, Vec<Trade>)> {
        let mut remaining = quantity;
        let mut trades = Vec::new();

        while let Some(fill) = book.next_fill(side, limit, remaining) {
            let Some(mut maker) = book.get(fill.order_id).cloned() else {
                break;
            };
            let Some(cost) = notional(fill.price, fill.quantity) else {
                debug!(
                    "{} x{} at {} is out of range for {}; stopping",
                    book.instrument_id(), fill.quantity, fill.price, participant
                );
                break;
            };
            let mut session = self.ledger.session().await;

            let (buyer, seller) = match side {
                Side::Bid => {
                    if !session.account(participant.username()).await?.can_afford(cost) {
                        debug!(
                            "{} cannot pay {:.2} for {} {}; stopping",
                            participant, cost, fill.quantity, book.instrument_id()
                        );
                        break;
                    }
                    (
                        participant.username().to_string(),
                        Counterparty::participant(maker.owner.clone()),
                    )
                }
                Side::Ask => (
                    maker.owner.clone(),
                    Counterparty::participant(participant.username()),
                ),
            };

            maker.fill(fill.quantity);
            session.save_order(maker);
            let trade = session
                .execute_trade(
                    &buyer,
                    seller,
                    book.instrument_id(),
                    fill.price,
                    fill.quantity,
                    self.pricing.now(),
                )
                .await?;
            session.commit().await?;

            book.apply_fill(fill.order_id, fill.quantity);
            remaining -= fill.quantity;
            info!("Trade: {}", trade);
            trades.push(trade);
        }

        Ok((remaining, trades))
    }

    async fn rest_order(
        &self,
        book: &mut OrderBook,
        participant: &Participant,
        side: Side,
        limit: Price,
        quantity: Quantity,
    ) -> Result<OrderId> {
        let order = Order::new(
            self.allocate_order_id(),
            book.instrument_id().clone(),
            side,
            participant.username(),
            limit,
            quantity,
            self.pricing.now(),
        );
        let mut changes = ChangeSet::new();
        changes.save_order(order.clone());
        self.repository.commit(changes).await?;

        let order_id = order.id;
        debug!(
            "Resting {} {} x{} {} at {:.2} for {}",
            side, order_id, quantity, order.instrument_id, limit, participant
        );
        book.insert(order);
        Ok(order_id)
    }
}

/// Outcome of a limit order once matching and resting are done
fn execution(
    instrument_id: InstrumentId,
    side: Side,
    requested: Quantity,
    remaining: Quantity,
    resting: Option<OrderId>,
    trades: Vec<Trade>,
) -> Result<Execution> {
    if trades.is_empty() && resting.is_none() {
        return Err(MarketError::NoMatch);
    }
    Ok(Execution {
        instrument_id,
        side,
        requested,
        filled: requested - remaining,
        resting,
        trades,
    })
}

/// Quantity must be positive and fit a signed share count; price must be
/// positive and the order's full value must be representable.
fn validate_order(limit: Price, quantity: Quantity) -> Result<()> {
    if quantity == 0 || shares_of(quantity).is_none() {
        return Err(MarketError::InvalidQuantity);
    }
    if limit <= Decimal::ZERO {
        return Err(MarketError::InvalidPrice);
    }
    if notional(limit, quantity).is_none() {
        return Err(MarketError::ValueOutOfRange);
    }
    Ok(())
}
