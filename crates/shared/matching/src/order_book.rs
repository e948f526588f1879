use dinex_core::{InstrumentId, Order, OrderId, Price, Quantity, Side};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::price_time::{Fill, crosses, execution_price, fill_quantity};

/// Resting orders of a single instrument
///
/// Only active orders with open quantity live here. Within a price level
/// orders are kept in creation-sequence order, so the front of the best
/// level is always the order with priority.
#[derive(Debug, Clone)]
pub struct OrderBook {
    instrument_id: InstrumentId,
    /// Bids sorted by price descending (highest first)
    bids: BTreeMap<PriceKey, VecDeque<Order>>,
    /// Asks sorted by price ascending (lowest first)
    asks: BTreeMap<PriceKey, VecDeque<Order>>,
    /// Quick lookup for orders by ID
    order_index: HashMap<OrderId, (Side, Price)>,
    /// Last update sequence number
    sequence: u64,
}

/// Price key for BTreeMap ordering
/// For bids: reversed to sort descending
/// For asks: natural order (ascending)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PriceKey {
    price: Decimal,
    is_bid: bool,
}

impl PriceKey {
    fn new(side: Side, price: Price) -> Self {
        PriceKey {
            price,
            is_bid: side == Side::Bid,
        }
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.is_bid {
            // Bids: higher price first (reverse order)
            other.price.cmp(&self.price)
        } else {
            // Asks: lower price first (natural order)
            self.price.cmp(&other.price)
        }
    }
}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl OrderBook {
    pub fn new(instrument_id: impl Into<InstrumentId>) -> Self {
        OrderBook {
            instrument_id: instrument_id.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: HashMap::new(),
            sequence: 0,
        }
    }

    /// Rebuild a book from stored orders, in any order.
    ///
    /// Terminal or empty orders are skipped, as are orders of other
    /// instruments.
    pub fn from_orders(
        instrument_id: impl Into<InstrumentId>,
        orders: impl IntoIterator<Item = Order>,
    ) -> Self {
        let mut book = Self::new(instrument_id);
        for order in orders {
            if order.instrument_id == book.instrument_id {
                book.insert(order);
            }
        }
        book
    }

    pub fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<PriceKey, VecDeque<Order>> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    fn side(&self, side: Side) -> &BTreeMap<PriceKey, VecDeque<Order>> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Best bid (highest price, earliest at that price)
    pub fn best_bid(&self) -> Option<&Order> {
        self.bids.first_key_value().and_then(|(_, queue)| queue.front())
    }

    /// Best ask (lowest price, earliest at that price)
    pub fn best_ask(&self) -> Option<&Order> {
        self.asks.first_key_value().and_then(|(_, queue)| queue.front())
    }

    pub fn best_bid_price(&self) -> Option<Price> {
        self.bids.first_key_value().map(|(k, _)| k.price)
    }

    pub fn best_ask_price(&self) -> Option<Price> {
        self.asks.first_key_value().map(|(k, _)| k.price)
    }

    /// Best ask minus best bid, when both sides are quoted
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid_price(), self.best_ask_price()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Add a resting order to the book.
    ///
    /// Returns false (and leaves the book alone) if the order is not active,
    /// has nothing open, belongs to another instrument or is already
    /// present.
    pub fn insert(&mut self, order: Order) -> bool {
        if !order.is_active()
            || order.remaining == 0
            || order.instrument_id != self.instrument_id
            || self.order_index.contains_key(&order.id)
        {
            return false;
        }

        let side = order.side;
        let price = order.price;
        let order_id = order.id;
        let queue = self
            .side_mut(side)
            .entry(PriceKey::new(side, price))
            .or_default();
        // Normally a push to the back; rebuilds may arrive out of order
        let at = queue.partition_point(|o| o.sequence() < order.sequence());
        queue.insert(at, order);

        self.order_index.insert(order_id, (side, price));
        self.sequence += 1;
        true
    }

    /// Remove an order from the book
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let (side, price) = self.order_index.remove(&order_id)?;
        let key = PriceKey::new(side, price);
        let levels = self.side_mut(side);
        let queue = levels.get_mut(&key)?;
        let pos = queue.iter().position(|o| o.id == order_id)?;
        let order = queue.remove(pos)?;
        if queue.is_empty() {
            levels.remove(&key);
        }

        self.sequence += 1;
        Some(order)
    }

    /// Get an order by ID
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        let (side, price) = self.order_index.get(&order_id)?;
        self.side(*side)
            .get(&PriceKey::new(*side, *price))?
            .iter()
            .find(|o| o.id == order_id)
    }

    /// Next execution for an incoming order, without touching the book.
    ///
    /// `side` is the incoming order's side; it trades against the best
    /// order on the opposite side if that order's price crosses `limit`.
    pub fn next_fill(&self, side: Side, limit: Price, quantity: Quantity) -> Option<Fill> {
        if quantity == 0 {
            return None;
        }
        let resting = match side {
            Side::Bid => self.best_ask()?,
            Side::Ask => self.best_bid()?,
        };
        if !crosses(side, limit, resting.price) {
            return None;
        }
        Some(Fill {
            order_id: resting.id,
            price: execution_price(resting),
            quantity: fill_quantity(quantity, resting),
        })
    }

    /// Execute `quantity` against a resting order.
    ///
    /// Returns the order as it stands after the fill; a fully filled order
    /// is removed from the book and comes back with status `Filled`.
    pub fn apply_fill(&mut self, order_id: OrderId, quantity: Quantity) -> Option<Order> {
        let (side, price) = *self.order_index.get(&order_id)?;
        let key = PriceKey::new(side, price);
        let queue = self.side_mut(side).get_mut(&key)?;
        let order = queue.iter_mut().find(|o| o.id == order_id)?;
        order.fill(quantity);
        let updated = order.clone();

        if updated.is_filled() {
            self.remove(order_id);
        } else {
            self.sequence += 1;
        }
        Some(updated)
    }

    /// Active orders of one participant, bids first then asks
    pub fn orders_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Order> + 'a {
        self.bids
            .values()
            .chain(self.asks.values())
            .flatten()
            .filter(move |o| o.owner == owner)
    }

    /// Full depth copy of the book in priority order
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            instrument_id: self.instrument_id.clone(),
            bids: self.bids.values().flatten().cloned().collect(),
            asks: self.asks.values().flatten().cloned().collect(),
            sequence: self.sequence,
        }
    }

    /// Number of orders in the book
    pub fn len(&self) -> usize {
        self.order_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order_index.is_empty()
    }
}

/// Immutable copy of a book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSnapshot {
    pub instrument_id: InstrumentId,
    /// Best bid first
    pub bids: Vec<Order>,
    /// Best ask first
    pub asks: Vec<Order>,
    pub sequence: u64,
}
