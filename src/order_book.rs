//! Per (market, outcome) order book: bids and asks, price-time priority.
//!
//! Each side is a `BTreeMap` of price levels; a level is itself ordered by
//! `(timestamp, sequence)`, so an order's priority is fixed at insertion and never
//! depends on its remaining quantity. Best bid is the highest price, best ask the lowest;
//! within a level the earliest arrival ranks first.

use crate::error::BookError;
use crate::types::{BookSide, MarketId, OrderId, OutcomeIndex, RestingOrder};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Priority within a price level. The sequence breaks equal timestamps in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct ArrivalKey {
    timestamp: u64,
    sequence: u64,
}

impl ArrivalKey {
    fn of(order: &RestingOrder) -> Self {
        Self {
            timestamp: order.timestamp,
            sequence: order.sequence,
        }
    }
}

/// Orders at one price, earliest first.
type PriceLevel = BTreeMap<ArrivalKey, OrderId>;

/// Aggregated resting quantity at one price.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DepthLevel {
    pub price: Decimal,
    /// Sum of remaining quantities; `u128` so a level of `u64` orders cannot overflow.
    pub quantity: u128,
    pub order_count: usize,
}

/// Visible book: bids price-descending, asks price-ascending.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BookDepth {
    pub market_id: MarketId,
    pub outcome: OutcomeIndex,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// Order book for one outcome of one market.
#[derive(Clone, Debug)]
pub struct OrderBook {
    market_id: MarketId,
    outcome: OutcomeIndex,
    bids: BTreeMap<Decimal, PriceLevel>,
    asks: BTreeMap<Decimal, PriceLevel>,
    orders: HashMap<OrderId, RestingOrder>,
    next_sequence: u64,
}

impl OrderBook {
    pub fn new(market_id: MarketId, outcome: OutcomeIndex) -> Self {
        Self {
            market_id,
            outcome,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
            next_sequence: 1,
        }
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn outcome(&self) -> OutcomeIndex {
        self.outcome
    }

    /// Rests an order. The book assigns its sequence number; price and quantity ranges
    /// are the caller's responsibility.
    pub fn add_order(&mut self, mut order: RestingOrder) -> Result<(), BookError> {
        self.check_insertable(&order)?;
        order.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.insert(order);
        Ok(())
    }

    /// Re-inserts an order with the sequence number it already carries, so it lands at
    /// exactly the priority it had before. Used by rollback and snapshot restore.
    pub fn restore_order(&mut self, order: RestingOrder) -> Result<(), BookError> {
        self.check_insertable(&order)?;
        self.next_sequence = self.next_sequence.max(order.sequence + 1);
        self.insert(order);
        Ok(())
    }

    fn check_insertable(&self, order: &RestingOrder) -> Result<(), BookError> {
        if order.market_id != self.market_id || order.outcome != self.outcome {
            return Err(BookError::WrongBook {
                market_id: order.market_id,
                outcome: order.outcome,
            });
        }
        if self.orders.contains_key(&order.order_id) {
            return Err(BookError::DuplicateOrder(order.order_id));
        }
        Ok(())
    }

    fn insert(&mut self, order: RestingOrder) {
        let levels = match order.side {
            BookSide::Bid => &mut self.bids,
            BookSide::Ask => &mut self.asks,
        };
        levels
            .entry(order.price)
            .or_default()
            .insert(ArrivalKey::of(&order), order.order_id);
        self.orders.insert(order.order_id, order);
    }

    /// Removes and returns the order, or `None` if no such order rests here.
    pub fn remove_order(&mut self, order_id: OrderId) -> Option<RestingOrder> {
        let order = self.orders.remove(&order_id)?;
        let levels = match order.side {
            BookSide::Bid => &mut self.bids,
            BookSide::Ask => &mut self.asks,
        };
        if let Some(level) = levels.get_mut(&order.price) {
            level.remove(&ArrivalKey::of(&order));
            if level.is_empty() {
                levels.remove(&order.price);
            }
        }
        Some(order)
    }

    /// Sets a resting order's remaining quantity in place and returns the previous value.
    /// Priority is unchanged.
    pub fn update_order_quantity(
        &mut self,
        order_id: OrderId,
        new_quantity: u64,
    ) -> Result<u64, BookError> {
        if new_quantity == 0 {
            return Err(BookError::ZeroQuantity(order_id));
        }
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(BookError::OrderNotFound(order_id))?;
        let previous = order.quantity;
        order.quantity = new_quantity;
        Ok(previous)
    }

    pub fn get_order(&self, order_id: OrderId) -> Option<&RestingOrder> {
        self.orders.get(&order_id)
    }

    /// Highest-priority bid.
    pub fn best_bid(&self) -> Option<&RestingOrder> {
        let (_, level) = self.bids.iter().next_back()?;
        self.front_of(level)
    }

    /// Highest-priority ask (the cheapest).
    pub fn best_ask(&self) -> Option<&RestingOrder> {
        let (_, level) = self.asks.iter().next()?;
        self.front_of(level)
    }

    pub fn best(&self, side: BookSide) -> Option<&RestingOrder> {
        match side {
            BookSide::Bid => self.best_bid(),
            BookSide::Ask => self.best_ask(),
        }
    }

    fn front_of(&self, level: &PriceLevel) -> Option<&RestingOrder> {
        level.values().next().and_then(|id| self.orders.get(id))
    }

    /// Best bid price (None if empty).
    pub fn best_bid_price(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Best ask price (None if empty).
    pub fn best_ask_price(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// Total resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Aggregates resting orders by price level.
    pub fn depth(&self) -> BookDepth {
        BookDepth {
            market_id: self.market_id,
            outcome: self.outcome,
            bids: self
                .bids
                .iter()
                .rev()
                .map(|(price, level)| self.aggregate(*price, level))
                .collect(),
            asks: self
                .asks
                .iter()
                .map(|(price, level)| self.aggregate(*price, level))
                .collect(),
        }
    }

    fn aggregate(&self, price: Decimal, level: &PriceLevel) -> DepthLevel {
        let quantity = level
            .values()
            .filter_map(|id| self.orders.get(id))
            .map(|o| u128::from(o.quantity))
            .sum();
        DepthLevel {
            price,
            quantity,
            order_count: level.len(),
        }
    }

    /// Resting orders in priority order: bids best-first, then asks best-first.
    pub fn resting_orders(&self) -> Vec<RestingOrder> {
        let bids = self.bids.values().rev().flat_map(|level| level.values());
        let asks = self.asks.values().flat_map(|level| level.values());
        bids.chain(asks)
            .filter_map(|id| self.orders.get(id))
            .cloned()
            .collect()
    }

    /// Replaces the book's contents with previously exported orders, keeping their
    /// sequence numbers. On error the book is left empty.
    pub fn load_resting_orders(&mut self, orders: &[RestingOrder]) -> Result<(), BookError> {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
        self.next_sequence = 1;
        for order in orders {
            if let Err(e) = self.restore_order(order.clone()) {
                self.bids.clear();
                self.asks.clear();
                self.orders.clear();
                return Err(e);
            }
        }
        Ok(())
    }
}
