//! Matching facades.
//!
//! [`BookEngine`] owns one (market, outcome) book and runs matching against it.
//! [`Exchange`] holds every market's two books, each behind its own lock: submissions
//! to the same book serialize, submissions to different books run in parallel.

use crate::error::{BookError, ExchangeError, OrderRejection};
use crate::execution::MatchResult;
use crate::matching::match_order;
use crate::order_book::{BookDepth, OrderBook};
use crate::types::{
    Address, IncomingOrder, MarketId, MarketStatus, OrderId, Outcome, RestingOrder,
};
use crate::validation::validate_order;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// What to do with the unfilled part of an incoming order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RemainderPolicy {
    /// Rest the remainder in the book at its limit price.
    Rest,
    /// Drop the remainder (immediate-or-cancel).
    Cancel,
}

/// Matching engine for one outcome of one market.
#[derive(Debug)]
pub struct BookEngine {
    book: OrderBook,
}

impl BookEngine {
    pub fn new(market_id: MarketId, outcome: Outcome) -> Self {
        Self {
            book: OrderBook::new(market_id, outcome.index()),
        }
    }

    /// Matches the order and, under [`RemainderPolicy::Rest`], rests what is left.
    ///
    /// The order must belong to this book. Either the whole call takes effect or the book
    /// is unchanged.
    pub fn submit(
        &mut self,
        order: IncomingOrder,
        policy: RemainderPolicy,
    ) -> Result<MatchResult, ExchangeError> {
        info!(
            "order submitted order_id={} market={} outcome={} side={:?} quantity={} price={}",
            order.order_id.0,
            order.market_id.0,
            order.outcome,
            order.side,
            order.quantity,
            order.price
        );
        let resting = order.to_resting();
        if resting.market_id != self.book.market_id() || resting.outcome != self.book.outcome() {
            return Err(BookError::WrongBook {
                market_id: resting.market_id,
                outcome: resting.outcome,
            }
            .into());
        }
        if self.book.get_order(order.order_id).is_some() {
            return Err(BookError::DuplicateOrder(order.order_id).into());
        }

        let result = match_order(&order, &mut self.book)?;
        for trade in &result.trades {
            info!(
                "trade trade_id={} buy_order={} sell_order={} price={} quantity={}",
                trade.trade_id.0,
                trade.buy_order_id.0,
                trade.sell_order_id.0,
                trade.price,
                trade.quantity
            );
        }
        if let (Some(remainder), RemainderPolicy::Rest) = (&result.remainder, policy) {
            self.book.add_order(remainder.to_resting())?;
            info!(
                "order rested order_id={} quantity={} price={}",
                remainder.order_id.0, remainder.quantity, remainder.price
            );
        }
        Ok(result)
    }

    /// Cancels a resting order owned by `owner`. `Ok(None)` if it is not in the book.
    pub fn cancel(
        &mut self,
        order_id: OrderId,
        owner: &Address,
    ) -> Result<Option<RestingOrder>, ExchangeError> {
        match self.book.get_order(order_id) {
            None => return Ok(None),
            Some(o) if &o.owner != owner => {
                return Err(ExchangeError::NotOwner {
                    order_id,
                    owner: owner.clone(),
                })
            }
            Some(_) => {}
        }
        let removed = self.book.remove_order(order_id);
        if removed.is_some() {
            info!("order canceled order_id={}", order_id.0);
        }
        Ok(removed)
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn depth(&self) -> BookDepth {
        self.book.depth()
    }
}

/// A market's two books, YES first.
#[derive(Debug)]
struct MarketEntry {
    status: MarketStatus,
    books: [Arc<Mutex<BookEngine>>; 2],
}

impl MarketEntry {
    fn new(market_id: MarketId, status: MarketStatus) -> Self {
        Self {
            status,
            books: Outcome::ALL.map(|o| Arc::new(Mutex::new(BookEngine::new(market_id, o)))),
        }
    }

    fn book(&self, outcome: Outcome) -> &Arc<Mutex<BookEngine>> {
        &self.books[outcome.index().0 as usize]
    }
}

/// Resting state of one market, for persistence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarketSnapshot {
    pub market_id: MarketId,
    pub status: MarketStatus,
    /// Both outcomes' resting orders, each in priority order.
    pub resting_orders: Vec<RestingOrder>,
}

/// Every market's resting state, ordered by market id.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExchangeSnapshot {
    pub markets: Vec<MarketSnapshot>,
}

/// All markets and their books.
#[derive(Debug, Default)]
pub struct Exchange {
    markets: RwLock<HashMap<MarketId, MarketEntry>>,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a market open for trading.
    pub fn open_market(&self, market_id: MarketId) -> Result<(), ExchangeError> {
        let mut markets = self.write()?;
        if markets.contains_key(&market_id) {
            return Err(ExchangeError::DuplicateMarket(market_id));
        }
        markets.insert(market_id, MarketEntry::new(market_id, MarketStatus::Open));
        info!("market opened market={}", market_id.0);
        Ok(())
    }

    pub fn set_market_status(
        &self,
        market_id: MarketId,
        status: MarketStatus,
    ) -> Result<(), ExchangeError> {
        let mut markets = self.write()?;
        let entry = markets
            .get_mut(&market_id)
            .ok_or(OrderRejection::UnknownMarket(market_id))?;
        info!(
            "market status market={} from={:?} to={:?}",
            market_id.0, entry.status, status
        );
        entry.status = status;
        Ok(())
    }

    pub fn market_status(&self, market_id: MarketId) -> Result<Option<MarketStatus>, ExchangeError> {
        Ok(self.read()?.get(&market_id).map(|m| m.status))
    }

    /// Validates the order, then matches it against its (market, outcome) book.
    pub fn submit_order(
        &self,
        order: IncomingOrder,
        policy: RemainderPolicy,
    ) -> Result<MatchResult, ExchangeError> {
        if let Err(rejection) = validate_order(&order) {
            warn!("order rejected order_id={} reason={}", order.order_id.0, rejection);
            return Err(rejection.into());
        }
        let market_id = order.market_id;
        // The registry read guard is held across the match so a concurrent status change
        // cannot slip between the open check and the fills.
        let markets = self.read()?;
        let entry = markets
            .get(&market_id)
            .ok_or(OrderRejection::UnknownMarket(market_id))?;
        if entry.status != MarketStatus::Open {
            return Err(OrderRejection::MarketNotOpen {
                market_id,
                status: entry.status,
            }
            .into());
        }
        let mut engine = entry
            .book(order.outcome)
            .lock()
            .map_err(|_| ExchangeError::LockPoisoned(market_id))?;
        engine.submit(order, policy)
    }

    /// Cancels a resting order. `Ok(None)` if no such order rests in that book.
    pub fn cancel_order(
        &self,
        market_id: MarketId,
        outcome: Outcome,
        order_id: OrderId,
        owner: &Address,
    ) -> Result<Option<RestingOrder>, ExchangeError> {
        let markets = self.read()?;
        let entry = markets
            .get(&market_id)
            .ok_or(OrderRejection::UnknownMarket(market_id))?;
        let mut engine = entry
            .book(outcome)
            .lock()
            .map_err(|_| ExchangeError::LockPoisoned(market_id))?;
        engine.cancel(order_id, owner)
    }

    pub fn depth(&self, market_id: MarketId, outcome: Outcome) -> Result<BookDepth, ExchangeError> {
        let markets = self.read()?;
        let entry = markets
            .get(&market_id)
            .ok_or(OrderRejection::UnknownMarket(market_id))?;
        let engine = entry
            .book(outcome)
            .lock()
            .map_err(|_| ExchangeError::LockPoisoned(market_id))?;
        Ok(engine.depth())
    }

    pub fn market_ids(&self) -> Result<Vec<MarketId>, ExchangeError> {
        let mut ids: Vec<MarketId> = self.read()?.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    /// Exports every market's status and resting orders.
    pub fn snapshot(&self) -> Result<ExchangeSnapshot, ExchangeError> {
        let markets = self.read()?;
        let mut out = Vec::with_capacity(markets.len());
        for (market_id, entry) in markets.iter() {
            let mut resting_orders = Vec::new();
            for book in &entry.books {
                let engine = book
                    .lock()
                    .map_err(|_| ExchangeError::LockPoisoned(*market_id))?;
                resting_orders.extend(engine.book().resting_orders());
            }
            out.push(MarketSnapshot {
                market_id: *market_id,
                status: entry.status,
                resting_orders,
            });
        }
        out.sort_by_key(|m| m.market_id);
        Ok(ExchangeSnapshot { markets: out })
    }

    /// Rebuilds an exchange from a snapshot. Resting orders keep their priority.
    pub fn from_snapshot(snapshot: &ExchangeSnapshot) -> Result<Self, ExchangeError> {
        let mut markets = HashMap::with_capacity(snapshot.markets.len());
        for market in &snapshot.markets {
            if markets.contains_key(&market.market_id) {
                return Err(ExchangeError::DuplicateMarket(market.market_id));
            }
            let entry = MarketEntry::new(market.market_id, market.status);
            for outcome in Outcome::ALL {
                let orders: Vec<RestingOrder> = market
                    .resting_orders
                    .iter()
                    .filter(|o| o.outcome == outcome.index())
                    .cloned()
                    .collect();
                let mut engine = entry
                    .book(outcome)
                    .lock()
                    .map_err(|_| ExchangeError::LockPoisoned(market.market_id))?;
                engine.book.load_resting_orders(&orders)?;
            }
            if let Some(stray) = market
                .resting_orders
                .iter()
                .find(|o| o.outcome.outcome().is_none() || o.market_id != market.market_id)
            {
                return Err(BookError::WrongBook {
                    market_id: stray.market_id,
                    outcome: stray.outcome,
                }
                .into());
            }
            markets.insert(market.market_id, entry);
        }
        info!("exchange restored markets={}", markets.len());
        Ok(Self {
            markets: RwLock::new(markets),
        })
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<MarketId, MarketEntry>>, ExchangeError> {
        self.markets
            .read()
            .map_err(|_| ExchangeError::RegistryPoisoned)
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<MarketId, MarketEntry>>, ExchangeError> {
        self.markets
            .write()
            .map_err(|_| ExchangeError::RegistryPoisoned)
    }
}
