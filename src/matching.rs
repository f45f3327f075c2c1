//! Price-time priority matching with all-or-nothing book mutation.
//!
//! [`match_order`] crosses one incoming order against the opposing side of one book.
//! Every book mutation is recorded in an undo log before it is applied; if a mutation
//! fails, the log is replayed in reverse so the book ends exactly as it started.
//! The engine never rests the remainder itself; that is the caller's decision.

use crate::error::{BookError, MatchError};
use crate::execution::{position_deltas, trade_id, MatchResult, Trade};
use crate::order_book::OrderBook;
use crate::types::{BookSide, IncomingOrder, OrderId, RestingOrder, Side};
use log::{debug, warn};

/// Book operations the matching loop needs.
pub trait MatchableBook {
    /// Highest-priority resting order on `side`.
    fn best(&self, side: BookSide) -> Option<&RestingOrder>;

    /// Removes a resting order; `None` if it is not in the book.
    fn remove_order(&mut self, order_id: OrderId) -> Option<RestingOrder>;

    /// Sets remaining quantity in place, returning the previous quantity.
    fn update_order_quantity(&mut self, order_id: OrderId, new_quantity: u64)
        -> Result<u64, BookError>;

    /// Re-inserts a previously removed order at its original priority.
    fn restore_order(&mut self, order: RestingOrder) -> Result<(), BookError>;
}

impl MatchableBook for OrderBook {
    fn best(&self, side: BookSide) -> Option<&RestingOrder> {
        OrderBook::best(self, side)
    }

    fn remove_order(&mut self, order_id: OrderId) -> Option<RestingOrder> {
        OrderBook::remove_order(self, order_id)
    }

    fn update_order_quantity(
        &mut self,
        order_id: OrderId,
        new_quantity: u64,
    ) -> Result<u64, BookError> {
        OrderBook::update_order_quantity(self, order_id, new_quantity)
    }

    fn restore_order(&mut self, order: RestingOrder) -> Result<(), BookError> {
        OrderBook::restore_order(self, order)
    }
}

/// One applied book mutation, with what is needed to undo it.
#[derive(Clone, Debug, PartialEq)]
enum AppliedMutation {
    Removed(RestingOrder),
    QuantityChanged { order_id: OrderId, previous: u64 },
}

/// Mutations applied during one match call, undone newest-first on failure.
#[derive(Debug, Default)]
struct UndoLog {
    applied: Vec<AppliedMutation>,
}

impl UndoLog {
    fn remove<B: MatchableBook>(&mut self, book: &mut B, order_id: OrderId) -> Result<(), BookError> {
        let removed = book
            .remove_order(order_id)
            .ok_or(BookError::OrderNotFound(order_id))?;
        self.applied.push(AppliedMutation::Removed(removed));
        Ok(())
    }

    fn reduce<B: MatchableBook>(
        &mut self,
        book: &mut B,
        order_id: OrderId,
        new_quantity: u64,
    ) -> Result<(), BookError> {
        let previous = book.update_order_quantity(order_id, new_quantity)?;
        self.applied
            .push(AppliedMutation::QuantityChanged { order_id, previous });
        Ok(())
    }

    fn len(&self) -> usize {
        self.applied.len()
    }

    /// Undoes every step, newest first. A failing step does not stop the rest; the first
    /// failure is returned.
    fn rollback<B: MatchableBook>(self, book: &mut B) -> Result<(), BookError> {
        let mut first_error = None;
        for mutation in self.applied.into_iter().rev() {
            let undone = match mutation {
                AppliedMutation::Removed(order) => book.restore_order(order),
                AppliedMutation::QuantityChanged { order_id, previous } => {
                    book.update_order_quantity(order_id, previous).map(|_| ())
                }
            };
            if let Err(e) = undone {
                warn!("rollback step failed error={}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn crosses(taker_side: Side, limit: rust_decimal::Decimal, maker: &RestingOrder) -> bool {
    match taker_side {
        Side::Buy => maker.price <= limit,
        Side::Sell => maker.price >= limit,
    }
}

/// Crosses `incoming` against `book`.
///
/// Fills run against the best opposing order at the resting order's price until the
/// incoming quantity is exhausted, the opposing side is empty, or prices stop crossing.
/// Returns trades in fill order, the unfilled remainder (`None` when fully filled) and
/// per-participant position deltas. On a mutation fault the book is restored and
/// [`MatchError::MutationFailed`] is returned with no trades.
pub fn match_order<B: MatchableBook>(
    incoming: &IncomingOrder,
    book: &mut B,
) -> Result<MatchResult, MatchError> {
    let opposing = incoming.side.opposing_book_side();
    let mut remaining = incoming.quantity;
    let mut trades: Vec<Trade> = Vec::new();
    let mut undo = UndoLog::default();

    while remaining > 0 {
        let Some(maker) = book.best(opposing) else {
            break;
        };
        if !crosses(incoming.side, incoming.price, maker) {
            break;
        }
        let maker_id = maker.order_id;
        let maker_owner = maker.owner.clone();
        let maker_price = maker.price;
        let maker_quantity = maker.quantity;

        let fill = remaining.min(maker_quantity);
        let (buy_order_id, sell_order_id, buyer, seller) = match incoming.side {
            Side::Buy => (incoming.order_id, maker_id, incoming.owner.clone(), maker_owner),
            Side::Sell => (maker_id, incoming.order_id, maker_owner, incoming.owner.clone()),
        };
        trades.push(Trade {
            trade_id: trade_id(
                buy_order_id,
                sell_order_id,
                fill,
                incoming.timestamp,
                trades.len() as u32,
            ),
            market_id: incoming.market_id,
            outcome: incoming.outcome,
            buyer,
            seller,
            buy_order_id,
            sell_order_id,
            price: maker_price,
            quantity: fill,
            timestamp: incoming.timestamp,
            taker_side: incoming.side,
        });

        let step = if fill == maker_quantity {
            undo.remove(book, maker_id)
        } else {
            undo.reduce(book, maker_id, maker_quantity - fill)
        };
        if let Err(source) = step {
            let applied = undo.len();
            warn!(
                "mutation failed order_id={} maker_id={} applied={} error={}; rolling back",
                incoming.order_id.0, maker_id.0, applied, source
            );
            return match undo.rollback(book) {
                Ok(()) => Err(MatchError::MutationFailed { applied, source }),
                Err(rollback) => Err(MatchError::RollbackFailed { source, rollback }),
            };
        }
        debug!(
            "fill order_id={} maker_id={} price={} quantity={}",
            incoming.order_id.0, maker_id.0, maker_price, fill
        );
        remaining -= fill;
    }

    let remainder = (remaining > 0).then(|| incoming.with_quantity(remaining));
    let position_deltas = position_deltas(&trades);
    Ok(MatchResult {
        trades,
        remainder,
        position_deltas,
    })
}
