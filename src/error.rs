//! Error taxonomy.
//!
//! Not-found on read and remove paths is `None`, not an error. Everything here is
//! either a structural book fault, an upstream rejection, or a surfaced match fault.

use crate::types::{Address, MarketId, MarketStatus, OrderId, OutcomeIndex};
use rust_decimal::Decimal;
use thiserror::Error;

/// Book mutation faults.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("order {0:?} already rests in the book")]
    DuplicateOrder(OrderId),

    #[error("order for market {market_id:?} outcome {outcome:?} does not belong to this book")]
    WrongBook {
        market_id: MarketId,
        outcome: OutcomeIndex,
    },

    #[error("order {0:?} not found")]
    OrderNotFound(OrderId),

    #[error("quantity update to zero for order {0:?}; remove the order instead")]
    ZeroQuantity(OrderId),
}

/// Faults surfaced by [`crate::matching::match_order`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// A book mutation failed; the `applied` earlier mutations were undone.
    #[error("book mutation failed after {applied} applied step(s), rolled back: {source}")]
    MutationFailed {
        applied: usize,
        #[source]
        source: BookError,
    },

    /// Undoing an applied mutation failed too. `rollback` is the first failed undo step;
    /// later steps were still applied. The book state can no longer be trusted.
    #[error("rollback failed ({rollback}) while recovering from: {source}")]
    RollbackFailed {
        #[source]
        source: BookError,
        rollback: BookError,
    },
}

/// Input-shape faults, rejected before an order reaches the matching core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderRejection {
    #[error("malformed owner address: {0}")]
    InvalidAddress(Address),

    #[error("price {0} must be strictly between 0 and 1")]
    PriceOutOfRange(Decimal),

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("quantity {quantity} exceeds maximum {max}")]
    QuantityTooLarge { quantity: u64, max: u64 },

    #[error("unknown market {0:?}")]
    UnknownMarket(MarketId),

    #[error("market {market_id:?} is {status:?}, not open for trading")]
    MarketNotOpen {
        market_id: MarketId,
        status: MarketStatus,
    },
}

/// Errors from the [`crate::engine::Exchange`] facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("order rejected: {0}")]
    Rejected(#[from] OrderRejection),

    #[error("matching failed: {0}")]
    Match(#[from] MatchError),

    #[error("book error: {0}")]
    Book(#[from] BookError),

    #[error("order {order_id:?} is not owned by {owner}")]
    NotOwner { order_id: OrderId, owner: Address },

    #[error("market {0:?} already exists")]
    DuplicateMarket(MarketId),

    #[error("book lock poisoned for market {0:?}")]
    LockPoisoned(MarketId),

    #[error("market registry lock poisoned")]
    RegistryPoisoned,
}

/// Snapshot save/load failures.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("exchange state: {0}")]
    Exchange(#[from] ExchangeError),
}
