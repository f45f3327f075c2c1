//! # Outcome Matching Engine
//!
//! Deterministic order book and matching core for binary-outcome prediction markets:
//! price-time priority, maker pricing, and all-or-nothing book mutation per match.
//!
//! ## Entry point
//!
//! Use [`Exchange`]: open a market with [`Exchange::open_market`], then
//! [`Exchange::submit_order`], [`Exchange::cancel_order`] and [`Exchange::depth`].
//!
//! ## Example
//!
//! ```rust
//! use outcome_matching_engine::{Address, Exchange, IncomingOrder, MarketId, OrderId, Outcome, RemainderPolicy, Side};
//! use rust_decimal::Decimal;
//!
//! let exchange = Exchange::new();
//! exchange.open_market(MarketId(1)).unwrap();
//! let order = IncomingOrder {
//!     order_id: OrderId(1),
//!     owner: Address::new("0x00000000000000000000000000000000000000a1"),
//!     market_id: MarketId(1),
//!     side: Side::Buy,
//!     outcome: Outcome::Yes,
//!     price: Decimal::new(50, 2),
//!     quantity: 100,
//!     timestamp: 1,
//! };
//! let result = exchange.submit_order(order, RemainderPolicy::Rest).unwrap();
//! assert!(result.trades.is_empty());
//! assert_eq!(result.remainder.unwrap().quantity, 100);
//! ```
//!
//! ## Lower-level API
//!
//! [`OrderBook`] and [`match_order`] can be used directly; `match_order` never rests the
//! remainder, leaving that decision to the caller.

pub mod engine;
pub mod error;
pub mod execution;
pub mod market_data_gen;
pub mod matching;
pub mod order_book;
pub mod persistence;
pub mod types;
pub mod validation;

pub use engine::{BookEngine, Exchange, ExchangeSnapshot, MarketSnapshot, RemainderPolicy};
pub use error::{BookError, ExchangeError, MatchError, OrderRejection, PersistenceError};
pub use execution::{position_deltas, trade_id, MatchResult, PositionDelta, Trade};
pub use market_data_gen::{replay_into_exchange, GeneratedOrder, Generator, GeneratorConfig};
pub use matching::{match_order, MatchableBook};
pub use order_book::{BookDepth, DepthLevel, OrderBook};
pub use persistence::FilePersistence;
pub use types::{
    Address, BookSide, IncomingOrder, MarketId, MarketStatus, OrderId, Outcome, OutcomeIndex,
    RestingOrder, Side, TradeId,
};
