//! Core types and IDs for the matching core.
//!
//! Identifiers are newtype wrappers. Two vocabularies coexist: the public one used by
//! incoming orders ([`Side`], [`Outcome`]) and the book's internal one ([`BookSide`],
//! [`OutcomeIndex`]). The conversions between them are exact and invertible.

use rust_decimal::Decimal;
use std::fmt;

/// Unique order identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct OrderId(pub u64);

/// Trade identifier: hex-encoded SHA-256 of the fill inputs (see [`crate::execution::trade_id`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TradeId(pub String);

/// Market identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct MarketId(pub u64);

/// Participant address (`0x` followed by 40 hex digits once validated).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public order direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side of the book an order with this direction rests on.
    pub fn book_side(self) -> BookSide {
        match self {
            Side::Buy => BookSide::Bid,
            Side::Sell => BookSide::Ask,
        }
    }

    /// Side of the book this direction matches against (BUY takes asks, SELL takes bids).
    pub fn opposing_book_side(self) -> BookSide {
        self.book_side().opposite()
    }
}

/// Internal book side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    pub fn opposite(self) -> BookSide {
        match self {
            BookSide::Bid => BookSide::Ask,
            BookSide::Ask => BookSide::Bid,
        }
    }

    /// Public direction of an order resting on this side.
    pub fn to_side(self) -> Side {
        match self {
            BookSide::Bid => Side::Buy,
            BookSide::Ask => Side::Sell,
        }
    }
}

/// Public outcome label of a binary market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::Yes, Outcome::No];

    /// Numeric encoding used by the book: `Yes` is 0, `No` is 1.
    pub fn index(self) -> OutcomeIndex {
        match self {
            Outcome::Yes => OutcomeIndex::FIRST,
            Outcome::No => OutcomeIndex::SECOND,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Yes => f.write_str("YES"),
            Outcome::No => f.write_str("NO"),
        }
    }
}

/// Book-internal outcome encoding. Only 0 and 1 are meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct OutcomeIndex(pub u8);

impl OutcomeIndex {
    pub const FIRST: OutcomeIndex = OutcomeIndex(0);
    pub const SECOND: OutcomeIndex = OutcomeIndex(1);

    /// Inverse of [`Outcome::index`]. `None` for anything other than 0 or 1.
    pub fn outcome(self) -> Option<Outcome> {
        match self.0 {
            0 => Some(Outcome::Yes),
            1 => Some(Outcome::No),
            _ => None,
        }
    }
}

/// Order as submitted by a participant, before it is matched or rests.
///
/// The matching core assumes the fields were validated upstream (see [`crate::validation`]).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IncomingOrder {
    pub order_id: OrderId,
    pub owner: Address,
    pub market_id: MarketId,
    pub side: Side,
    pub outcome: Outcome,
    pub price: Decimal,
    pub quantity: u64,
    /// Milliseconds since epoch.
    pub timestamp: u64,
}

impl IncomingOrder {
    /// Translates into the book's vocabulary. The sequence number is assigned by the book
    /// on insertion.
    pub fn to_resting(&self) -> RestingOrder {
        RestingOrder {
            order_id: self.order_id,
            owner: self.owner.clone(),
            market_id: self.market_id,
            outcome: self.outcome.index(),
            side: self.side.book_side(),
            price: self.price,
            quantity: self.quantity,
            timestamp: self.timestamp,
            sequence: 0,
        }
    }

    /// Same order with a different remaining quantity.
    pub fn with_quantity(&self, quantity: u64) -> IncomingOrder {
        IncomingOrder {
            quantity,
            ..self.clone()
        }
    }
}

/// Order held in a book, in the book's vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub owner: Address,
    pub market_id: MarketId,
    pub outcome: OutcomeIndex,
    pub side: BookSide,
    pub price: Decimal,
    /// Remaining quantity.
    pub quantity: u64,
    pub timestamp: u64,
    /// Insertion sequence within the book; breaks timestamp ties.
    pub sequence: u64,
}

impl RestingOrder {
    /// Inverse of [`IncomingOrder::to_resting`]. `None` if the outcome encoding is invalid.
    pub fn to_incoming(&self) -> Option<IncomingOrder> {
        Some(IncomingOrder {
            order_id: self.order_id,
            owner: self.owner.clone(),
            market_id: self.market_id,
            side: self.side.to_side(),
            outcome: self.outcome.outcome()?,
            price: self.price,
            quantity: self.quantity,
            timestamp: self.timestamp,
        })
    }
}

/// Lifecycle state of a market. Only `Open` markets accept orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MarketStatus {
    Open,
    Closed,
    Resolved,
}
