//! Trades, position deltas and the match result.
//!
//! [`Trade`] is emitted once per fill. [`PositionDelta`] summarises what a set of trades
//! does to each participant's holdings so the caller can apply it to account state.

use crate::types::{Address, IncomingOrder, MarketId, OrderId, Outcome, Side, TradeId};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// One fill between a buy order and a sell order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub buyer: Address,
    pub seller: Address,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    /// Maker's (resting order's) price.
    pub price: Decimal,
    pub quantity: u64,
    pub timestamp: u64,
    /// Direction of the incoming (taker) order.
    pub taker_side: Side,
}

impl Trade {
    /// Collateral moved from buyer to seller.
    pub fn notional(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Deterministic trade id: hex SHA-256 over the buy id, sell id, quantity, timestamp and
/// the fill's position within its match call.
///
/// The fill sequence keeps ids unique when the same pair of orders fills the same quantity
/// twice in one millisecond; replaying identical inputs yields identical ids.
pub fn trade_id(
    buy_order_id: OrderId,
    sell_order_id: OrderId,
    quantity: u64,
    timestamp: u64,
    fill_sequence: u32,
) -> TradeId {
    let mut hasher = Sha256::new();
    hasher.update(buy_order_id.0.to_be_bytes());
    hasher.update(sell_order_id.0.to_be_bytes());
    hasher.update(quantity.to_be_bytes());
    hasher.update(timestamp.to_be_bytes());
    hasher.update(fill_sequence.to_be_bytes());
    TradeId(hex::encode(hasher.finalize()))
}

/// Net change in one participant's holdings caused by a set of trades.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PositionDelta {
    /// Change in first-outcome (YES) shares.
    pub first: i128,
    /// Change in second-outcome (NO) shares.
    pub second: i128,
    /// Change in collateral: negative for the buyer, positive for the seller.
    pub collateral: Decimal,
}

impl PositionDelta {
    pub fn shares(&self, outcome: Outcome) -> i128 {
        match outcome {
            Outcome::Yes => self.first,
            Outcome::No => self.second,
        }
    }

    fn shares_mut(&mut self, outcome: Outcome) -> &mut i128 {
        match outcome {
            Outcome::Yes => &mut self.first,
            Outcome::No => &mut self.second,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.first == 0 && self.second == 0 && self.collateral.is_zero()
    }
}

/// Aggregates per-participant deltas over `trades`. Only the traded outcome moves.
///
/// Share deltas are `i128` so any `u64` fill, summed over any realistic number of trades,
/// is exact.
pub fn position_deltas(trades: &[Trade]) -> BTreeMap<Address, PositionDelta> {
    let mut deltas: BTreeMap<Address, PositionDelta> = BTreeMap::new();
    for trade in trades {
        let shares = i128::from(trade.quantity);
        let notional = trade.notional();

        let buyer = deltas.entry(trade.buyer.clone()).or_default();
        *buyer.shares_mut(trade.outcome) += shares;
        buyer.collateral -= notional;

        let seller = deltas.entry(trade.seller.clone()).or_default();
        *seller.shares_mut(trade.outcome) -= shares;
        seller.collateral += notional;
    }
    deltas
}

/// Output of one [`crate::matching::match_order`] call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchResult {
    /// Fills in the order they happened.
    pub trades: Vec<Trade>,
    /// Unfilled part of the incoming order; `None` when fully filled.
    pub remainder: Option<IncomingOrder>,
    pub position_deltas: BTreeMap<Address, PositionDelta>,
}

impl MatchResult {
    pub fn filled_quantity(&self) -> u64 {
        self.trades.iter().map(|t| t.quantity).sum()
    }

    pub fn is_fully_filled(&self) -> bool {
        self.remainder.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(buyer: &str, seller: &str, outcome: Outcome, price: Decimal, qty: u64) -> Trade {
        Trade {
            trade_id: trade_id(OrderId(1), OrderId(2), qty, 10, 0),
            market_id: MarketId(1),
            outcome,
            buyer: Address::new(buyer),
            seller: Address::new(seller),
            buy_order_id: OrderId(1),
            sell_order_id: OrderId(2),
            price,
            quantity: qty,
            timestamp: 10,
            taker_side: Side::Buy,
        }
    }

    #[test]
    fn trade_id_is_deterministic_and_sequence_sensitive() {
        let a = trade_id(OrderId(1), OrderId(2), 50, 1_000, 0);
        let b = trade_id(OrderId(1), OrderId(2), 50, 1_000, 0);
        let c = trade_id(OrderId(1), OrderId(2), 50, 1_000, 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.0.len(), 64);
    }

    #[test]
    fn deltas_are_antisymmetric_on_traded_outcome() {
        let trades = vec![trade("0xb", "0xs", Outcome::No, dec!(0.25), 40)];
        let deltas = position_deltas(&trades);
        let buyer = &deltas[&Address::new("0xb")];
        let seller = &deltas[&Address::new("0xs")];
        assert_eq!(buyer.second, 40);
        assert_eq!(seller.second, -40);
        assert_eq!(buyer.first, 0);
        assert_eq!(seller.first, 0);
        assert_eq!(buyer.collateral, dec!(-10));
        assert_eq!(seller.collateral, dec!(10));
    }

    #[test]
    fn deltas_aggregate_across_trades() {
        let trades = vec![
            trade("0xb", "0xs1", Outcome::Yes, dec!(0.40), 10),
            trade("0xb", "0xs2", Outcome::Yes, dec!(0.50), 20),
        ];
        let deltas = position_deltas(&trades);
        assert_eq!(deltas[&Address::new("0xb")].first, 30);
        assert_eq!(deltas[&Address::new("0xb")].collateral, dec!(-14));
        assert_eq!(deltas[&Address::new("0xs1")].first, -10);
        assert_eq!(deltas[&Address::new("0xs2")].first, -20);
    }

    #[test]
    fn deltas_are_exact_at_full_u64_quantity() {
        let trades = vec![
            trade("0xb", "0xs", Outcome::Yes, dec!(0.5), u64::MAX),
            trade("0xb", "0xs", Outcome::Yes, dec!(0.5), u64::MAX),
        ];
        let deltas = position_deltas(&trades);
        let max = i128::from(u64::MAX);
        assert_eq!(deltas[&Address::new("0xb")].shares(Outcome::Yes), 2 * max);
        assert_eq!(deltas[&Address::new("0xs")].shares(Outcome::Yes), -2 * max);
        assert_eq!(deltas[&Address::new("0xb")].shares(Outcome::No), 0);
    }

    #[test]
    fn self_trade_nets_to_zero() {
        let trades = vec![trade("0xa", "0xa", Outcome::Yes, dec!(0.5), 10)];
        let deltas = position_deltas(&trades);
        assert!(deltas[&Address::new("0xa")].is_zero());
    }
}
