//! Synthetic order flow generator.
//!
//! Deterministic, configurable stream of incoming orders for replay tests, benches and
//! the demo binary. Same seed ⇒ same sequence of orders.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::engine::{Exchange, RemainderPolicy};
use crate::error::ExchangeError;
use crate::types::{Address, IncomingOrder, MarketId, OrderId, Outcome, Side};

/// Configuration for the synthetic order generator.
/// All ranges are inclusive. Same config + seed produces the same stream.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// RNG seed. Same seed ⇒ same order stream.
    pub seed: u64,
    /// Orders are spread over markets `1..=num_markets`.
    pub num_markets: u64,
    /// Number of orders produced by [`Generator::all_orders`].
    pub num_orders: usize,
    /// Probability of BUY (0.0..=1.0). SELL otherwise.
    pub buy_ratio: f64,
    /// Probability of the YES outcome (0.0..=1.0). NO otherwise.
    pub yes_ratio: f64,
    /// Limit price range in cents, within 1..=99.
    pub price_min_cents: i64,
    pub price_max_cents: i64,
    /// Quantity range (inclusive), whole shares.
    pub quantity_min: u64,
    pub quantity_max: u64,
    /// Probability that the remainder rests; cancelled otherwise.
    pub rest_ratio: f64,
    /// Number of distinct owner addresses.
    pub num_traders: u64,
    /// First order id; timestamps start at the same value.
    pub first_order_id: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_markets: 1,
            num_orders: 1000,
            buy_ratio: 0.5,
            yes_ratio: 0.5,
            price_min_cents: 40,
            price_max_cents: 60,
            quantity_min: 1,
            quantity_max: 100,
            rest_ratio: 0.9,
            num_traders: 5,
            first_order_id: 1,
        }
    }
}

/// One generated submission.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedOrder {
    pub order: IncomingOrder,
    pub policy: RemainderPolicy,
}

/// Deterministic order stream. Create with [`Generator::new`].
pub struct Generator {
    rng: StdRng,
    config: GeneratorConfig,
    next_order_id: u64,
    next_timestamp: u64,
}

/// Address of synthetic trader `n`.
pub fn trader_address(n: u64) -> Address {
    Address::new(format!("0x{:040x}", n))
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let first = config.first_order_id.max(1);
        Self {
            rng,
            config,
            next_order_id: first,
            next_timestamp: first,
        }
    }

    /// Generates the next order. Advances order id, timestamp and RNG.
    pub fn next_order(&mut self) -> GeneratedOrder {
        let order_id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        let market_id = MarketId(self.rng.gen_range(1..=self.config.num_markets.max(1)));
        let side = if self.rng.gen::<f64>() < self.config.buy_ratio {
            Side::Buy
        } else {
            Side::Sell
        };
        let outcome = if self.rng.gen::<f64>() < self.config.yes_ratio {
            Outcome::Yes
        } else {
            Outcome::No
        };
        let min = self.config.price_min_cents.clamp(1, 99);
        let max = self.config.price_max_cents.clamp(min, 99);
        let price = Decimal::new(self.rng.gen_range(min..=max), 2);
        let quantity = self
            .rng
            .gen_range(self.config.quantity_min.max(1)..=self.config.quantity_max.max(1));
        let policy = if self.rng.gen::<f64>() < self.config.rest_ratio {
            RemainderPolicy::Rest
        } else {
            RemainderPolicy::Cancel
        };
        let owner = trader_address(self.rng.gen_range(1..=self.config.num_traders.max(1)));
        let timestamp = self.next_timestamp;
        self.next_timestamp += 1;
        GeneratedOrder {
            order: IncomingOrder {
                order_id,
                owner,
                market_id,
                side,
                outcome,
                price,
                quantity,
                timestamp,
            },
            policy,
        }
    }

    pub fn take_orders(&mut self, n: usize) -> Vec<GeneratedOrder> {
        (0..n).map(|_| self.next_order()).collect()
    }

    /// Returns the full stream of orders as defined by `config.num_orders`.
    pub fn all_orders(&mut self) -> Vec<GeneratedOrder> {
        self.take_orders(self.config.num_orders)
    }
}

/// Replays orders into the exchange. Returns (total trades, total filled quantity), or the
/// first error.
pub fn replay_into_exchange(
    exchange: &Exchange,
    orders: impl IntoIterator<Item = GeneratedOrder>,
) -> Result<(usize, u64), ExchangeError> {
    let mut total_trades = 0usize;
    let mut total_filled = 0u64;
    for generated in orders {
        let result = exchange.submit_order(generated.order, generated.policy)?;
        total_trades += result.trades.len();
        total_filled += result.filled_quantity();
    }
    Ok((total_trades, total_filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_order;

    #[test]
    fn same_seed_same_stream() {
        let c = GeneratorConfig {
            seed: 42,
            num_orders: 10,
            ..Default::default()
        };
        let orders1 = Generator::new(c.clone()).all_orders();
        let orders2 = Generator::new(c).all_orders();
        assert_eq!(orders1.len(), 10);
        assert_eq!(orders1, orders2);
    }

    #[test]
    fn different_seed_different_stream() {
        let o1 = Generator::new(GeneratorConfig {
            seed: 1,
            num_orders: 5,
            ..Default::default()
        })
        .all_orders();
        let o2 = Generator::new(GeneratorConfig {
            seed: 2,
            num_orders: 5,
            ..Default::default()
        })
        .all_orders();
        assert_ne!(o1, o2, "different seeds should produce different order content");
    }

    #[test]
    fn generated_orders_pass_validation() {
        let orders = Generator::new(GeneratorConfig {
            seed: 7,
            num_orders: 200,
            num_markets: 3,
            price_min_cents: 0,
            price_max_cents: 150,
            ..Default::default()
        })
        .all_orders();
        for g in &orders {
            assert_eq!(validate_order(&g.order), Ok(()));
            assert!((1..=3).contains(&g.order.market_id.0));
        }
    }

    #[test]
    fn replay_into_exchange_succeeds() {
        let exchange = Exchange::new();
        exchange.open_market(MarketId(1)).unwrap();
        let orders = Generator::new(GeneratorConfig {
            seed: 123,
            num_orders: 50,
            ..Default::default()
        })
        .all_orders();
        let submitted: u64 = orders.iter().map(|g| g.order.quantity).sum();
        let (_, filled) = replay_into_exchange(&exchange, orders).unwrap();
        assert!(filled <= submitted);
    }
}
