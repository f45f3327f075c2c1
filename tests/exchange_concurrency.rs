//! Concurrent submissions through the shared `Exchange`.
//!
//! Same book: calls serialize, so quantity is conserved and the book never ends crossed.
//! Different books: each book's outcome matches a sequential replay of its own stream.

use outcome_matching_engine::market_data_gen::{Generator, GeneratorConfig};
use outcome_matching_engine::{Exchange, GeneratedOrder, MarketId, Outcome, RemainderPolicy, Trade};
use std::sync::Arc;
use std::thread;

fn init_log() {
    let _ = env_logger::try_init();
}

fn stream(seed: u64, market: u64, first_order_id: u64, n: usize) -> Vec<GeneratedOrder> {
    Generator::new(GeneratorConfig {
        seed,
        num_orders: n,
        first_order_id,
        rest_ratio: 1.0,
        ..Default::default()
    })
    .all_orders()
    .into_iter()
    .map(|mut g| {
        g.order.market_id = MarketId(market);
        g
    })
    .collect()
}

fn resting_quantity(exchange: &Exchange, market: MarketId) -> u128 {
    Outcome::ALL
        .iter()
        .map(|o| {
            let depth = exchange.depth(market, *o).unwrap();
            depth
                .bids
                .iter()
                .chain(depth.asks.iter())
                .map(|l| l.quantity)
                .sum::<u128>()
        })
        .sum()
}

#[test]
fn contended_book_conserves_quantity() {
    init_log();
    let exchange = Arc::new(Exchange::new());
    exchange.open_market(MarketId(1)).unwrap();

    let mut submitted = 0u64;
    let mut handles = Vec::new();
    for t in 0..4u64 {
        let orders = stream(t, 1, 1 + t * 1_000, 250);
        submitted += orders.iter().map(|g| g.order.quantity).sum::<u64>();
        let exchange = Arc::clone(&exchange);
        handles.push(thread::spawn(move || {
            let mut traded = 0u64;
            for g in orders {
                let result = exchange.submit_order(g.order, g.policy).unwrap();
                traded += result.filled_quantity();
            }
            traded
        }));
    }
    let traded: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Each traded share consumed quantity from both a taker and a maker.
    assert_eq!(
        u128::from(submitted),
        2 * u128::from(traded) + resting_quantity(&exchange, MarketId(1))
    );
    for outcome in Outcome::ALL {
        let depth = exchange.depth(MarketId(1), outcome).unwrap();
        if let (Some(bid), Some(ask)) = (depth.bids.first(), depth.asks.first()) {
            assert!(bid.price < ask.price);
        }
    }
}

#[test]
fn independent_books_match_their_sequential_replay() {
    init_log();
    let markets = 4u64;
    let exchange = Arc::new(Exchange::new());
    for m in 1..=markets {
        exchange.open_market(MarketId(m)).unwrap();
    }

    let handles: Vec<_> = (1..=markets)
        .map(|m| {
            let exchange = Arc::clone(&exchange);
            let orders = stream(m, m, m * 10_000, 300);
            thread::spawn(move || {
                orders
                    .into_iter()
                    .flat_map(|g| exchange.submit_order(g.order, g.policy).unwrap().trades)
                    .collect::<Vec<Trade>>()
            })
        })
        .collect();
    let parallel: Vec<Vec<Trade>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for m in 1..=markets {
        let sequential = Exchange::new();
        sequential.open_market(MarketId(m)).unwrap();
        let trades: Vec<Trade> = stream(m, m, m * 10_000, 300)
            .into_iter()
            .flat_map(|g| sequential.submit_order(g.order, g.policy).unwrap().trades)
            .collect();
        assert_eq!(parallel[(m - 1) as usize], trades, "market {m}");
        for outcome in Outcome::ALL {
            assert_eq!(
                exchange.depth(MarketId(m), outcome).unwrap(),
                sequential.depth(MarketId(m), outcome).unwrap()
            );
        }
    }
}

#[test]
fn cancel_policy_never_rests() {
    init_log();
    let exchange = Exchange::new();
    exchange.open_market(MarketId(1)).unwrap();
    for g in stream(5, 1, 1, 200) {
        exchange.submit_order(g.order, RemainderPolicy::Cancel).unwrap();
    }
    assert_eq!(resting_quantity(&exchange, MarketId(1)), 0);
}
