//! Replay driver: feeds a seeded synthetic order stream through an exchange and prints
//! the resulting book depth as JSON.
//!
//! Configuration via environment: `SEED`, `NUM_ORDERS`, `NUM_MARKETS`, `SNAPSHOT_PATH`.
//! With `SNAPSHOT_PATH` set, saved state is loaded on start and written back on exit.

use log::{error, info};
use outcome_matching_engine::{
    replay_into_exchange, Exchange, FilePersistence, Generator, GeneratorConfig, MarketId,
    Outcome,
};
use std::process::ExitCode;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let seed: u64 = env_or("SEED", 42);
    let num_orders: usize = env_or("NUM_ORDERS", 10_000);
    let num_markets: u64 = env_or("NUM_MARKETS", 2);
    let store = std::env::var("SNAPSHOT_PATH").ok().map(FilePersistence::new);

    let exchange = match store.as_ref().map(|s| s.load_exchange()).transpose()?.flatten() {
        Some(restored) => restored,
        None => Exchange::new(),
    };
    let known = exchange.market_ids()?;
    for id in 1..=num_markets {
        if !known.contains(&MarketId(id)) {
            exchange.open_market(MarketId(id))?;
        }
    }

    // Continue numbering after any restored resting order.
    let first_order_id = exchange
        .snapshot()?
        .markets
        .iter()
        .flat_map(|m| m.resting_orders.iter())
        .map(|o| o.order_id.0.max(o.timestamp) + 1)
        .max()
        .unwrap_or(1);
    let orders = Generator::new(GeneratorConfig {
        seed,
        num_orders,
        num_markets,
        first_order_id,
        ..Default::default()
    })
    .all_orders();
    let (trades, filled) = replay_into_exchange(&exchange, orders)?;
    info!(
        "replay done seed={} orders={} trades={} filled={}",
        seed, num_orders, trades, filled
    );

    let mut depths = Vec::new();
    for market_id in exchange.market_ids()? {
        for outcome in Outcome::ALL {
            depths.push(exchange.depth(market_id, outcome)?);
        }
    }
    println!("{}", serde_json::to_string_pretty(&depths)?);

    if let Some(store) = &store {
        store.save_exchange(&exchange)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let _ = env_logger::try_init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("replay failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
