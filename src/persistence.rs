//! Persistence: save and load the exchange's resting state to a JSON file.
//! Enables recovery after restart: markets, their status, and resting orders with their
//! original priority are restored.

use crate::engine::{Exchange, ExchangeSnapshot};
use crate::error::PersistenceError;
use log::info;
use std::path::{Path, PathBuf};

/// File-based persistence: one JSON file. Save after state changes; load on startup.
#[derive(Clone, Debug)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save state to file. Overwrites existing file.
    pub fn save(&self, snapshot: &ExchangeSnapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)?;
        info!(
            "snapshot saved path={} markets={}",
            self.path.display(),
            snapshot.markets.len()
        );
        Ok(())
    }

    /// Load state from file. Returns `None` if the file does not exist.
    pub fn load(&self) -> Result<Option<ExchangeSnapshot>, PersistenceError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Snapshots the exchange and saves it.
    pub fn save_exchange(&self, exchange: &Exchange) -> Result<(), PersistenceError> {
        self.save(&exchange.snapshot()?)
    }

    /// Loads and rebuilds an exchange. `None` if there is no saved state.
    pub fn load_exchange(&self) -> Result<Option<Exchange>, PersistenceError> {
        match self.load()? {
            Some(snapshot) => Ok(Some(Exchange::from_snapshot(&snapshot)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RemainderPolicy;
    use crate::types::{Address, IncomingOrder, MarketId, OrderId, Outcome, Side};
    use rust_decimal_macros::dec;

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistence::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
        assert!(store.load_exchange().unwrap().is_none());
    }

    #[test]
    fn save_then_load_restores_books() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistence::new(dir.path().join("exchange.json"));
        let exchange = Exchange::new();
        exchange.open_market(MarketId(7)).unwrap();
        exchange
            .submit_order(
                IncomingOrder {
                    order_id: OrderId(1),
                    owner: Address::new(format!("0x{:040x}", 1)),
                    market_id: MarketId(7),
                    side: Side::Sell,
                    outcome: Outcome::Yes,
                    price: dec!(0.62),
                    quantity: 40,
                    timestamp: 5,
                },
                RemainderPolicy::Rest,
            )
            .unwrap();
        store.save_exchange(&exchange).unwrap();

        let restored = store.load_exchange().unwrap().unwrap();
        assert_eq!(
            restored.depth(MarketId(7), Outcome::Yes).unwrap(),
            exchange.depth(MarketId(7), Outcome::Yes).unwrap()
        );
    }

    #[test]
    fn corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = FilePersistence::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistenceError::Json(_)));
    }
}
