//! Common utilities for Maat integration tests.

use std::sync::Arc;

use maat::{IsolationLevel, Maat, Row};

/// Helper to create an engine with the given default isolation level.
pub fn setup_engine(isolation: IsolationLevel) -> Arc<Maat> {
    Arc::new(Maat::new(isolation))
}

/// Commits a single row outside of any racing choreography.
pub fn commit_row(engine: &Maat, key: &str, row: Row) {
    let mut txn = engine.begin();
    txn.write(key.to_string(), row).unwrap();
    txn.commit().unwrap();
}
