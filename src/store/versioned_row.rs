use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single row in the shared table.
///
/// The harness only ever asserts over `value`; `payload` is free-form
/// diagnostic text, typically naming the transaction that produced the row so
/// an anomaly report can say which writers collided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// The application value under test.
    pub value: i64,
    /// Optional free-form payload carried along for diagnostics.
    pub payload: Option<String>,
}

impl Row {
    /// Creates a row with no payload.
    pub fn new(value: i64) -> Self {
        Self {
            value,
            payload: None,
        }
    }

    /// Creates a row carrying a diagnostic payload.
    pub fn with_payload(value: i64, payload: impl Into<String>) -> Self {
        Self {
            value,
            payload: Some(payload.into()),
        }
    }
}

/// A row paired with the commit timestamp of the transaction that wrote it.
///
/// Rows in the shared table are wrapped in `VersionedRow` so that commit-time
/// validation can tell whether a row changed after a transaction read it.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRow {
    /// The row data.
    row: Arc<Row>,
    /// The commit timestamp of the transaction that last wrote this row.
    version: u64,
}

impl VersionedRow {
    /// Associates a row with a commit timestamp.
    pub fn new(row: Arc<Row>, version: u64) -> Self {
        Self { row, version }
    }

    /// Returns a reference to the row data.
    pub fn row(&self) -> &Arc<Row> {
        &self.row
    }

    /// Returns the commit timestamp of the row.
    pub fn version(&self) -> u64 {
        self.version
    }
}
