//! Maat: a concurrent transaction-isolation anomaly race harness.
//!
//! The crate has two layers. The engine ([`Maat`]) is a small in-memory
//! optimistic-concurrency row store with three isolation levels; commits that
//! lose a race abort with a distinguishable, retryable error class. The
//! harness ([`harness::RaceHarness`]) repeatedly races two concurrent
//! transactions over the shared table, classifies every trial as deadlock,
//! anomaly, or clean, and terminates once enough deadlock-class aborts have
//! been observed — or fails fast the moment the table ends up in a state the
//! isolation level under test was supposed to forbid.

pub mod conflict;
pub mod errors;
pub mod harness;
pub mod isolation;
pub mod maat;
pub mod store;
pub mod transaction;
pub mod workload;

// Re-export key types and structs for easier access
pub use conflict::{ConflictType, detect_conflicts};
pub use errors::{MaatError, Result};
pub use harness::{AnomalyReport, RaceConfig, RaceHarness, RaceReport, Trial, TrialOutcome};
pub use isolation::IsolationLevel;
pub use maat::Maat;
pub use store::row_set::RowSet;
pub use store::versioned_row::{Row, VersionedRow};
pub use transaction::Transaction;
