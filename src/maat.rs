use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::isolation::IsolationLevel;
use crate::store::row_set::RowSet;
use crate::transaction::Transaction;

/// Maat prelude.
pub mod prelude {
    pub use crate::conflict::*;
    pub use crate::errors::*;
    pub use crate::harness::*;
    pub use crate::store::row_set::*;
    pub use crate::store::versioned_row::*;
    pub use crate::transaction::*;
    pub use crate::workload::*;
    pub use crate::*;
}

/// The engine the harness races transactions against.
///
/// `Maat` owns the shared table, a globally increasing clock that doubles as
/// transaction-id allocator and commit-timestamp source, and the commit lock
/// that makes validate-then-apply atomic. It is the in-process stand-in for
/// the relational engine the original harness targeted: transactions run
/// under a chosen isolation level and losing commits abort with a
/// distinguishable, retryable error class.
pub struct Maat {
    /// The shared table holding the committed row set.
    rows: Arc<RowSet>,
    /// Clock for transaction ids and commit timestamps. Starts at 1 so that
    /// version 0 can mean "observed absent" in read sets.
    clock: Arc<AtomicU64>,
    /// The isolation level used by [`Maat::begin`].
    default_isolation: IsolationLevel,
    /// Serializes commit validation and apply across transactions.
    commit_lock: Arc<Mutex<()>>,
}

impl Maat {
    /// Creates a new engine with an empty table.
    pub fn new(default_isolation: IsolationLevel) -> Self {
        Self {
            rows: Arc::new(RowSet::new()),
            clock: Arc::new(AtomicU64::new(1)),
            default_isolation,
            commit_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The shared table. Exposed so anomaly checks can inspect post-trial
    /// state without going through a transaction.
    pub fn rows(&self) -> &Arc<RowSet> {
        &self.rows
    }

    /// Starts a transaction under the engine's default isolation level.
    pub fn begin(&self) -> Transaction {
        self.begin_with(self.default_isolation)
    }

    /// Starts a transaction under an explicitly chosen isolation level.
    ///
    /// The harness uses this to inject the level under test per run, without
    /// touching the engine default.
    pub fn begin_with(&self, isolation: IsolationLevel) -> Transaction {
        let id = self.clock.fetch_add(1, Ordering::SeqCst);
        Transaction::new(
            id,
            isolation,
            Arc::clone(&self.rows),
            Arc::clone(&self.clock),
            Arc::clone(&self.commit_lock),
        )
    }

    /// Resets the shared table to the empty baseline.
    pub fn truncate(&self) {
        self.rows.truncate();
    }
}
