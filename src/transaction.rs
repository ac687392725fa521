use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap as HashMap;
use log::debug;
use parking_lot::Mutex;

use crate::conflict::detect_conflicts;
use crate::errors::{MaatError, Result};
use crate::isolation::IsolationLevel;
use crate::store::row_set::RowSet;
use crate::store::versioned_row::{Row, VersionedRow};

/// A single transaction against the shared table.
///
/// A transaction stages reads, predicate scans, writes, and deletes, then
/// validates and applies them atomically at commit. What gets validated is
/// decided by the transaction's [`IsolationLevel`]; validation failures
/// surface as [`MaatError::TransactionConflict`], the deadlock-class error
/// the race harness counts and retries.
pub struct Transaction {
    /// Unique identifier, allocated from the engine clock. Also serves as
    /// the transaction's start timestamp.
    id: u64,
    /// The isolation level this transaction runs under.
    isolation: IsolationLevel,
    /// The shared table.
    rows: Arc<RowSet>,
    /// The engine clock, used to stamp the commit.
    clock: Arc<AtomicU64>,
    /// The engine-wide commit lock.
    commit_lock: Arc<Mutex<()>>,
    /// Keys read by this transaction and the row version observed (0 when
    /// the key was absent).
    read_set: HashMap<String, u64>,
    /// Predicate scans performed by this transaction: scanned value to the
    /// table membership version observed. Only populated under Serializable.
    scan_set: HashMap<i64, u64>,
    /// Staged changes: `Some(row)` for insert/update, `None` for delete.
    write_set: HashMap<String, Option<Row>>,
}

impl Transaction {
    /// Returns the transaction's unique identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn new(
        id: u64,
        isolation: IsolationLevel,
        rows: Arc<RowSet>,
        clock: Arc<AtomicU64>,
        commit_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            id,
            isolation,
            rows,
            clock,
            commit_lock,
            read_set: HashMap::new(),
            scan_set: HashMap::new(),
            write_set: HashMap::new(),
        }
    }

    /// Reads the row for a key.
    ///
    /// Staged changes in this transaction's write set win over committed
    /// state. Under `RepeatableRead` and `Serializable` the observed version
    /// is recorded in the read set — including version 0 for a key observed
    /// absent, so that a concurrent insert of that key is caught at commit.
    pub fn read(&mut self, key: &str) -> Result<Option<Arc<Row>>> {
        if let Some(change) = self.write_set.get(key) {
            return Ok(change.as_ref().map(|row| Arc::new(row.clone())));
        }

        let versioned = self.rows.get(key);
        match self.isolation {
            IsolationLevel::ReadCommitted => Ok(versioned.map(|v| v.row().clone())),
            IsolationLevel::RepeatableRead | IsolationLevel::Serializable => match versioned {
                Some(v) => {
                    self.read_set.insert(key.to_string(), v.version());
                    Ok(Some(v.row().clone()))
                }
                None => {
                    self.read_set.insert(key.to_string(), 0);
                    Ok(None)
                }
            },
        }
    }

    /// Counts rows whose `value` matches, merged with this transaction's
    /// staged changes.
    ///
    /// This is the predicate read of the conditional-insert workload. Under
    /// `Serializable` the table's membership version at scan time is
    /// recorded, so any commit that later changes table membership aborts
    /// this transaction. `ReadCommitted` and `RepeatableRead` record
    /// nothing: the scan is phantom-prone by design.
    pub fn count_value(&mut self, value: i64) -> Result<usize> {
        if self.isolation == IsolationLevel::Serializable {
            let membership = self.rows.membership_version();
            self.scan_set.entry(value).or_insert(membership);
        }

        let mut count = 0usize;
        for (key, _) in self.rows.matching(value) {
            // Committed rows superseded by a staged change are counted from
            // the write set below instead.
            if !self.write_set.contains_key(&key) {
                count += 1;
            }
        }
        for change in self.write_set.values() {
            if let Some(row) = change {
                if row.value == value {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Stages an insert or update for a key.
    pub fn write(&mut self, key: impl Into<String>, row: Row) -> Result<()> {
        self.write_set.insert(key.into(), Some(row));
        Ok(())
    }

    /// Stages a delete for a key.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.write_set.insert(key.to_string(), None);
        Ok(())
    }

    /// Attempts to commit the transaction.
    ///
    /// Takes the engine-wide commit lock so that validation and apply see the
    /// same table state, validates the read and scan sets according to the
    /// isolation level, then stamps the staged changes with a fresh commit
    /// timestamp and applies them. If any key was inserted or removed the
    /// table's membership version is bumped once, which is what invalidates
    /// concurrent Serializable scans.
    ///
    /// # Errors
    ///
    /// [`MaatError::TransactionConflict`] when validation fails; the
    /// transaction is consumed either way.
    pub fn commit(self) -> Result<()> {
        let _guard = self.commit_lock.lock();

        let conflicts = detect_conflicts(
            self.id,
            self.isolation,
            &self.read_set,
            &self.scan_set,
            &self.write_set,
            &self.rows,
        );
        if let Some((key, kind)) = conflicts.into_iter().next() {
            debug!(
                "transaction {} aborted: {:?} conflict on {}",
                self.id, kind, key
            );
            return Err(MaatError::TransactionConflict { key });
        }

        let commit_ts = self.clock.fetch_add(1, Ordering::SeqCst);
        let mut membership_changed = false;
        for (key, change) in self.write_set {
            match change {
                Some(row) => {
                    if self.rows.get(&key).is_none() {
                        membership_changed = true;
                    }
                    self.rows
                        .insert(key, VersionedRow::new(Arc::new(row), commit_ts));
                }
                None => {
                    if self.rows.remove(&key).is_some() {
                        membership_changed = true;
                    }
                }
            }
        }
        if membership_changed {
            self.rows.bump_membership();
        }

        debug!("transaction {} committed at {}", self.id, commit_ts);
        Ok(())
    }

    /// Aborts the transaction, discarding staged changes.
    pub fn rollback(self) {
        debug!("transaction {} rolled back", self.id);
        // read_set, scan_set, and write_set are dropped with self.
    }
}
