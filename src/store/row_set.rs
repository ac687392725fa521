use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_skiplist::SkipMap;

use crate::store::versioned_row::{Row, VersionedRow};

/// The key type for rows in the shared table.
type RowKey = String;

/// The shared table under test, implemented as a lock-free skip map.
///
/// Beyond the rows themselves the table maintains a *membership version*: a
/// counter bumped once per committed transaction that inserts or removes a
/// key (and on truncation). Predicate scans record it so that Serializable
/// commit validation can detect phantoms without per-row predicate locks.
pub struct RowSet {
    rows: SkipMap<RowKey, VersionedRow>,
    membership_version: AtomicU64,
}

impl RowSet {
    /// Creates a new, empty `RowSet`.
    pub fn new() -> Self {
        Self {
            rows: SkipMap::new(),
            membership_version: AtomicU64::new(0),
        }
    }

    /// Retrieves the current committed row for a key, if any.
    pub fn get(&self, key: &str) -> Option<VersionedRow> {
        self.rows.get(key).map(|entry| entry.value().clone())
    }

    /// Inserts or replaces the row for a key.
    ///
    /// Membership bookkeeping is the committing transaction's job: a commit
    /// that inserts a previously absent key must call
    /// [`RowSet::bump_membership`] once, under the engine's commit lock.
    pub fn insert(&self, key: RowKey, row: VersionedRow) {
        self.rows.insert(key, row);
    }

    /// Removes the row for a key, returning it if one existed.
    pub fn remove(&self, key: &str) -> Option<VersionedRow> {
        self.rows.remove(key).map(|entry| entry.value().clone())
    }

    /// Number of committed rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no committed rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Counts committed rows whose `value` matches.
    pub fn count_value(&self, value: i64) -> usize {
        self.rows
            .iter()
            .filter(|entry| entry.value().row().value == value)
            .count()
    }

    /// Returns the committed `(key, row)` pairs whose `value` matches, for
    /// anomaly diagnostics and transactional scans.
    pub fn matching(&self, value: i64) -> Vec<(String, Row)> {
        self.rows
            .iter()
            .filter(|entry| entry.value().row().value == value)
            .map(|entry| (entry.key().clone(), (**entry.value().row()).clone()))
            .collect()
    }

    /// The current membership version.
    pub fn membership_version(&self) -> u64 {
        self.membership_version.load(Ordering::SeqCst)
    }

    /// Bumps the membership version. Called once per committed transaction
    /// that changed which keys exist, with the engine's commit lock held.
    pub(crate) fn bump_membership(&self) -> u64 {
        self.membership_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Removes every row and bumps the membership version, resetting the
    /// table to the empty baseline between trials.
    pub fn truncate(&self) {
        while self.rows.pop_front().is_some() {}
        self.bump_membership();
    }
}

impl Default for RowSet {
    fn default() -> Self {
        Self::new()
    }
}
