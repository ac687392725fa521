use ahash::AHashMap as HashMap;

use crate::isolation::IsolationLevel;
use crate::store::row_set::RowSet;
use crate::store::versioned_row::Row;

/// The kind of conflict detected for a committing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictType {
    /// A row this transaction read was overwritten by a later commit.
    ReadWrite,
    /// A row this transaction read was removed by a later commit.
    ReadDelete,
    /// A row this transaction writes was overwritten after it began.
    WriteWrite,
    /// A predicate scan was invalidated by a membership change (phantom).
    PhantomScan,
}

/// Validates a committing transaction against the current table state.
///
/// Implements the optimistic validation step: depending on the isolation
/// level, the read set, the write set, and the scan set are checked against
/// what is committed right now. Returns the conflicting keys and the kind of
/// conflict; an empty map means the commit may apply.
///
/// Must be called with the engine's commit lock held, so that validation and
/// the subsequent apply observe the same table state.
pub fn detect_conflicts(
    txn_id: u64,
    isolation: IsolationLevel,
    read_set: &HashMap<String, u64>,
    scan_set: &HashMap<i64, u64>,
    write_set: &HashMap<String, Option<Row>>,
    rows: &RowSet,
) -> HashMap<String, ConflictType> {
    let mut conflicts: HashMap<String, ConflictType> = HashMap::new();

    match isolation {
        IsolationLevel::ReadCommitted => {
            // No read validation: last committer wins, anomalies and all.
        }
        IsolationLevel::RepeatableRead | IsolationLevel::Serializable => {
            // Read validation: every row this transaction observed, present
            // or absent, must be unchanged.
            for (key, read_version) in read_set {
                match rows.get(key) {
                    Some(current) if current.version() > *read_version => {
                        conflicts.insert(key.clone(), ConflictType::ReadWrite);
                    }
                    None if *read_version > 0 => {
                        conflicts.insert(key.clone(), ConflictType::ReadDelete);
                    }
                    _ => {}
                }
            }

            // Write validation: a row this transaction writes must not have
            // been committed past the version this transaction saw. For keys
            // written blind, the transaction id acts as the start timestamp.
            for key in write_set.keys() {
                if let Some(current) = rows.get(key) {
                    let seen = read_set.get(key).copied().unwrap_or(txn_id);
                    if current.version() > seen {
                        conflicts.entry(key.clone()).or_insert(ConflictType::WriteWrite);
                    }
                }
            }

            if isolation == IsolationLevel::Serializable {
                // Scan validation: any membership change since the scan means
                // a row may have appeared or vanished inside the predicate.
                for (value, seen_membership) in scan_set {
                    if rows.membership_version() > *seen_membership {
                        conflicts.insert(format!("scan:value={value}"), ConflictType::PhantomScan);
                    }
                }
            }
        }
    }

    conflicts
}
