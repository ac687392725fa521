//! The canonical write-skew workload: two transactions both attempt
//! "insert value V unless a row with it already exists", and a consistent
//! outcome is exactly one surviving row for V.

use crate::errors::Result;
use crate::store::row_set::RowSet;
use crate::store::versioned_row::Row;
use crate::transaction::Transaction;

/// Stages "insert `value` unless a row with it already exists" inside `txn`.
///
/// Each transaction inserts under a key unique to itself, the way concurrent
/// SQL INSERTs produce distinct rows. Whether the guard scan actually guards
/// is the isolation level's problem — which is the point.
pub fn conditional_insert(txn: &mut Transaction, value: i64) -> Result<()> {
    if txn.count_value(value)? == 0 {
        let key = format!("row/{value}/{}", txn.id());
        txn.write(key, Row::with_payload(value, format!("txn-{}", txn.id())))?;
    }
    Ok(())
}

/// Anomaly predicate for [`conditional_insert`]: the row count for `value`
/// must be exactly one after a non-deadlocking trial.
pub fn at_most_one(rows: &RowSet, value: i64) -> std::result::Result<(), String> {
    let count = rows.count_value(value);
    if count == 1 {
        Ok(())
    } else {
        let writers: Vec<String> = rows
            .matching(value)
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        Err(format!(
            "expected exactly one row with value {value}, found {count} ({})",
            writers.join(", ")
        ))
    }
}
