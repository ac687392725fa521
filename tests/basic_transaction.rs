mod common;

use maat::{IsolationLevel, Maat, MaatError, Row};

use common::{commit_row, setup_engine};

#[test]
fn test_basic_engine_creation() {
    let engine = Maat::new(IsolationLevel::ReadCommitted);

    // Transaction ids come off the engine clock and keep incrementing.
    let first = engine.begin().id();
    let second = engine.begin().id();
    assert!(second > first);
    assert!(engine.rows().is_empty());
}

#[test]
fn test_basic_read_write_commit() {
    let engine = setup_engine(IsolationLevel::ReadCommitted);

    let mut txn = engine.begin();
    txn.write("key1".to_string(), Row::with_payload(100, "writer-a"))
        .unwrap();
    txn.commit().unwrap();

    // Verify the row is visible to a fresh transaction.
    let mut txn2 = engine.begin();
    let read = txn2.read("key1").unwrap().unwrap();
    assert_eq!(read.value, 100);
    assert_eq!(read.payload.as_deref(), Some("writer-a"));
}

#[test]
fn test_basic_delete_commit() {
    let engine = setup_engine(IsolationLevel::ReadCommitted);
    commit_row(&engine, "key1", Row::new(100));

    let mut txn = engine.begin();
    txn.delete("key1").unwrap();
    txn.commit().unwrap();

    let mut txn2 = engine.begin();
    assert!(txn2.read("key1").unwrap().is_none());
    assert!(engine.rows().is_empty());
}

#[test]
fn test_basic_rollback() {
    let engine = setup_engine(IsolationLevel::ReadCommitted);

    let mut txn = engine.begin();
    txn.write("key1".to_string(), Row::new(100)).unwrap();
    txn.rollback();

    // Staged changes never reached the table.
    let mut txn2 = engine.begin();
    assert!(txn2.read("key1").unwrap().is_none());
}

#[test]
fn test_count_value_merges_staged_writes() {
    let engine = setup_engine(IsolationLevel::ReadCommitted);
    commit_row(&engine, "committed", Row::new(1));

    let mut txn = engine.begin();
    txn.write("staged".to_string(), Row::new(1)).unwrap();

    // Own staged insert is visible to the transaction's scan...
    assert_eq!(txn.count_value(1).unwrap(), 2);
    // ...but not to anyone else before commit.
    assert_eq!(engine.rows().count_value(1), 1);

    // A staged delete hides the committed row from the scan.
    txn.delete("committed").unwrap();
    assert_eq!(txn.count_value(1).unwrap(), 1);
}

#[test]
fn test_truncate_resets_baseline() {
    let engine = setup_engine(IsolationLevel::ReadCommitted);
    commit_row(&engine, "key1", Row::new(1));
    commit_row(&engine, "key2", Row::new(2));
    assert_eq!(engine.rows().len(), 2);

    let before = engine.rows().membership_version();
    engine.truncate();
    assert!(engine.rows().is_empty());
    assert!(engine.rows().membership_version() > before);
}

#[test]
fn test_repeatable_read_detects_changed_row() {
    // Interleaving without threads: txn1 reads a row, txn2 overwrites it and
    // commits, txn1's commit must abort on read validation.
    let engine = setup_engine(IsolationLevel::RepeatableRead);
    commit_row(&engine, "key1", Row::new(100));

    let mut txn1 = engine.begin();
    let read = txn1.read("key1").unwrap().unwrap();
    assert_eq!(read.value, 100);

    let mut txn2 = engine.begin();
    txn2.write("key1".to_string(), Row::new(200)).unwrap();
    txn2.commit().unwrap();

    txn1.write("other".to_string(), Row::new(1)).unwrap();
    let err = txn1.commit().unwrap_err();
    assert!(err.is_deadlock_class(), "unexpected error: {err}");
}

#[test]
fn test_repeatable_read_detects_vanished_absence() {
    // Observing absence is a read too: a concurrent insert of the same key
    // must abort the reader at commit.
    let engine = setup_engine(IsolationLevel::RepeatableRead);

    let mut txn1 = engine.begin();
    assert!(txn1.read("key1").unwrap().is_none());

    commit_row(&engine, "key1", Row::new(1));

    txn1.write("other".to_string(), Row::new(2)).unwrap();
    assert!(txn1.commit().unwrap_err().is_deadlock_class());
}

#[test]
fn test_read_committed_skips_validation() {
    // The same interleaving commits fine under ReadCommitted.
    let engine = setup_engine(IsolationLevel::ReadCommitted);
    commit_row(&engine, "key1", Row::new(100));

    let mut txn1 = engine.begin();
    txn1.read("key1").unwrap().unwrap();

    let mut txn2 = engine.begin();
    txn2.write("key1".to_string(), Row::new(200)).unwrap();
    txn2.commit().unwrap();

    txn1.write("other".to_string(), Row::new(1)).unwrap();
    txn1.commit().unwrap();
}

#[test]
fn test_serializable_scan_conflicts_on_phantom() {
    let engine = setup_engine(IsolationLevel::Serializable);

    let mut txn1 = engine.begin();
    assert_eq!(txn1.count_value(1).unwrap(), 0);

    // A concurrent insert changes table membership under txn1's scan.
    commit_row(&engine, "row/1/other", Row::new(1));

    txn1.write("row/1/mine".to_string(), Row::new(1)).unwrap();
    match txn1.commit().unwrap_err() {
        MaatError::TransactionConflict { key } => assert_eq!(key, "scan:value=1"),
        e => panic!("expected a conflict, got: {e}"),
    }
    assert_eq!(engine.rows().count_value(1), 1);
}

#[test]
fn test_repeatable_read_allows_phantom() {
    // Same interleaving as above, one level down: the scan is not validated,
    // both inserts land, and the guarded invariant is gone.
    let engine = setup_engine(IsolationLevel::RepeatableRead);

    let mut txn1 = engine.begin();
    assert_eq!(txn1.count_value(1).unwrap(), 0);

    commit_row(&engine, "row/1/other", Row::new(1));

    txn1.write("row/1/mine".to_string(), Row::new(1)).unwrap();
    txn1.commit().unwrap();
    assert_eq!(engine.rows().count_value(1), 2);
}
