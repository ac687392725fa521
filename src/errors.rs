use thiserror::Error;

use crate::harness::AnomalyReport;

#[derive(Error, Debug)]
pub enum MaatError {
    /// The engine aborted a commit because another transaction won the race
    /// for the same rows or predicate. This is the in-process analog of a
    /// deadlock / lock-wait-timeout abort in a locking engine: expected under
    /// contention and safe to retry.
    #[error("transaction conflict detected on {key}")]
    TransactionConflict { key: String },

    /// The shared table ended a trial in a state the isolation level under
    /// test was supposed to forbid. Fatal to the run, never retried.
    #[error("isolation anomaly detected: {0}")]
    Anomaly(AnomalyReport),

    /// The trial budget was exhausted before the deadlock threshold was
    /// reached. Distinct from both pass and anomaly failure.
    #[error("race inconclusive after {trials} trials ({deadlocks} deadlocks observed)")]
    Inconclusive { trials: u64, deadlocks: u32 },

    #[error("other error: {0}")]
    Other(String),
}

impl MaatError {
    /// Whether this error belongs to the deadlock class the harness counts
    /// and retries rather than propagates.
    pub fn is_deadlock_class(&self) -> bool {
        matches!(self, MaatError::TransactionConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, MaatError>;
