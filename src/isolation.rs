/// Isolation levels supported by the Maat engine.
///
/// The engine validates optimistically at commit time; the level decides how
/// much of a transaction's read footprint is validated. Higher levels forbid
/// more anomalies at the cost of more commit-time aborts under contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    /// **Read Committed:**
    ///
    /// Reads always observe the latest committed row at the moment of the
    /// read, and nothing is validated at commit. Non-repeatable reads,
    /// phantoms, and duplicate conditional inserts are all possible. This is
    /// the deliberately weak level the harness uses to prove it can catch an
    /// anomaly at all.
    ReadCommitted,
    /// **Repeatable Read:**
    ///
    /// Every point read (including reads that observe absence) is recorded
    /// with the version it saw, and the commit aborts if any of those rows
    /// changed underneath the transaction. Predicate scans are *not*
    /// validated, so phantoms remain possible — mirroring the SQL
    /// REPEATABLE READ gap this harness was built to demonstrate.
    RepeatableRead,
    /// **Serializable:**
    ///
    /// Point reads are validated as under [`IsolationLevel::RepeatableRead`],
    /// and every predicate scan additionally records the table's membership
    /// version. A commit that changes table membership invalidates every
    /// concurrent scan footprint: first committer wins. Under this level at
    /// most one of two racing conditional inserts can succeed.
    Serializable,
}
