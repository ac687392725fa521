/// The shared table under test.
pub mod row_set;
/// Rows and their commit versions.
pub mod versioned_row;
