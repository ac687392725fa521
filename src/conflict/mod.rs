/// Commit-time conflict detection.
pub mod detection;

pub use detection::{ConflictType, detect_conflicts};
