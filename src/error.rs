//! Error types for tempora.

use crate::types::Version;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, TemporaError>;

/// Errors reported by the timeline index and its collaborators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporaError {
    /// The requested version lies outside the range covered by the index.
    #[error("version {requested} does not exist (index covers 0..{current})")]
    InvalidVersion { requested: Version, current: Version },

    /// The requested column is not present in the table's rows.
    #[error("column {column} out of range for rows with {width} columns")]
    InvalidColumn { column: usize, width: usize },

    /// The operation is only defined for indexes built directly over a table.
    #[error("operation not supported on a join-result index")]
    JoinedIndex,

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
