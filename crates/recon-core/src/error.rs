//! Error types for recon-core

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a reconciliation a table sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The stored table being updated
    Old,
    /// The freshly uploaded table
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Old => write!(f, "old"),
            Side::New => write!(f, "new"),
        }
    }
}

/// Errors that can occur in recon-core
#[derive(Debug, Error)]
pub enum Error {
    /// Requested key column absent from one of the two tables
    #[error("key column '{column}' not found in {side} table")]
    InvalidKeyColumn { column: String, side: Side },

    /// Unrecognized merge strategy identifier
    #[error("unknown merge strategy '{0}'")]
    UnknownStrategy(String),

    /// Unrecognized conflict rule identifier
    #[error("unknown conflict rule '{0}'")]
    UnknownConflictRule(String),

    /// Duplicate column name in a table
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// Empty column name in a table
    #[error("empty column name at position {0}")]
    EmptyColumnName(usize),
}
