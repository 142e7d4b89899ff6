//! Error types for sheetgrid

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetgrid
///
/// All failures are synchronous and local to the call that caused them.
/// Mutating operations are all-or-nothing: an error means the worksheet
/// was left exactly as it was.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),

    /// Single-cell write or clear targeting a shadowed merged cell
    #[error("Cell {address} is shadowed by merged region {region}")]
    MergedCellWriteRejected {
        /// The rejected target address
        address: String,
        /// The region shadowing it
        region: String,
    },

    /// A new merge region intersects an existing one
    #[error("Merge {requested} overlaps existing merged region {existing}")]
    OverlappingMerge {
        /// The region that was requested
        requested: String,
        /// The region already registered
        existing: String,
    },

    /// Unmerge targeting an address outside every merged region
    #[error("Cell {0} is not inside any merged region")]
    NoSuchMerge(String),

    /// Structural edit that would ambiguously truncate a merged region
    #[error("Structural edit conflicts with merged region {0}")]
    StructuralEditConflict(String),

    /// Invariant breach; always a bug, never expected in correct usage
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),
}
