//! # sheetgrid
//!
//! A sparse worksheet model: cell addressing, merge regions, rectangular
//! range views, and structural row/column edits.
//!
//! This crate owns the in-memory cell grid and its two core invariants
//! (one record per address, disjoint merge regions). It deliberately does
//! *not* evaluate formulas, interpret styles, or read/write any file
//! format — formula text is stored and rewritten verbatim, style indices
//! are opaque handles into an externally owned style table, and the
//! populated cells and merge regions are exposed through enumeration and
//! bulk-load calls for a document packager to persist.
//!
//! ## Example
//!
//! ```rust
//! use sheetgrid::{Worksheet, CellValue};
//!
//! let mut sheet = Worksheet::new("Report");
//!
//! // Using string addresses
//! sheet.set_cell_value("A1", "Hello").unwrap();
//! sheet.set_cell_value("B1", 42.0).unwrap();
//!
//! // Or using row/column indices (0-based)
//! sheet.set_cell_value_at(1, 0, CellValue::string("World")).unwrap();
//!
//! // Merged cells: only the top-left of a region is addressable
//! sheet.merge_cells("A3", "C3").unwrap();
//! assert!(sheet.set_cell_value("B3", "nope").is_err());
//! ```

pub mod cell;
pub mod error;
pub mod formula;
pub mod merge;
pub mod range;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellData, CellRange, CellStorage, CellValue, SharedString};
pub use error::{Error, Result};
pub use formula::ShiftOp;
pub use merge::MergeTracker;
pub use range::{Range, RangeCell, RangeMut};
pub use worksheet::{FreezePanes, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
