//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A rectangular block of cells (e.g., "A1:B10")
//! - [`CellValue`] - The raw content of a cell
//! - [`CellData`] / [`CellStorage`] - Records and their sparse store

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIter};
pub use storage::{CellData, CellStorage};
pub use value::{CellValue, SharedString};
