//! Rectangular views over a worksheet
//!
//! A view holds no cell data of its own; it is a transient accessor pair
//! (shared [`Range`], exclusive [`RangeMut`]) over the worksheet that
//! created it.
//!
//! Bulk writes deliberately diverge from single-cell writes on merged
//! cells: filling or clearing a range *skips* shadowed addresses instead
//! of failing, so "fill A1:B10" still works across a partially merged
//! area. Single-cell writes through a view keep the strict rejection.

use crate::cell::{CellAddress, CellData, CellRange, CellValue};
use crate::error::Result;
use crate::worksheet::Worksheet;

/// A read-only view of a rectangular block of cells
pub struct Range<'a> {
    worksheet: &'a Worksheet,
    range: CellRange,
}

impl<'a> Range<'a> {
    /// Create a new view over a normalized range
    pub fn new(worksheet: &'a Worksheet, range: CellRange) -> Self {
        Self { worksheet, range }
    }

    /// The underlying cell range
    pub fn range(&self) -> &CellRange {
        &self.range
    }

    /// Top-left address
    pub fn start(&self) -> CellAddress {
        self.range.start
    }

    /// Bottom-right address
    pub fn end(&self) -> CellAddress {
        self.range.end
    }

    /// Number of rows in the view
    pub fn row_count(&self) -> u32 {
        self.range.row_count()
    }

    /// Number of columns in the view
    pub fn col_count(&self) -> u16 {
        self.range.col_count()
    }

    /// Total number of addresses in the view
    pub fn cell_count(&self) -> u64 {
        self.range.cell_count()
    }

    /// Get a cell record by position relative to the top-left corner
    ///
    /// Shadowed merged cells read as absent.
    pub fn cell(&self, row: u32, col: u16) -> Option<&'a CellData> {
        self.worksheet
            .cell_at(self.range.start.row + row, self.range.start.col + col)
    }

    /// Get a cell value by position relative to the top-left corner
    pub fn value(&self, row: u32, col: u16) -> CellValue {
        self.worksheet
            .get_value_at(self.range.start.row + row, self.range.start.col + col)
    }

    /// Iterate over all cells in the view, row by row
    pub fn cells(&self) -> impl Iterator<Item = RangeCell<'a>> + '_ {
        self.range.cells().map(move |addr| RangeCell {
            address: addr,
            data: self.worksheet.cell_at(addr.row, addr.col),
        })
    }

    /// Iterate over the view one row at a time
    pub fn rows(&self) -> impl Iterator<Item = Vec<RangeCell<'a>>> + '_ {
        (self.range.start.row..=self.range.end.row).map(move |row| {
            (self.range.start.col..=self.range.end.col)
                .map(|col| {
                    let addr = CellAddress::new(row, col);
                    RangeCell {
                        address: addr,
                        data: self.worksheet.cell_at(row, col),
                    }
                })
                .collect()
        })
    }

    /// The A1-style address of this view
    pub fn address(&self) -> String {
        self.range.to_a1_string()
    }
}

/// An exclusive view of a rectangular block of cells
pub struct RangeMut<'a> {
    worksheet: &'a mut Worksheet,
    range: CellRange,
}

impl<'a> RangeMut<'a> {
    /// Create a new exclusive view over a normalized range
    pub fn new(worksheet: &'a mut Worksheet, range: CellRange) -> Self {
        Self { worksheet, range }
    }

    /// The underlying cell range
    pub fn range(&self) -> &CellRange {
        &self.range
    }

    /// Number of rows in the view
    pub fn row_count(&self) -> u32 {
        self.range.row_count()
    }

    /// Number of columns in the view
    pub fn col_count(&self) -> u16 {
        self.range.col_count()
    }

    /// Set a single cell by position relative to the top-left corner
    ///
    /// Same rules as [`Worksheet::set_cell_value_at`]: a shadowed target
    /// is rejected.
    pub fn set_value<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        self.worksheet.set_cell_value_at(
            self.range.start.row + row,
            self.range.start.col + col,
            value,
        )
    }

    /// Set every cell in the view to the same value
    ///
    /// Shadowed merged cells are skipped, not failed on.
    pub fn fill<V: Into<CellValue> + Clone>(&mut self, value: V) -> Result<()> {
        self.worksheet.fill_range(&self.range, value)
    }

    /// Clear every cell in the view, skipping shadowed merged cells
    pub fn clear(&mut self) {
        self.worksheet.clear_range(&self.range);
    }

    /// Merge the cells of this view into one region
    pub fn merge(&mut self) -> Result<CellRange> {
        self.worksheet.merge_range(&self.range)
    }
}

/// One cell yielded by [`Range::cells`]
pub struct RangeCell<'a> {
    /// The cell's address
    pub address: CellAddress,
    /// The record, if the cell is populated and not shadowed
    pub data: Option<&'a CellData>,
}

impl RangeCell<'_> {
    /// The cell value (empty when absent or shadowed)
    pub fn value(&self) -> CellValue {
        self.data
            .map(|d| d.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Check if the cell reads as empty
    pub fn is_empty(&self) -> bool {
        self.data.map(|d| d.value.is_empty()).unwrap_or(true)
    }

    /// Row index of this cell
    pub fn row(&self) -> u32 {
        self.address.row
    }

    /// Column index of this cell
    pub fn col(&self) -> u16 {
        self.address.col
    }
}
