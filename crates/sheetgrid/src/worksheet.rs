//! Worksheet type
//!
//! The worksheet is the single-writer facade over the cell store and the
//! merge tracker. Every compound operation (structural edits above all)
//! touches both behind one `&mut self` call, so the two invariants —
//! one record per address, disjoint merge regions — always change
//! together. The engine never logs or prints; every failure comes back
//! as an [`Error`] for the document layer to surface.

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::formula::{self, ShiftOp};
use crate::merge::MergeTracker;
use crate::range::{Range, RangeMut};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
#[derive(Debug)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Sparse cell storage
    cells: CellStorage,
    /// Merged regions
    merges: MergeTracker,
    /// Sheet is visible
    visible: bool,
    /// Freeze pane settings
    freeze_panes: Option<FreezePanes>,
}

impl Worksheet {
    /// Create a new empty worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            merges: MergeTracker::new(),
            visible: true,
            freeze_panes: None,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Check if the sheet is visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set sheet visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Get freeze pane settings
    pub fn freeze_panes(&self) -> Option<&FreezePanes> {
        self.freeze_panes.as_ref()
    }

    /// Freeze rows above `row` and columns left of `col`
    pub fn set_freeze_panes(&mut self, row: u32, col: u16) {
        if row == 0 && col == 0 {
            self.freeze_panes = None;
        } else {
            self.freeze_panes = Some(FreezePanes { row, col });
        }
    }

    /// Remove freeze panes
    pub fn unfreeze_panes(&mut self) {
        self.freeze_panes = None;
    }

    // === Cell Access ===

    /// Get a cell record by address string (e.g., "A1")
    ///
    /// Shadowed merged cells read as absent.
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell record by row and column indices
    ///
    /// Shadowed merged cells read as absent.
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        if self.merges.is_shadowed(CellAddress::new(row, col)) {
            return None;
        }
        self.cells.get(row, col)
    }

    /// Get a cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get a cell value by indices (empty when absent or shadowed)
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cell_at(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices
    ///
    /// Fails with [`Error::MergedCellWriteRejected`] when the target is a
    /// shadowed merged cell; the top-left of a region stays writable.
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.ensure_not_shadowed(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col, formula)
    }

    /// Set a cell formula by row and column indices
    ///
    /// The text is stored verbatim (normalized to start with '='), never
    /// evaluated.
    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.ensure_not_shadowed(row, col)?;

        let text = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };

        self.cells.set_value(row, col, CellValue::formula(text));
        Ok(())
    }

    /// Set a cell's style handle by address string
    pub fn set_cell_style(&mut self, address: &str, style_index: Option<u32>) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_style_at(addr.row, addr.col, style_index)
    }

    /// Set a cell's style handle by row and column indices
    ///
    /// The handle is opaque; an external style table owns its meaning.
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style_index: Option<u32>) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.ensure_not_shadowed(row, col)?;
        self.cells.set_style(row, col, style_index);
        Ok(())
    }

    /// Get a cell's style handle by row and column indices
    ///
    /// Reads raw storage, so merge shadowing does not apply: a renderer
    /// styles every cell of a merged rectangle, not just its top-left.
    pub fn cell_style_index_at(&self, row: u32, col: u16) -> Option<u32> {
        self.cells.get(row, col).and_then(|c| c.style_index)
    }

    /// Set a cell's hyperlink target by address string
    pub fn set_hyperlink(&mut self, address: &str, target: Option<String>) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.validate_cell_position(addr.row, addr.col)?;
        self.ensure_not_shadowed(addr.row, addr.col)?;
        self.cells.set_hyperlink(addr.row, addr.col, target);
        Ok(())
    }

    /// Get a cell's hyperlink target by address string
    pub fn hyperlink(&self, address: &str) -> Result<Option<&str>> {
        let addr = CellAddress::parse(address)?;
        Ok(self
            .cell_at(addr.row, addr.col)
            .and_then(|c| c.hyperlink.as_deref()))
    }

    /// Clear a cell by address string
    ///
    /// No-op when the cell is absent; same merged-cell rejection rule as
    /// setting a value.
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.clear_cell_at(addr.row, addr.col)
    }

    /// Clear a cell by indices
    pub fn clear_cell_at(&mut self, row: u32, col: u16) -> Result<()> {
        self.ensure_not_shadowed(row, col)?;
        self.cells.remove(row, col);
        Ok(())
    }

    // === Formula calculation support ===

    /// Iterate over all formula cells: (row, col, formula_text)
    ///
    /// Reads raw storage, so formulas hidden under merge regions are
    /// included; the evaluator must recompute every stored formula, not
    /// just the visible ones.
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &str)> {
        self.cells.iter().filter_map(|(row, col, cell)| {
            cell.value.formula_text().map(|text| (row, col, text))
        })
    }

    /// Get the formula text at a cell position (if it's a formula)
    ///
    /// Same raw-storage read as [`Worksheet::formula_cells`]: shadowed
    /// formulas are still returned.
    pub fn get_formula_at(&self, row: u32, col: u16) -> Option<&str> {
        self.cells.get(row, col).and_then(|c| c.value.formula_text())
    }

    /// Set the cached result value of a formula cell
    ///
    /// Hook for the external evaluator. Fails if the cell doesn't exist
    /// or isn't a formula.
    pub fn set_formula_result(&mut self, row: u32, col: u16, value: CellValue) -> Result<()> {
        let cell = self.cells.get_mut(row, col).ok_or_else(|| {
            Error::InvalidAddress(format!("no cell at ({}, {})", row, col))
        })?;

        match &mut cell.value {
            CellValue::Formula { cached_value, .. } => {
                *cached_value = Some(Box::new(value));
                Ok(())
            }
            other => Err(Error::InvalidAddress(format!(
                "cell at ({}, {}) holds a {}, not a formula",
                row,
                col,
                other.type_name()
            ))),
        }
    }

    // === Merged Cells ===

    /// Get all merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        self.merges.regions()
    }

    /// Merge the rectangle spanned by two address strings
    ///
    /// Existing content in the cells that become shadowed stays in the
    /// store but is unreadable and unwritable until unmerge.
    pub fn merge_cells(&mut self, top_left: &str, bottom_right: &str) -> Result<CellRange> {
        let a = CellAddress::parse(top_left)?;
        let b = CellAddress::parse(bottom_right)?;
        self.merges.merge(a, b)
    }

    /// Merge an already-constructed range
    pub fn merge_range(&mut self, range: &CellRange) -> Result<CellRange> {
        self.merges.merge(range.start, range.end)
    }

    /// Unmerge the region containing the given address string
    ///
    /// Previously shadowed content becomes visible again; unmerge never
    /// erases data.
    pub fn unmerge_at(&mut self, address: &str) -> Result<CellRange> {
        let addr = CellAddress::parse(address)?;
        self.merges.unmerge(addr)
    }

    /// Check whether an address is shadowed by a merge region
    pub fn is_shadowed_at(&self, row: u32, col: u16) -> bool {
        self.merges.is_shadowed(CellAddress::new(row, col))
    }

    /// Get the merged region containing an address, if any
    pub fn region_containing(&self, row: u32, col: u16) -> Option<&CellRange> {
        self.merges.region_containing(CellAddress::new(row, col))
    }

    // === Range Operations ===

    /// Build a read-only view from two address strings
    pub fn range(&self, start: &str, end: &str) -> Result<Range<'_>> {
        let a = CellAddress::parse(start)?;
        let b = CellAddress::parse(end)?;
        Ok(Range::new(self, CellRange::new(a, b)))
    }

    /// Build an exclusive view from two address strings
    pub fn range_mut(&mut self, start: &str, end: &str) -> Result<RangeMut<'_>> {
        let a = CellAddress::parse(start)?;
        let b = CellAddress::parse(end)?;
        Ok(RangeMut::new(self, CellRange::new(a, b)))
    }

    /// Set the same value for all cells in a range
    ///
    /// Shadowed merged cells are skipped rather than failed on: a bulk
    /// fill across a partially merged area is expected to work.
    pub fn fill_range<V: Into<CellValue> + Clone>(
        &mut self,
        range: &CellRange,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(range.end.row, range.end.col)?;
        let value = value.into();
        for addr in range.cells() {
            if self.merges.is_shadowed(addr) {
                continue;
            }
            self.cells.set_value(addr.row, addr.col, value.clone());
        }
        Ok(())
    }

    /// Clear all cells in a range, skipping shadowed merged cells
    pub fn clear_range(&mut self, range: &CellRange) {
        for addr in range.cells() {
            if self.merges.is_shadowed(addr) {
                continue;
            }
            self.cells.remove(addr.row, addr.col);
        }
    }

    /// Get the used range (bounds of all populated cells)
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(min_row, min_col, max_row, max_col)| {
                CellRange::from_indices(min_row, min_col, max_row, max_col)
            })
    }

    /// Number of rows from the top of the sheet through the last populated row
    pub fn row_count(&self) -> u32 {
        self.cells
            .used_bounds()
            .map(|(_, _, max_row, _)| max_row + 1)
            .unwrap_or(0)
    }

    /// Number of columns from the left of the sheet through the last populated column
    pub fn column_count(&self) -> u16 {
        self.cells
            .used_bounds()
            .map(|(_, _, _, max_col)| max_col + 1)
            .unwrap_or(0)
    }

    /// Number of populated cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Check if the worksheet has no populated cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    // === Structural Edits ===

    /// Insert `count` blank rows before 0-based row `start_row`
    ///
    /// Records at or below the insertion point relocate down; merged
    /// regions entirely at or below shift whole, regions straddling the
    /// insertion point grow; formula references follow the moved cells.
    pub fn insert_rows(&mut self, start_row: u32, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        // Validate before mutating: nothing may relocate past the grid.
        if let Some((_, _, max_row, _)) = self.cells.used_bounds() {
            if max_row >= start_row {
                let target = max_row
                    .checked_add(count)
                    .ok_or(Error::RowOutOfBounds(u32::MAX, MAX_ROWS - 1))?;
                if target >= MAX_ROWS {
                    return Err(Error::RowOutOfBounds(target, MAX_ROWS - 1));
                }
            }
        }
        for region in self.merges.regions() {
            if region.end.row >= start_row {
                let target = region
                    .end
                    .row
                    .checked_add(count)
                    .ok_or(Error::RowOutOfBounds(u32::MAX, MAX_ROWS - 1))?;
                if target >= MAX_ROWS {
                    return Err(Error::RowOutOfBounds(target, MAX_ROWS - 1));
                }
            }
        }

        self.relocate_cells(
            |row, _| row >= start_row,
            |row, col| (row + count, col),
            // Descending row order so no relocation lands on a slot that
            // is still waiting to move.
            |a, b| b.0.cmp(&a.0),
        )?;

        let shifted = self
            .merges
            .regions()
            .iter()
            .map(|r| {
                let mut r = *r;
                if r.start.row >= start_row {
                    r.start.row += count;
                    r.end.row += count;
                } else if r.end.row >= start_row {
                    r.end.row += count;
                }
                r
            })
            .collect();
        self.merges.replace_unchecked(shifted);

        self.rewrite_formulas(ShiftOp::InsertRows {
            start: start_row,
            count,
        });
        Ok(())
    }

    /// Insert `count` blank columns before 0-based column `start_col`
    pub fn insert_columns(&mut self, start_col: u16, count: u16) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        if let Some((_, _, _, max_col)) = self.cells.used_bounds() {
            if max_col >= start_col {
                let target = max_col as u32 + count as u32;
                if target >= MAX_COLS as u32 {
                    return Err(Error::ColumnOutOfBounds(u16::MAX, MAX_COLS - 1));
                }
            }
        }
        for region in self.merges.regions() {
            if region.end.col >= start_col {
                let target = region.end.col as u32 + count as u32;
                if target >= MAX_COLS as u32 {
                    return Err(Error::ColumnOutOfBounds(u16::MAX, MAX_COLS - 1));
                }
            }
        }

        self.relocate_cells(
            |_, col| col >= start_col,
            |row, col| (row, col + count),
            |a, b| b.1.cmp(&a.1),
        )?;

        let shifted = self
            .merges
            .regions()
            .iter()
            .map(|r| {
                let mut r = *r;
                if r.start.col >= start_col {
                    r.start.col += count;
                    r.end.col += count;
                } else if r.end.col >= start_col {
                    r.end.col += count;
                }
                r
            })
            .collect();
        self.merges.replace_unchecked(shifted);

        self.rewrite_formulas(ShiftOp::InsertColumns {
            start: start_col,
            count,
        });
        Ok(())
    }

    /// Delete 0-based rows `start_row .. start_row + count`
    ///
    /// Records in the span are removed and records below shift up. A
    /// merged region entirely inside the span is removed with it; one
    /// that only partially overlaps the span fails the whole edit with
    /// [`Error::StructuralEditConflict`] — truncating a merge would
    /// silently lose its shape, so the engine refuses to guess.
    pub fn delete_rows(&mut self, start_row: u32, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let end = start_row.saturating_add(count);

        // Validate every region before touching anything.
        for region in self.merges.regions() {
            let overlaps = region.start.row < end && region.end.row >= start_row;
            let contained = region.start.row >= start_row && region.end.row < end;
            if overlaps && !contained {
                return Err(Error::StructuralEditConflict(region.to_a1_string()));
            }
        }

        // Records in the deleted span disappear.
        self.cells
            .take_matching(|row, _| row >= start_row && row < end);

        self.relocate_cells(
            |row, _| row >= end,
            |row, col| (row - count, col),
            // Ascending row order when shifting up
            |a, b| a.0.cmp(&b.0),
        )?;

        let remaining = self
            .merges
            .regions()
            .iter()
            .filter(|r| !(r.start.row >= start_row && r.end.row < end))
            .map(|r| {
                let mut r = *r;
                if r.start.row >= end {
                    r.start.row -= count;
                    r.end.row -= count;
                }
                r
            })
            .collect();
        self.merges.replace_unchecked(remaining);

        self.rewrite_formulas(ShiftOp::DeleteRows {
            start: start_row,
            count,
        });
        Ok(())
    }

    /// Delete 0-based columns `start_col .. start_col + count`
    pub fn delete_columns(&mut self, start_col: u16, count: u16) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let end = start_col.saturating_add(count);

        for region in self.merges.regions() {
            let overlaps = region.start.col < end && region.end.col >= start_col;
            let contained = region.start.col >= start_col && region.end.col < end;
            if overlaps && !contained {
                return Err(Error::StructuralEditConflict(region.to_a1_string()));
            }
        }

        self.cells
            .take_matching(|_, col| col >= start_col && col < end);

        self.relocate_cells(
            |_, col| col >= end,
            |row, col| (row, col - count),
            |a, b| a.1.cmp(&b.1),
        )?;

        let remaining = self
            .merges
            .regions()
            .iter()
            .filter(|r| !(r.start.col >= start_col && r.end.col < end))
            .map(|r| {
                let mut r = *r;
                if r.start.col >= end {
                    r.start.col -= count;
                    r.end.col -= count;
                }
                r
            })
            .collect();
        self.merges.replace_unchecked(remaining);

        self.rewrite_formulas(ShiftOp::DeleteColumns {
            start: start_col,
            count,
        });
        Ok(())
    }

    // === Document packager contract ===

    /// Iterate over all populated cells in arbitrary order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    /// All populated cells sorted row-major, for deterministic output
    pub fn cells_sorted(&self) -> Vec<(u32, u16, &CellData)> {
        self.cells.iter_sorted()
    }

    /// Populate cells and merged regions in one pass
    ///
    /// Replaces the current content entirely. Positions are validated and
    /// the region set checked for disjointness before anything is swapped
    /// in, so a failed load leaves the worksheet unchanged. Records are
    /// accepted at shadowed addresses: a document may legitimately carry
    /// hidden content under its merges.
    pub fn load<I>(&mut self, cells: I, regions: Vec<CellRange>) -> Result<()>
    where
        I: IntoIterator<Item = (u32, u16, CellData)>,
    {
        let mut merges = MergeTracker::new();
        merges.load(regions)?;

        let mut storage = CellStorage::new();
        for (row, col, data) in cells {
            self.validate_cell_position(row, col)?;
            storage.set(row, col, data);
        }

        self.cells = storage;
        self.merges = merges;
        Ok(())
    }

    // === Internal ===

    /// Drain all records matching `pred`, relocate them through `target`,
    /// and reinsert in the order given by `order`
    fn relocate_cells<P, T, O>(&mut self, pred: P, target: T, order: O) -> Result<()>
    where
        P: FnMut(u32, u16) -> bool,
        T: Fn(u32, u16) -> (u32, u16),
        O: FnMut(&(u32, u16, CellData), &(u32, u16, CellData)) -> std::cmp::Ordering,
    {
        let mut moved = self.cells.take_matching(pred);
        moved.sort_by(order);

        for (row, col, data) in moved {
            let (new_row, new_col) = target(row, col);
            if self.cells.insert_vacant(new_row, new_col, data).is_some() {
                // Unreachable given ordered processing; fail loudly
                // rather than drop a record.
                return Err(Error::InternalConsistency(format!(
                    "relocation collision at ({}, {})",
                    new_row, new_col
                )));
            }
        }
        Ok(())
    }

    /// Rewrite references in every stored formula for a structural edit
    ///
    /// Formulas whose text changes lose their cached value; the external
    /// evaluator recomputes them on its next pass.
    fn rewrite_formulas(&mut self, op: ShiftOp) {
        for (_, _, cell) in self.cells.iter_mut() {
            if let CellValue::Formula { text, cached_value } = &mut cell.value {
                let rewritten = formula::shift_references(text, op);
                if rewritten != *text {
                    *text = rewritten;
                    *cached_value = None;
                }
            }
        }
    }

    /// Validate a cell position against the grid limits
    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }

    /// Reject single-cell writes targeting a shadowed merged cell
    fn ensure_not_shadowed(&self, row: u32, col: u16) -> Result<()> {
        let addr = CellAddress::new(row, col);
        if let Some(region) = self.merges.region_containing(addr) {
            if region.start.row != row || region.start.col != col {
                return Err(Error::MergedCellWriteRejected {
                    address: addr.to_a1_string(),
                    region: region.to_a1_string(),
                });
            }
        }
        Ok(())
    }
}

/// Freeze pane settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezePanes {
    /// First unfrozen row
    pub row: u32,
    /// First unfrozen column
    pub col: u16,
}
