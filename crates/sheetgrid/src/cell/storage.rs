//! Sparse cell storage
//!
//! Only populated cells are stored. The map is keyed by a packed
//! (row, column) pair, so lookup and mutation are O(1) and every bulk
//! operation is proportional to the number of populated cells, never the
//! theoretical grid size.

use ahash::AHashMap;

use super::CellValue;

/// Complete record for a single populated cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    /// The cell's raw value
    pub value: CellValue,
    /// Opaque handle into an externally owned style table
    pub style_index: Option<u32>,
    /// Hyperlink target, if any
    pub hyperlink: Option<String>,
}

impl CellData {
    /// Create a new record with a value and no style or hyperlink
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style_index: None,
            hyperlink: None,
        }
    }

    /// Create a new record with a value and style handle
    pub fn with_style(value: CellValue, style_index: u32) -> Self {
        Self {
            value,
            style_index: Some(style_index),
            hyperlink: None,
        }
    }

    /// Create an empty record
    pub fn empty() -> Self {
        Self::new(CellValue::Empty)
    }

    /// Check if this record carries nothing worth storing
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style_index.is_none() && self.hyperlink.is_none()
    }
}

impl Default for CellData {
    fn default() -> Self {
        Self::empty()
    }
}

/// Pack a (row, col) pair into a single map key
///
/// Rows fit in 20 bits and columns in 14 (the Excel limits), so the low 16
/// bits hold the column and the rest the row.
fn pack(row: u32, col: u16) -> u64 {
    ((row as u64) << 16) | col as u64
}

fn unpack(key: u64) -> (u32, u16) {
    ((key >> 16) as u32, (key & 0xFFFF) as u16)
}

/// Sparse storage for worksheet cells
///
/// Design decisions:
/// - Hash map keyed by a packed (row, col) pair for O(1) access
/// - Only populated cells are stored; clearing removes the entry
/// - Used bounds are computed by scanning keys, so they cost O(populated)
#[derive(Debug, Default)]
pub struct CellStorage {
    cells: AHashMap<u64, CellData>,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell record
    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(&pack(row, col))
    }

    /// Get a mutable cell record
    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.cells.get_mut(&pack(row, col))
    }

    /// Insert or overwrite a whole record
    ///
    /// Empty records are removed rather than stored.
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        if data.is_empty() {
            self.cells.remove(&pack(row, col));
        } else {
            self.cells.insert(pack(row, col), data);
        }
    }

    /// Set just the cell value, preserving style and hyperlink
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        match self.cells.get_mut(&pack(row, col)) {
            Some(cell) => {
                cell.value = value;
                if cell.is_empty() {
                    self.cells.remove(&pack(row, col));
                }
            }
            None => {
                if !value.is_empty() {
                    self.cells.insert(pack(row, col), CellData::new(value));
                }
            }
        }
    }

    /// Set just the style handle, preserving value and hyperlink
    pub fn set_style(&mut self, row: u32, col: u16, style_index: Option<u32>) {
        match self.cells.get_mut(&pack(row, col)) {
            Some(cell) => {
                cell.style_index = style_index;
                if cell.is_empty() {
                    self.cells.remove(&pack(row, col));
                }
            }
            None => {
                if let Some(idx) = style_index {
                    self.cells
                        .insert(pack(row, col), CellData::with_style(CellValue::Empty, idx));
                }
            }
        }
    }

    /// Set just the hyperlink, preserving value and style
    pub fn set_hyperlink(&mut self, row: u32, col: u16, target: Option<String>) {
        match self.cells.get_mut(&pack(row, col)) {
            Some(cell) => {
                cell.hyperlink = target;
                if cell.is_empty() {
                    self.cells.remove(&pack(row, col));
                }
            }
            None => {
                if let Some(url) = target {
                    let mut data = CellData::empty();
                    data.hyperlink = Some(url);
                    self.cells.insert(pack(row, col), data);
                }
            }
        }
    }

    /// Remove a record, returning it if present
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        self.cells.remove(&pack(row, col))
    }

    /// Remove all records
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of populated cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if the storage holds no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounds of all populated cells
    ///
    /// Returns (min_row, min_col, max_row, max_col), or None when empty.
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        if self.cells.is_empty() {
            return None;
        }

        let mut min_row = u32::MAX;
        let mut min_col = u16::MAX;
        let mut max_row = 0u32;
        let mut max_col = 0u16;
        for &key in self.cells.keys() {
            let (row, col) = unpack(key);
            min_row = min_row.min(row);
            max_row = max_row.max(row);
            min_col = min_col.min(col);
            max_col = max_col.max(col);
        }

        Some((min_row, min_col, max_row, max_col))
    }

    /// Iterate over all populated cells in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter().map(|(&key, data)| {
            let (row, col) = unpack(key);
            (row, col, data)
        })
    }

    /// Iterate over all populated cells mutably, in arbitrary order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, u16, &mut CellData)> {
        self.cells.iter_mut().map(|(&key, data)| {
            let (row, col) = unpack(key);
            (row, col, data)
        })
    }

    /// Collect all populated cells sorted row-major
    ///
    /// For consumers that need deterministic order (a document packager
    /// writing sheet parts, for one).
    pub fn iter_sorted(&self) -> Vec<(u32, u16, &CellData)> {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_by_key(|&(row, col, _)| (row, col));
        cells
    }

    /// Iterate over the populated cells of one row, in arbitrary column order
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.iter()
            .filter(move |&(r, _, _)| r == row)
            .map(|(_, col, data)| (col, data))
    }

    /// Drain every record whose coordinates match a predicate
    ///
    /// Used by structural edits to pull out the block of cells that must
    /// relocate before reinserting them at shifted coordinates.
    pub fn take_matching<F>(&mut self, mut pred: F) -> Vec<(u32, u16, CellData)>
    where
        F: FnMut(u32, u16) -> bool,
    {
        let keys: Vec<u64> = self
            .cells
            .keys()
            .copied()
            .filter(|&key| {
                let (row, col) = unpack(key);
                pred(row, col)
            })
            .collect();

        keys.into_iter()
            .filter_map(|key| {
                let (row, col) = unpack(key);
                self.cells.remove(&key).map(|data| (row, col, data))
            })
            .collect()
    }

    /// Insert a record, returning the displaced record if the slot was
    /// already occupied
    ///
    /// Relocation helper for structural edits; a displaced record here
    /// means the shift planning was wrong.
    pub fn insert_vacant(&mut self, row: u32, col: u16, data: CellData) -> Option<CellData> {
        self.cells.insert(pack(row, col), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn basic_set_get() {
        let mut storage = CellStorage::new();

        storage.set(0, 0, CellData::new(CellValue::Number(42.0)));
        assert_eq!(storage.get(0, 0).unwrap().value.as_number(), Some(42.0));
        assert!(storage.get(1, 1).is_none());
    }

    #[test]
    fn empty_cells_are_not_stored() {
        let mut storage = CellStorage::new();

        storage.set(0, 0, CellData::new(CellValue::Number(42.0)));
        assert_eq!(storage.cell_count(), 1);

        storage.set(0, 0, CellData::empty());
        assert_eq!(storage.cell_count(), 0);
        assert!(storage.get(0, 0).is_none());

        storage.set_value(3, 3, CellValue::Empty);
        assert_eq!(storage.cell_count(), 0);
    }

    #[test]
    fn set_value_preserves_style_and_hyperlink() {
        let mut storage = CellStorage::new();

        storage.set(2, 2, CellData::with_style(CellValue::string("old"), 7));
        storage.set_hyperlink(2, 2, Some("https://example.com".into()));
        storage.set_value(2, 2, CellValue::string("new"));

        let cell = storage.get(2, 2).unwrap();
        assert_eq!(cell.value.as_string(), Some("new"));
        assert_eq!(cell.style_index, Some(7));
        assert_eq!(cell.hyperlink.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn styled_cell_survives_value_clear() {
        let mut storage = CellStorage::new();

        storage.set(1, 1, CellData::with_style(CellValue::string("x"), 3));
        storage.set_value(1, 1, CellValue::Empty);

        // Style handle keeps the record alive
        let cell = storage.get(1, 1).unwrap();
        assert!(cell.value.is_empty());
        assert_eq!(cell.style_index, Some(3));

        storage.set_style(1, 1, None);
        assert!(storage.get(1, 1).is_none());
    }

    #[test]
    fn used_bounds_track_extremes() {
        let mut storage = CellStorage::new();
        assert!(storage.used_bounds().is_none());

        storage.set(5, 3, CellData::new(CellValue::Number(1.0)));
        storage.set(10, 7, CellData::new(CellValue::Number(2.0)));
        storage.set(2, 1, CellData::new(CellValue::Number(3.0)));
        assert_eq!(storage.used_bounds(), Some((2, 1, 10, 7)));

        storage.remove(10, 7);
        assert_eq!(storage.used_bounds(), Some((2, 1, 5, 3)));
    }

    #[test]
    fn sorted_iteration_is_row_major() {
        let mut storage = CellStorage::new();
        storage.set(1, 0, CellData::new(CellValue::Number(3.0)));
        storage.set(0, 1, CellData::new(CellValue::Number(2.0)));
        storage.set(0, 0, CellData::new(CellValue::Number(1.0)));

        let order: Vec<(u32, u16)> = storage
            .iter_sorted()
            .into_iter()
            .map(|(r, c, _)| (r, c))
            .collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn take_matching_drains_selected_rows() {
        let mut storage = CellStorage::new();
        storage.set(1, 0, CellData::new(CellValue::Number(1.0)));
        storage.set(5, 0, CellData::new(CellValue::Number(2.0)));
        storage.set(9, 0, CellData::new(CellValue::Number(3.0)));

        let taken = storage.take_matching(|row, _| row >= 5);
        assert_eq!(taken.len(), 2);
        assert_eq!(storage.cell_count(), 1);
        assert!(storage.get(1, 0).is_some());
    }
}
