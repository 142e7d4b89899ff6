//! Cell address and range types
//!
//! Addresses use A1 notation: one or more column letters followed by a
//! 1-based row number, each part optionally prefixed with `$` to mark it
//! absolute. Internally both axes are 0-based.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A single cell coordinate (e.g., "A1", "$B$2")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Create a new cell address with explicit absolute markers
    pub fn with_absolute(row: u32, col: u16, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// Parse an address from A1-style notation
    ///
    /// Letters are case-insensitive; the row part must be a positive
    /// integer (there is no row 0 in display form).
    ///
    /// # Examples
    /// ```
    /// use sheetgrid::CellAddress;
    ///
    /// let addr = CellAddress::parse("B7").unwrap();
    /// assert_eq!((addr.row, addr.col), (6, 1));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        if text.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = text.as_bytes();
        let mut pos = 0;

        let col_absolute = bytes.first() == Some(&b'$');
        if col_absolute {
            pos += 1;
        }

        let letters_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == letters_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                text
            )));
        }
        let col = Self::letters_to_column(&text[letters_start..pos])?;

        let row_absolute = bytes.get(pos) == Some(&b'$');
        if row_absolute {
            pos += 1;
        }

        let digits = &text[pos..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!(
                "missing or malformed row number in '{}'",
                text
            )));
        }
        let display_row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("row number too large in '{}'", text)))?;
        if display_row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                text
            )));
        }

        let row = display_row - 1;
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }

        Ok(Self {
            row,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// Convert a column index to letters (0 = A, 25 = Z, 26 = AA, ...)
    ///
    /// Spreadsheet columns are a base-26 system with no zero digit, so the
    /// conversion decrements before each division.
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = [0u8; 3];
        let mut len = 0;
        let mut n = col as u32 + 1;
        while n > 0 {
            n -= 1;
            letters[len] = b'A' + (n % 26) as u8;
            len += 1;
            n /= 26;
        }
        letters[..len].reverse();
        // Only ASCII uppercase letters were written
        String::from_utf8_lossy(&letters[..len]).into_owned()
    }

    /// Convert column letters to an index (A = 0, Z = 25, AA = 26, ...)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > MAX_COLS as u32 {
                return Err(Error::InvalidAddress(format!(
                    "column '{}' is beyond {}",
                    letters,
                    Self::column_to_letters(MAX_COLS - 1)
                )));
            }
        }

        Ok((col - 1) as u16)
    }

    /// Format as an A1-style string
    pub fn to_a1_string(&self) -> String {
        let mut out = String::new();
        if self.col_absolute {
            out.push('$');
        }
        out.push_str(&Self::column_to_letters(self.col));
        if self.row_absolute {
            out.push('$');
        }
        out.push_str(&(self.row + 1).to_string());
        out
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular block of cells (e.g., "A1:B10")
///
/// Always normalized: `start` is the top-left corner and `end` the
/// bottom-right, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Top-left address
    pub start: CellAddress,
    /// Bottom-right address
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new range, normalizing corner order on both axes
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        let (top, bottom) = if a.row <= b.row {
            (a.row, b.row)
        } else {
            (b.row, a.row)
        };
        let (left, right) = if a.col <= b.col {
            (a.col, b.col)
        } else {
            (b.col, a.col)
        };

        Self {
            start: CellAddress::with_absolute(top, left, a.row_absolute, a.col_absolute),
            end: CellAddress::with_absolute(bottom, right, b.row_absolute, b.col_absolute),
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse a range from "A1:B10" notation; a bare address is a 1x1 range
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        match text.find(':') {
            Some(colon) => {
                let start = CellAddress::parse(&text[..colon])
                    .map_err(|_| Error::InvalidRange(text.to_string()))?;
                let end = CellAddress::parse(&text[colon + 1..])
                    .map_err(|_| Error::InvalidRange(text.to_string()))?;
                Ok(Self::new(start, end))
            }
            None => Ok(Self::single(CellAddress::parse(text)?)),
        }
    }

    /// Check if an address lies within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Check whether two ranges share at least one cell
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Iterate over all addresses in the range, row by row
    pub fn cells(&self) -> CellRangeIter {
        CellRangeIter {
            range: *self,
            next_row: self.start.row,
            next_col: self.start.col,
            done: false,
        }
    }

    /// Format as an "A1:B10" string (single cells format as "A1")
    pub fn to_a1_string(&self) -> String {
        if self.start.row == self.end.row && self.start.col == self.end.col {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Row-major iterator over the addresses of a [`CellRange`]
pub struct CellRangeIter {
    range: CellRange,
    next_row: u32,
    next_col: u16,
    done: bool,
}

impl Iterator for CellRangeIter {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let addr = CellAddress::new(self.next_row, self.next_col);

        if self.next_col < self.range.end.col {
            self.next_col += 1;
        } else if self.next_row < self.range.end.row {
            self.next_col = self.range.start.col;
            self.next_row += 1;
        } else {
            self.done = true;
        }

        Some(addr)
    }
}
