//! Formula reference rewriting for structural edits
//!
//! When rows or columns are inserted or deleted, every stored formula must
//! have its cell references updated so they keep pointing at the same
//! data. This is a text rewrite over a small reference grammar, not
//! formula parsing: tokens of the form `$?LETTERS$?DIGITS` found outside
//! double-quoted string literals are shifted, and everything else is left
//! byte-for-byte.
//!
//! References whose target falls inside a deleted span become the literal
//! `#REF!` token, matching what spreadsheet applications display.

use lazy_regex::regex;

use crate::cell::CellAddress;
use crate::{MAX_COLS, MAX_ROWS};

/// A structural edit, as seen by the reference grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    /// `count` rows inserted before 0-based row `start`
    InsertRows { start: u32, count: u32 },
    /// 0-based rows `start .. start + count` deleted
    DeleteRows { start: u32, count: u32 },
    /// `count` columns inserted before 0-based column `start`
    InsertColumns { start: u16, count: u16 },
    /// 0-based columns `start .. start + count` deleted
    DeleteColumns { start: u16, count: u16 },
}

/// Rewrite every cell reference in `formula` according to `op`
///
/// Returns the rewritten text; the result equals the input when no
/// reference was affected.
pub fn shift_references(formula: &str, op: ShiftOp) -> String {
    let mut out = String::with_capacity(formula.len());

    for (segment, quoted) in split_quoted(formula) {
        if quoted {
            out.push_str(segment);
        } else {
            rewrite_segment(segment, op, &mut out);
        }
    }

    out
}

/// Rewrite one unquoted segment into `out`
fn rewrite_segment(segment: &str, op: ShiftOp, out: &mut String) {
    // Candidate reference token: optional `$`, 1-3 letters, optional `$`,
    // 1-7 digits. Boundaries are checked separately since the regex
    // engine has no lookaround.
    let ref_token = regex!(r"(\$?)([A-Za-z]{1,3})(\$?)([0-9]{1,7})");

    let bytes = segment.as_bytes();
    let mut last_end = 0;

    for caps in ref_token.captures_iter(segment) {
        let Some(whole) = caps.get(0) else { continue };

        // Token must not be embedded in a longer identifier: no letter,
        // digit, `$` or `_` immediately before, no letter/digit/`_` after.
        // A trailing `(` marks a function call (LOG10, ATAN2), not a ref.
        let before_ok = whole.start() == 0
            || !matches!(bytes[whole.start() - 1], b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'$' | b'_');
        let after = bytes.get(whole.end());
        let after_ok = !matches!(
            after,
            Some(b'A'..=b'Z') | Some(b'a'..=b'z') | Some(b'0'..=b'9') | Some(b'_') | Some(b'(')
        );
        if !before_ok || !after_ok {
            continue;
        }

        let col_abs = &caps[1];
        let letters = &caps[2];
        let row_abs = &caps[3];
        let digits = &caps[4];

        let rewritten = shift_token(col_abs, letters, row_abs, digits, op);
        if let Some(token) = rewritten {
            out.push_str(&segment[last_end..whole.start()]);
            out.push_str(&token);
            last_end = whole.end();
        }
    }

    out.push_str(&segment[last_end..]);
}

/// Shift a single reference token, or None to leave it untouched
fn shift_token(
    col_abs: &str,
    letters: &str,
    row_abs: &str,
    digits: &str,
    op: ShiftOp,
) -> Option<String> {
    // Tokens that do not denote an in-range cell were never references
    let col = CellAddress::letters_to_column(letters).ok()?;
    let display_row: u32 = digits.parse().ok()?;
    if display_row == 0 || display_row > MAX_ROWS {
        return None;
    }
    let row = display_row - 1;

    match op {
        ShiftOp::InsertRows { start, count } => {
            if row < start {
                return None;
            }
            let new_row = row.checked_add(count).filter(|&r| r < MAX_ROWS);
            Some(match new_row {
                Some(r) => format!("{}{}{}{}", col_abs, letters, row_abs, r + 1),
                None => "#REF!".to_string(),
            })
        }
        ShiftOp::DeleteRows { start, count } => {
            if row < start {
                None
            } else if row < start.saturating_add(count) {
                Some("#REF!".to_string())
            } else {
                Some(format!(
                    "{}{}{}{}",
                    col_abs,
                    letters,
                    row_abs,
                    row - count + 1
                ))
            }
        }
        ShiftOp::InsertColumns { start, count } => {
            if col < start {
                return None;
            }
            let new_col = (col as u32).checked_add(count as u32).filter(|&c| c < MAX_COLS as u32);
            Some(match new_col {
                Some(c) => format!(
                    "{}{}{}{}",
                    col_abs,
                    CellAddress::column_to_letters(c as u16),
                    row_abs,
                    digits
                ),
                None => "#REF!".to_string(),
            })
        }
        ShiftOp::DeleteColumns { start, count } => {
            if col < start {
                None
            } else if col < start.saturating_add(count) {
                Some("#REF!".to_string())
            } else {
                Some(format!(
                    "{}{}{}{}",
                    col_abs,
                    CellAddress::column_to_letters(col - count),
                    row_abs,
                    digits
                ))
            }
        }
    }
}

/// Split text into (segment, is_quoted) pieces on double-quote boundaries
///
/// The quote characters themselves stay with the quoted segment, so the
/// concatenation of all segments reproduces the input exactly. Doubled
/// quotes (the spreadsheet escape for a literal `"`) fall out naturally as
/// an empty unquoted segment between two quoted ones.
fn split_quoted(text: &str) -> Vec<(&str, bool)> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_string = false;

    for (idx, ch) in text.char_indices() {
        if ch == '"' {
            if in_string {
                // Include the closing quote
                segments.push((&text[start..idx + 1], true));
                start = idx + 1;
            } else if idx > start {
                segments.push((&text[start..idx], false));
                start = idx;
            }
            in_string = !in_string;
        }
    }

    if start < text.len() {
        segments.push((&text[start..], in_string));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_rows_shifts_references_at_or_below() {
        // 3 rows inserted before display row 6 (0-based start 5)
        let op = ShiftOp::InsertRows { start: 5, count: 3 };
        assert_eq!(shift_references("=SUM(A5:A10)+B2", op), "=SUM(A5:A13)+B2");
        assert_eq!(shift_references("=A6", op), "=A9");
        assert_eq!(shift_references("=A5", op), "=A5");
    }

    #[test]
    fn delete_rows_shifts_and_refs_out_deleted() {
        // Delete display rows 3-4 (0-based 2..4)
        let op = ShiftOp::DeleteRows { start: 2, count: 2 };
        assert_eq!(shift_references("=A2+A3+A5", op), "=A2+#REF!+A3");
        assert_eq!(shift_references("=SUM(B5:B10)", op), "=SUM(B3:B8)");
    }

    #[test]
    fn insert_columns_rewrites_letters() {
        // 2 columns inserted before column B
        let op = ShiftOp::InsertColumns { start: 1, count: 2 };
        assert_eq!(shift_references("=A1+B1+Z9", op), "=A1+D1+AB9");
    }

    #[test]
    fn delete_columns_rewrites_letters() {
        let op = ShiftOp::DeleteColumns { start: 1, count: 1 };
        assert_eq!(shift_references("=A1+B1+C1", op), "=A1+#REF!+B1");
    }

    #[test]
    fn absolute_markers_are_preserved_and_shifted() {
        let op = ShiftOp::InsertRows { start: 0, count: 1 };
        assert_eq!(shift_references("=$A$1+A$2+$A3", op), "=$A$2+A$3+$A4");
    }

    #[test]
    fn string_literals_are_untouched() {
        let op = ShiftOp::InsertRows { start: 0, count: 5 };
        assert_eq!(
            shift_references("=IF(A1>0,\"A1 is fine\",B2)", op),
            "=IF(A6>0,\"A1 is fine\",B7)"
        );
    }

    #[test]
    fn identifiers_and_function_names_are_not_references() {
        let op = ShiftOp::InsertRows { start: 0, count: 1 };
        // LOG10 is a function call, TAB12X is an identifier tail
        assert_eq!(shift_references("=LOG10(A1)", op), "=LOG10(A2)");
        assert_eq!(shift_references("=MY_A1_NAME", op), "=MY_A1_NAME");
    }

    #[test]
    fn case_is_preserved_for_row_shifts() {
        let op = ShiftOp::InsertRows { start: 0, count: 1 };
        assert_eq!(shift_references("=a1+b2", op), "=a2+b3");
    }

    #[test]
    fn out_of_range_tokens_are_left_alone() {
        let op = ShiftOp::InsertRows { start: 0, count: 1 };
        // XFE is beyond the last column; not a cell reference
        assert_eq!(shift_references("=XFE1", op), "=XFE1");
    }

    #[test]
    fn overflow_past_grid_becomes_ref_error() {
        let op = ShiftOp::InsertRows {
            start: 0,
            count: crate::MAX_ROWS - 1,
        };
        assert_eq!(shift_references("=A1048576", op), "=#REF!");
    }

    #[test]
    fn maximal_delete_counts_do_not_wrap() {
        // "Delete everything from here down" spans saturate instead of
        // overflowing past the end of u32/u16.
        let op = ShiftOp::DeleteRows {
            start: 1,
            count: u32::MAX,
        };
        assert_eq!(shift_references("=A1+A5", op), "=A1+#REF!");

        let op = ShiftOp::DeleteColumns {
            start: 1,
            count: u16::MAX,
        };
        assert_eq!(shift_references("=A1+E1", op), "=A1+#REF!");
    }

    #[test]
    fn untouched_formula_round_trips_exactly() {
        let op = ShiftOp::InsertRows { start: 100, count: 5 };
        let text = "=SUM(A1:A10) & \" rows\" + log10(2)";
        assert_eq!(shift_references(text, op), text);
    }
}
