//! End-to-end tests for structural edits across cells, merges, and formulas

use sheetgrid::{CellRange, CellValue, Error, Worksheet};

/// Build a small ledger sheet used by several tests
fn ledger() -> Worksheet {
    let mut ws = Worksheet::new("Ledger");
    ws.set_cell_value("A1", "Item").unwrap();
    ws.set_cell_value("B1", "Amount").unwrap();
    for row in 1..6u32 {
        ws.set_cell_value_at(row, 0, format!("item {}", row)).unwrap();
        ws.set_cell_value_at(row, 1, row as f64 * 10.0).unwrap();
    }
    ws.set_cell_formula("B8", "=SUM(B2:B6)").unwrap();
    ws
}

/// Test that inserting rows moves data, merges, and formula references together
#[test]
fn test_insert_rows_moves_everything_together() {
    let mut ws = ledger();
    ws.merge_cells("A8", "A10").unwrap();

    // Insert two rows above the data block (before display row 2)
    ws.insert_rows(1, 2).unwrap();

    // Header stays, data slid down
    assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("Item"));
    assert!(ws.get_value("A2").unwrap().is_empty());
    assert_eq!(ws.get_value("A4").unwrap().as_string(), Some("item 1"));
    assert_eq!(ws.get_value_at(7, 1).as_number(), Some(50.0));

    // The formula follows its range and its own cell
    assert_eq!(ws.get_formula_at(9, 1), Some("=SUM(B4:B8)"));
    assert!(ws.get_formula_at(7, 1).is_none());

    // The merge shifted whole
    assert_eq!(ws.merged_regions()[0].to_a1_string(), "A10:A12");
}

/// Test that deleting data rows shrinks the summed range
#[test]
fn test_delete_rows_shrinks_referenced_range() {
    let mut ws = ledger();

    // Delete display rows 3-4 (item 2 and item 3)
    ws.delete_rows(2, 2).unwrap();

    assert_eq!(ws.get_value("A2").unwrap().as_string(), Some("item 1"));
    assert_eq!(ws.get_value("A3").unwrap().as_string(), Some("item 4"));
    assert_eq!(ws.get_formula_at(5, 1), Some("=SUM(B2:B4)"));
    assert_eq!(ws.cell_count(), 9);
}

/// Test that deleting the rows a formula points into yields #REF!
#[test]
fn test_delete_rows_breaks_direct_references() {
    let mut ws = Worksheet::new("Refs");
    ws.set_cell_value("A5", 99.0).unwrap();
    ws.set_cell_formula("C1", "=A5*2").unwrap();

    ws.delete_rows(4, 1).unwrap();

    assert_eq!(ws.get_formula_at(0, 2), Some("=#REF!*2"));
    assert!(ws.get_value_at(4, 0).is_empty());
}

/// Test the column mirror of insertion: letters shift, data relocates
#[test]
fn test_insert_columns_shifts_letters() {
    let mut ws = Worksheet::new("Cols");
    ws.set_cell_value("A1", "key").unwrap();
    ws.set_cell_value("B1", "value").unwrap();
    ws.set_cell_formula("D1", "=B1").unwrap();

    ws.insert_columns(1, 1).unwrap();

    assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("key"));
    assert!(ws.get_value("B1").unwrap().is_empty());
    assert_eq!(ws.get_value("C1").unwrap().as_string(), Some("value"));
    assert_eq!(ws.get_formula_at(0, 4), Some("=C1"));
}

/// Test that a delete crossing a merge boundary fails without side effects
#[test]
fn test_partial_merge_overlap_aborts_delete() {
    let mut ws = ledger();
    ws.merge_cells("A2", "A5").unwrap();

    let err = ws.delete_rows(3, 5).unwrap_err();
    assert!(matches!(err, Error::StructuralEditConflict(_)));

    // Nothing moved: data, merge, and formula are all as built
    assert_eq!(ws.get_value("A2").unwrap().as_string(), Some("item 1"));
    assert_eq!(ws.merged_regions()[0].to_a1_string(), "A2:A5");
    assert_eq!(ws.get_formula_at(7, 1), Some("=SUM(B2:B6)"));
}

/// Test that a delete spanning a whole merge removes the region with its rows
#[test]
fn test_delete_swallows_contained_merge() {
    let mut ws = Worksheet::new("Banner");
    ws.merge_cells("A3", "C4").unwrap();
    ws.set_cell_value("A3", "banner").unwrap();
    ws.set_cell_value("A6", "below").unwrap();

    ws.delete_rows(2, 2).unwrap();

    assert!(ws.merged_regions().is_empty());
    assert_eq!(ws.get_value("A4").unwrap().as_string(), Some("below"));
    // The banner text went down with its rows
    assert_eq!(ws.cell_count(), 1);
}

/// Test merge shadowing through the range view after structural edits
#[test]
fn test_shadowing_survives_row_insertion() {
    let mut ws = Worksheet::new("Merged");
    ws.set_cell_value("A5", "title").unwrap();
    ws.merge_cells("A5", "C5").unwrap();

    ws.insert_rows(0, 10).unwrap();

    // The region moved to row 15; its top-left still reads, the rest not
    assert_eq!(ws.merged_regions()[0].to_a1_string(), "A15:C15");
    assert_eq!(ws.get_value("A15").unwrap().as_string(), Some("title"));
    assert!(ws.set_cell_value("B15", "x").is_err());

    let range = ws.range("A15", "C15").unwrap();
    let populated: Vec<String> = range
        .cells()
        .filter(|c| !c.is_empty())
        .map(|c| c.address.to_a1_string())
        .collect();
    assert_eq!(populated, vec!["A15".to_string()]);
}

/// Test a sequence of edits: each rewrite builds on the previous text
#[test]
fn test_chained_edits_compose() {
    let mut ws = Worksheet::new("Chain");
    ws.set_cell_formula("A1", "=SUM(B2:B5)").unwrap();

    ws.insert_rows(1, 1).unwrap(); // B2:B5 -> B3:B6
    ws.insert_columns(0, 1).unwrap(); // B3:B6 -> C3:C6, A1 -> B1
    ws.delete_rows(2, 1).unwrap(); // C3:C6 -> C3:C5 (display row 3 was in range)

    assert_eq!(ws.get_formula_at(0, 1), Some("=SUM(#REF!:C5)"));
}

/// Test deleting with a maximal count: the whole tail goes, nothing panics
#[test]
fn test_delete_whole_tail_with_maximal_count() {
    let mut ws = Worksheet::new("Tail");
    ws.set_cell_formula("A1", "=A5").unwrap();
    ws.set_cell_value("A5", 7.0).unwrap();

    ws.delete_rows(1, u32::MAX).unwrap();

    assert_eq!(ws.get_formula_at(0, 0), Some("=#REF!"));
    assert_eq!(ws.cell_count(), 1);

    let mut ws = Worksheet::new("TailCols");
    ws.set_cell_formula("A1", "=E1").unwrap();
    ws.set_cell_value("E1", 7.0).unwrap();

    ws.delete_columns(1, u16::MAX).unwrap();

    assert_eq!(ws.get_formula_at(0, 0), Some("=#REF!"));
    assert_eq!(ws.cell_count(), 1);
}

/// Test bulk fill then structural edit on a sheet loaded in one pass
#[test]
fn test_load_then_edit() {
    let mut ws = Worksheet::new("Loaded");

    let cells = (0..5u32)
        .map(|row| {
            (
                row,
                0u16,
                sheetgrid::CellData::new(CellValue::Number(row as f64)),
            )
        })
        .collect::<Vec<_>>();
    let regions = vec![CellRange::parse("C1:D2").unwrap()];
    ws.load(cells, regions).unwrap();

    assert_eq!(ws.cell_count(), 5);
    ws.insert_rows(2, 1).unwrap();

    assert_eq!(ws.get_value_at(1, 0).as_number(), Some(1.0));
    assert!(ws.get_value_at(2, 0).is_empty());
    assert_eq!(ws.get_value_at(3, 0).as_number(), Some(2.0));
    assert_eq!(ws.merged_regions()[0].to_a1_string(), "C1:D2");
}
