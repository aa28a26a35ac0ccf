//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//! The formula parser/AST lives in the sibling `parser` crate and is
//! treated as an external collaborator (see `error::SheetError::FormulaParse`
//! and `cell::Cell::set`).

pub mod cell;
pub mod error;
pub mod position;
pub mod sheet;

// Re-export commonly used types at the crate root.
pub use cell::{ArithmeticErrorKind, Cell, CellContent, CellValue};
pub use error::SheetError;
pub use position::{col_to_index, index_to_col, Position, Size, MAX_COLS, MAX_ROWS};
pub use sheet::Sheet;

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn it_creates_cells() {
        let cell = Cell::new_empty();
        assert!(cell.is_empty());
    }

    #[test]
    fn it_stores_and_retrieves_cells() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "Hello").unwrap();
        let retrieved = sheet.get_cell(pos(0, 0)).unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().text(), "Hello");
    }

    #[test]
    fn integration_test_dependency_workflow() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "10").unwrap(); // A1
        sheet.set_cell(pos(0, 1), "20").unwrap(); // B1
        sheet.set_cell(pos(0, 2), "=A1+B1").unwrap(); // C1

        let a1 = sheet.get_cell(pos(0, 0)).unwrap().unwrap();
        assert!(a1.dependents.contains(&pos(0, 2)));
    }

    #[test]
    fn integration_test_cycle_prevention() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "=B1").unwrap(); // A1 depends on B1
        let err = sheet.set_cell(pos(1, 0), "=A1").unwrap_err(); // B1 -> A1 would cycle
        assert!(matches!(err, SheetError::CircularDependency { .. }));
    }

    #[test]
    fn integration_test_full_evaluation_workflow() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "10").unwrap(); // A1
        sheet.set_cell(pos(0, 1), "20").unwrap(); // B1
        sheet.set_cell(pos(0, 2), "=A1+B1").unwrap(); // C1

        let c1 = sheet.get_cell(pos(0, 2)).unwrap().unwrap();
        assert_eq!(c1.value(&sheet), CellValue::Number(30.0));
    }

    #[test]
    fn integration_test_conditional_evaluation() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "100").unwrap(); // A1
        sheet
            .set_cell(pos(0, 1), "=IF(A1>50, A1*2, A1/2)")
            .unwrap(); // B1

        let b1 = sheet.get_cell(pos(0, 1)).unwrap().unwrap();
        assert_eq!(b1.value(&sheet), CellValue::Number(200.0)); // 100 > 50, so 100 * 2
    }

    #[test]
    fn printable_region_tracks_explicitly_set_cells_only() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(1, 1), "=C3").unwrap(); // B2 references C3 but doesn't set it
        assert_eq!(sheet.printable_size(), Size::new(2, 2));
    }

    #[test]
    fn serde_roundtrip_of_cell_value() {
        let value = CellValue::Number(42.5);
        let json = serde_json::to_string(&value).unwrap();
        let back: CellValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);

        let err_value = CellValue::Error(ArithmeticErrorKind::Arithmetic);
        let json = serde_json::to_string(&err_value).unwrap();
        let back: CellValue = serde_json::from_str(&json).unwrap();
        assert_eq!(err_value, back);
    }

    #[test]
    fn print_values_renders_tab_separated_grid() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos(0, 0), "1").unwrap();
        sheet.set_cell(pos(0, 1), "2").unwrap();
        sheet.set_cell(pos(1, 0), "3").unwrap();

        let mut out = String::new();
        sheet.print_values(&mut out).unwrap();
        assert_eq!(out, "1\t2\n3\t\n");
    }
}
