//! FILENAME: core/parser/src/tests.rs
//! PURPOSE: Cross-module integration tests for the parser crate.
//! CONTEXT: Unit tests for a single module live next to that module
//! (lexer.rs, parser.rs, render.rs, formula.rs); this file covers behavior
//! that spans the whole lex-parse-render-execute pipeline.

use crate::{parse_formula, ArithmeticErrorKind, CellCoord};

fn lookup_table(values: &'static [(CellCoord, f64)]) -> impl Fn(CellCoord) -> Result<f64, ArithmeticErrorKind> {
    move |coord| {
        values
            .iter()
            .find(|(c, _)| *c == coord)
            .map(|(_, v)| *v)
            .ok_or(ArithmeticErrorKind::Ref)
    }
}

#[test]
fn end_to_end_arithmetic_with_cell_references() {
    let formula = parse_formula("A1*2+B1").unwrap();
    let lookup = lookup_table(&[((0, 0), 3.0), ((0, 1), 4.0)]);
    assert_eq!(formula.execute(&lookup), Ok(10.0));
}

#[test]
fn end_to_end_nested_function_calls() {
    let formula = parse_formula("IF(SUM(A1:A3)>5, MAX(A1:A3), MIN(A1:A3))").unwrap();
    let lookup = lookup_table(&[((0, 0), 1.0), ((1, 0), 2.0), ((2, 0), 3.0)]);
    assert_eq!(formula.execute(&lookup), Ok(3.0));
}

#[test]
fn end_to_end_missing_reference_propagates_ref_error() {
    let formula = parse_formula("A1+A2").unwrap();
    let lookup = lookup_table(&[((0, 0), 1.0)]);
    assert_eq!(formula.execute(&lookup), Err(ArithmeticErrorKind::Ref));
}

#[test]
fn canonical_expression_is_stable_across_reparse() {
    let first = parse_formula("SUM(A1:A3)*(1+2)").unwrap();
    let canonical = first.canonical_expression();
    let second = parse_formula(&canonical).unwrap();
    assert_eq!(canonical, second.canonical_expression());
}

#[test]
fn referenced_cells_cover_ranges_and_scalars_together() {
    let formula = parse_formula("SUM(A1:A2)+B3").unwrap();
    let refs = formula.referenced_cells();
    assert!(refs.contains(&(0, 0)));
    assert!(refs.contains(&(1, 0)));
    assert!(refs.contains(&(2, 1)));
    assert_eq!(refs.len(), 3);
}

#[test]
fn malformed_formula_is_a_parse_error_not_a_panic() {
    assert!(parse_formula("A1 +").is_err());
    assert!(parse_formula("SUM(A1:A2").is_err());
    assert!(parse_formula("1 2 3").is_err());
}
