//! FILENAME: core/engine/src/cell.rs
//! PURPOSE: Defines the fundamental data structures for a single spreadsheet cell.
//! CONTEXT: A cell is a tagged variant over {Empty, Literal, Formula}; the
//! Formula branch owns a lazily-populated cache. It is designed to be
//! lightweight as many of these instances may exist in a sparse sheet.

use std::cell::RefCell;
use std::collections::HashSet;

use parser::{parse_formula, Formula};
use serde::{Deserialize, Serialize};

use crate::position::Position;

/// The three kinds of arithmetic failure a formula evaluation can raise.
/// A local mirror of `parser::ArithmeticErrorKind`: kept as its own type so
/// `CellValue` can derive `Serialize`/`Deserialize` without requiring the
/// dependency-free `parser` crate to carry a serde dependency of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticErrorKind {
    Ref,
    Value,
    Arithmetic,
}

impl From<parser::ArithmeticErrorKind> for ArithmeticErrorKind {
    fn from(kind: parser::ArithmeticErrorKind) -> Self {
        match kind {
            parser::ArithmeticErrorKind::Ref => ArithmeticErrorKind::Ref,
            parser::ArithmeticErrorKind::Value => ArithmeticErrorKind::Value,
            parser::ArithmeticErrorKind::Arithmetic => ArithmeticErrorKind::Arithmetic,
        }
    }
}

impl From<ArithmeticErrorKind> for parser::ArithmeticErrorKind {
    fn from(kind: ArithmeticErrorKind) -> Self {
        match kind {
            ArithmeticErrorKind::Ref => parser::ArithmeticErrorKind::Ref,
            ArithmeticErrorKind::Value => parser::ArithmeticErrorKind::Value,
            ArithmeticErrorKind::Arithmetic => parser::ArithmeticErrorKind::Arithmetic,
        }
    }
}

impl std::fmt::Display for ArithmeticErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#ARITHM!")
    }
}

/// The calculated result a cell currently holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(ArithmeticErrorKind),
}

/// What a cell stores, independent of its calculated value.
#[derive(Debug, Clone)]
pub enum CellContent {
    /// Created on demand; carries no text and no referenced cells.
    Empty,
    /// Plain text. A leading apostrophe is a quoting marker stripped from
    /// the coerced value but kept in the stored text.
    Literal(String),
    /// A parsed formula plus its lazily-populated evaluation cache.
    Formula {
        formula: Formula,
        cache: RefCell<Option<CellValue>>,
    },
}

/// The atomic unit of the spreadsheet.
#[derive(Debug, Clone)]
pub struct Cell {
    pub content: CellContent,
    /// Positions of cells whose formulas directly reference this one.
    pub dependents: HashSet<Position>,
}

impl Cell {
    /// Constructs a cell with `Empty` content and no dependents.
    pub fn new_empty() -> Self {
        Cell {
            content: CellContent::Empty,
            dependents: HashSet::new(),
        }
    }

    /// Replaces this cell's content per the dispatch rule in the data model:
    /// `""` becomes `Empty`, a leading `=` (with more than one character)
    /// is parsed as a formula, anything else is a `Literal`.
    ///
    /// On formula-parse failure the cell is left unchanged and the parse
    /// error is returned; `Sheet::set_cell` is responsible for not swapping
    /// staged content from a failed parse.
    pub fn set(&mut self, text: &str) -> Result<Vec<Position>, parser::ParseError> {
        if text.is_empty() {
            self.content = CellContent::Empty;
            return Ok(Vec::new());
        }

        if text.starts_with('=') && text.len() > 1 {
            let formula = parse_formula(&text[1..])?;
            let referenced = formula
                .referenced_cells()
                .iter()
                .map(|&(row, col)| Position::new(row, col))
                .collect();
            self.content = CellContent::Formula {
                formula,
                cache: RefCell::new(None),
            };
            return Ok(referenced);
        }

        self.content = CellContent::Literal(text.to_string());
        Ok(Vec::new())
    }

    /// Computes (or returns the cached) value of this cell, evaluating a
    /// formula's references against `sheet` on a cache miss.
    pub fn value(&self, sheet: &crate::sheet::Sheet) -> CellValue {
        match &self.content {
            CellContent::Empty => CellValue::Text(String::new()),
            CellContent::Literal(s) => CellValue::Text(coerced_text(s)),
            CellContent::Formula { formula, cache } => {
                if let Some(v) = cache.borrow().as_ref() {
                    return v.clone();
                }
                let result = match formula.execute(&|c| sheet.lookup_number(c)) {
                    Ok(n) => CellValue::Number(n),
                    Err(e) => CellValue::Error(e.into()),
                };
                *cache.borrow_mut() = Some(result.clone());
                result
            }
        }
    }

    /// Renders this cell's text per the CellContent rules in the data model.
    pub fn text(&self) -> String {
        match &self.content {
            CellContent::Empty => String::new(),
            CellContent::Literal(s) => s.clone(),
            CellContent::Formula { formula, .. } => format!("={}", formula.canonical_expression()),
        }
    }

    /// Positions referenced by this cell's formula, in source order with
    /// duplicates removed (first occurrence kept); empty for non-formula cells.
    pub fn referenced_cells(&self) -> Vec<Position> {
        match &self.content {
            CellContent::Formula { formula, .. } => formula
                .referenced_cells()
                .iter()
                .map(|&(row, col)| Position::new(row, col))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this cell's content is the `Empty` variant — used by `Sheet`
    /// to decide which slots count toward the printable-region bound.
    pub fn is_empty(&self) -> bool {
        matches!(self.content, CellContent::Empty)
    }

    pub fn add_dependent(&mut self, other: Position) {
        self.dependents.insert(other);
    }

    pub fn remove_dependent(&mut self, other: Position) {
        self.dependents.remove(&other);
    }

    /// Clears this cell's own evaluation cache. The recursive walk over
    /// `dependents` is owned by `Sheet`, since only it can resolve a
    /// dependent position back to a `Cell`.
    pub fn invalidate_cache(&mut self) {
        if let CellContent::Formula { cache, .. } = &mut self.content {
            *cache.borrow_mut() = None;
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new_empty()
    }
}

/// Strips a leading quoting apostrophe, if present, from literal text to
/// obtain its coerced value. A bare apostrophe quotes an otherwise-empty
/// string unchanged.
fn coerced_text(s: &str) -> String {
    match s.strip_prefix('\'') {
        Some(rest) => rest.to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::sheet::Sheet;

    #[test]
    fn empty_text_clears_to_empty_content() {
        let sheet = Sheet::new();
        let mut cell = Cell::new_empty();
        cell.set("hello").unwrap();
        cell.set("").unwrap();
        assert_eq!(cell.value(&sheet), CellValue::Text(String::new()));
        assert_eq!(cell.text(), "");
        assert!(cell.referenced_cells().is_empty());
    }

    #[test]
    fn apostrophe_literal_strips_marker_from_value_only() {
        let sheet = Sheet::new();
        let mut cell = Cell::new_empty();
        cell.set("'123").unwrap();
        assert_eq!(cell.value(&sheet), CellValue::Text("123".to_string()));
        assert_eq!(cell.text(), "'123");
    }

    #[test]
    fn formula_caches_after_first_evaluation() {
        let sheet = Sheet::new();
        let mut cell = Cell::new_empty();
        cell.set("=1+2").unwrap();
        assert_eq!(cell.value(&sheet), CellValue::Number(3.0));
        // second call should hit the cache path; same result either way
        assert_eq!(cell.value(&sheet), CellValue::Number(3.0));
    }

    #[test]
    fn formula_parse_failure_leaves_cell_unchanged() {
        let mut cell = Cell::new_empty();
        cell.set("hello").unwrap();
        assert!(cell.set("=1+").is_err());
        assert_eq!(cell.text(), "hello");
    }

    #[test]
    fn referenced_cells_reports_positions_from_formula() {
        let mut cell = Cell::new_empty();
        cell.set("=A1+B2").unwrap();
        assert_eq!(
            cell.referenced_cells(),
            vec![Position::new(0, 0), Position::new(1, 1)]
        );
    }

    #[test]
    fn invalidate_cache_forces_reevaluation() {
        let sheet = Sheet::new();
        let mut cell = Cell::new_empty();
        cell.set("=1+2").unwrap();
        cell.value(&sheet);
        cell.invalidate_cache();
        if let CellContent::Formula { cache, .. } = &cell.content {
            assert!(cache.borrow().is_none());
        } else {
            panic!("expected formula content");
        }
    }
}
