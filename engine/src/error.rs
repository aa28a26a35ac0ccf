//! FILENAME: core/engine/src/error.rs
//! PURPOSE: The engine's structural error taxonomy.
//! CONTEXT: Mirrors the `persistence`/`calcula-format` crates' `thiserror`
//! convention. Arithmetic failures (Ref/Value/Arithmetic) are not part of
//! this taxonomy: they are embedded as first-class `CellValue::Error`
//! results rather than raised, so that `Cell::value()` stays total.

use crate::position::Position;
use thiserror::Error;

/// Errors raised by public `Sheet` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("position is outside the valid range")]
    InvalidPosition,

    #[error("could not parse formula: {0}")]
    FormulaParse(String),

    #[error("circular dependency introduced through {cycle:?}")]
    CircularDependency { cycle: Vec<Position> },
}
