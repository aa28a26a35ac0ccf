//! FILENAME: core/engine/src/sheet.rs
//! PURPOSE: Owns cell storage, enforces cyclic-dependency rejection on
//! edits, maintains the printable region, and orchestrates dependency-edge
//! maintenance and cache invalidation.
//! CONTEXT: This is the core of the engine; most of the budget documented
//! in SPEC_FULL.md §2 lives here.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::cell::{Cell, CellValue};
use crate::error::SheetError;
use crate::position::{Position, Size};

/// An in-memory spreadsheet: a sparse map from position to cell, plus the
/// tight bounding rectangle of non-empty slots.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    cells: HashMap<Position, Cell>,
    printable: Size,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet {
            cells: HashMap::new(),
            printable: Size::EMPTY,
        }
    }

    /// Returns the tightest extent covering all non-empty slots, or `(0,0)`.
    pub fn printable_size(&self) -> Size {
        self.printable
    }

    /// Validates `pos`, then returns the slot if `pos` lies within
    /// `printable` (the slot itself may still be absent for a never-written
    /// cell within the printable rectangle).
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        if pos.row >= self.printable.rows || pos.col >= self.printable.cols {
            return Ok(None);
        }
        Ok(self.cells.get(&pos))
    }

    /// Returns the numeric value of a cell for formula evaluation purposes,
    /// per the lookup contract in SPEC_FULL.md §4.3: absent/empty cells
    /// contribute `0.0`; text coerces via strict decimal parse; errors
    /// propagate; out-of-range positions raise `Ref`.
    pub(crate) fn lookup_number(&self, coord: (u32, u32)) -> Result<f64, parser::ArithmeticErrorKind> {
        let pos = Position::new(coord.0, coord.1);
        if !pos.is_valid() {
            return Err(parser::ArithmeticErrorKind::Ref);
        }
        let Some(cell) = self.cells.get(&pos) else {
            return Ok(0.0);
        };
        match cell.value(self) {
            CellValue::Number(x) => Ok(x),
            CellValue::Error(e) => Err(e.into()),
            CellValue::Text(s) => {
                if s.is_empty() {
                    Ok(0.0)
                } else {
                    s.parse::<f64>().map_err(|_| parser::ArithmeticErrorKind::Value)
                }
            }
        }
    }

    /// Sets the contents of `pos` to `text`, parsing formulas, rewiring
    /// dependency edges, and rejecting edits that would introduce a cycle.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }

        // Stage the parse against a scratch cell first: a malformed formula
        // must leave no trace (no materialized carrier, no printable growth)
        // on a slot that didn't already exist.
        let new_referenced = Cell::new_empty()
            .set(text)
            .map_err(|e| SheetError::FormulaParse(e.to_string()))?;

        let existed = self.cells.contains_key(&pos);
        let old_printable = self.printable;
        let (old_text, old_referenced) = match self.cells.get(&pos) {
            Some(cell) => (cell.text(), cell.referenced_cells()),
            None => (String::new(), Vec::new()),
        };

        self.cells.entry(pos).or_insert_with(Cell::new_empty);
        self.printable.include(pos);
        self.cells
            .get_mut(&pos)
            .unwrap()
            .set(text)
            .expect("already validated by the staged parse above");

        for &referent in &new_referenced {
            self.cells.entry(referent).or_insert_with(Cell::new_empty);
            self.cells.get_mut(&referent).unwrap().add_dependent(pos);
        }

        if let Err(cycle) = self.check_for_cycle(pos) {
            // Roll back: undo the new edges, restore the old content (or
            // drop the slot entirely if it didn't exist before this call),
            // and restore `printable` exactly.
            for &referent in &new_referenced {
                if let Some(cell) = self.cells.get_mut(&referent) {
                    cell.remove_dependent(pos);
                }
            }
            if existed {
                let cell = self.cells.get_mut(&pos).unwrap();
                cell.set(&old_text)
                    .expect("previously-accepted text must re-parse");
                for &referent in &old_referenced {
                    self.cells.entry(referent).or_insert_with(Cell::new_empty);
                    self.cells.get_mut(&referent).unwrap().add_dependent(pos);
                }
            } else {
                self.cells.remove(&pos);
            }
            self.printable = old_printable;
            return Err(SheetError::CircularDependency { cycle });
        }

        let new_referenced_set: HashSet<Position> = new_referenced.into_iter().collect();
        for referent in old_referenced {
            if !new_referenced_set.contains(&referent) {
                if let Some(cell) = self.cells.get_mut(&referent) {
                    cell.remove_dependent(pos);
                }
            }
        }

        self.invalidate_cascade(pos);

        Ok(())
    }

    /// Clears the contents of `pos`. No-op if `pos` is outside `printable`
    /// or the slot is absent.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        if pos.row >= self.printable.rows || pos.col >= self.printable.cols {
            return Ok(());
        }
        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        self.invalidate_cascade(pos);

        let referenced = self.cells.get(&pos).unwrap().referenced_cells();
        for referent in referenced {
            if let Some(cell) = self.cells.get_mut(&referent) {
                cell.remove_dependent(pos);
            }
        }

        self.cells.remove(&pos);
        self.shrink_printable();

        Ok(())
    }

    /// Recomputes `printable` as the tightest bounding rectangle over all
    /// remaining non-empty slots, or `(0,0)` if none remain. This deliberately
    /// does not stop at the first non-empty slot found scanning outward from
    /// the old bound, since a sparse map offers no such ordering guarantee;
    /// it scans every occupied slot.
    fn shrink_printable(&mut self) {
        let mut max_row = None;
        let mut max_col = None;
        for (pos, cell) in self.cells.iter() {
            if cell.is_empty() {
                continue;
            }
            max_row = Some(max_row.map_or(pos.row, |r: u32| r.max(pos.row)));
            max_col = Some(max_col.map_or(pos.col, |c: u32| c.max(pos.col)));
        }
        self.printable = match (max_row, max_col) {
            (Some(r), Some(c)) => Size::new(r + 1, c + 1),
            _ => Size::EMPTY,
        };
    }

    /// DFS from `pos` over forward (referenced-cells) edges, with `pos`
    /// pre-inserted into the active-path set. Assumes the new edges for
    /// `pos` have already been installed into the graph. Returns the cycle
    /// (in visit order) on failure.
    ///
    /// A cycle is a referent still on the *active* DFS path, not merely one
    /// already visited: two branches of a DAG are allowed to share a
    /// descendant (e.g. `D = B + C` where both `B` and `C` reference `A`),
    /// so `visited` alone would misreport that diamond as a cycle.
    fn check_for_cycle(&self, pos: Position) -> Result<(), Vec<Position>> {
        let mut on_path = HashSet::new();
        on_path.insert(pos);
        let mut visited = HashSet::new();
        visited.insert(pos);
        let mut path = vec![pos];
        self.check_for_cycle_from(pos, &mut on_path, &mut visited, &mut path)
    }

    fn check_for_cycle_from(
        &self,
        pos: Position,
        on_path: &mut HashSet<Position>,
        visited: &mut HashSet<Position>,
        path: &mut Vec<Position>,
    ) -> Result<(), Vec<Position>> {
        let Some(cell) = self.cells.get(&pos) else {
            return Ok(());
        };
        for referent in cell.referenced_cells() {
            if on_path.contains(&referent) {
                path.push(referent);
                return Err(path.clone());
            }
            if visited.contains(&referent) {
                // Already fully explored from some other branch with no
                // cycle found; no need to walk it again.
                continue;
            }
            visited.insert(referent);
            on_path.insert(referent);
            path.push(referent);
            self.check_for_cycle_from(referent, on_path, visited, path)?;
            path.pop();
            on_path.remove(&referent);
        }
        Ok(())
    }

    /// BFS over reverse (dependents) edges starting at `pos`, clearing the
    /// formula cache on every visited node (including `pos` itself).
    fn invalidate_cascade(&mut self, pos: Position) {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(pos);
        visited.insert(pos);

        while let Some(current) = queue.pop_front() {
            let dependents: Vec<Position> = match self.cells.get_mut(&current) {
                Some(cell) => {
                    cell.invalidate_cache();
                    cell.dependents.iter().copied().collect()
                }
                None => continue,
            };
            for dependent in dependents {
                if visited.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }
    }

    /// Renders the printable region as a tab-separated grid of cell values.
    pub fn print_values<W: std::fmt::Write>(&self, out: &mut W) -> std::fmt::Result {
        for row in 0..self.printable.rows {
            for col in 0..self.printable.cols {
                if col > 0 {
                    write!(out, "\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    match cell.value(self) {
                        CellValue::Number(n) => write!(out, "{}", n)?,
                        CellValue::Text(s) => write!(out, "{}", s)?,
                        CellValue::Error(_) => write!(out, "#ARITHM!")?,
                    }
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Renders the printable region as a tab-separated grid of cell texts.
    pub fn print_texts<W: std::fmt::Write>(&self, out: &mut W) -> std::fmt::Result {
        for row in 0..self.printable.rows {
            for col in 0..self.printable.cols {
                if col > 0 {
                    write!(out, "\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    write!(out, "{}", cell.text())?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
