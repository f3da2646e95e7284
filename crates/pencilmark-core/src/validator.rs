//! Live grid validation.
//!
//! [`grid_errors`] is a pure function of its inputs: it keeps no cache and has
//! no side effects, so callers may run it on every keystroke and memoize it on
//! input identity.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Cell, CellMarks, Constraints, Grid};

/// Returns the cells that currently violate `constraints`.
///
/// When `check_errors` is `false` the result is always empty. Otherwise a cell
/// is reported when:
///
/// - its value is outside `1..=size`,
/// - it disagrees with a given,
/// - its value repeats inside a uniqueness region (every repeated cell is reported),
/// - it belongs to a full killer cage with the wrong total, or it is filled in a
///   cage whose filled cells already exceed the total,
/// - it breaks the strict increase of a thermometer (both cells of the pair are reported),
/// - it is empty and every one of its pencil marks is already placed in a region
///   it belongs to.
///
/// Cells outside the grid are ignored.
///
/// # Example
///
/// ```
/// use pencilmark_core::{Cell, Constraints, Grid, grid_errors};
///
/// let constraints = Constraints::classic(4);
/// let mut grid = Grid::new(4);
/// grid.set(Cell::new(0, 0), 2);
/// grid.set(Cell::new(1, 1), 2);
///
/// let errors = grid_errors(true, &constraints, &grid, None);
/// assert_eq!(errors.len(), 2);
/// assert!(grid_errors(false, &constraints, &grid, None).is_empty());
/// ```
#[must_use]
pub fn grid_errors(
    check_errors: bool,
    constraints: &Constraints,
    grid: &Grid,
    marks: Option<&CellMarks>,
) -> BTreeSet<Cell> {
    let mut errors = BTreeSet::new();
    if !check_errors {
        return errors;
    }

    check_ranges(constraints, grid, &mut errors);
    check_givens(constraints, grid, &mut errors);
    for region in constraints.uniqueness_regions() {
        check_duplicates(region, grid, &mut errors);
    }
    for cage in &constraints.killer_cages {
        check_cage_sum(&cage.cells, cage.sum, grid, &mut errors);
    }
    for thermometer in &constraints.thermometers {
        check_thermometer(&thermometer.cells, grid, &mut errors);
    }
    if let Some(marks) = marks {
        check_dead_marks(constraints, grid, marks, &mut errors);
    }

    errors
}

fn check_ranges(constraints: &Constraints, grid: &Grid, errors: &mut BTreeSet<Cell>) {
    for (cell, value) in grid.cells() {
        if usize::from(value) > constraints.size {
            errors.insert(cell);
        }
    }
}

fn check_givens(constraints: &Constraints, grid: &Grid, errors: &mut BTreeSet<Cell>) {
    for given in &constraints.givens {
        if let Some(value) = grid.get(given.cell)
            && value != 0
            && value != given.value
        {
            errors.insert(given.cell);
        }
    }
}

fn check_duplicates(region: &[Cell], grid: &Grid, errors: &mut BTreeSet<Cell>) {
    let mut seen: BTreeMap<u8, Vec<Cell>> = BTreeMap::new();
    for &cell in region {
        if let Some(value) = grid.get(cell)
            && value != 0
        {
            seen.entry(value).or_default().push(cell);
        }
    }
    for cells in seen.into_values().filter(|cells| cells.len() > 1) {
        errors.extend(cells);
    }
}

fn check_cage_sum(cells: &[Cell], sum: u32, grid: &Grid, errors: &mut BTreeSet<Cell>) {
    let mut total = 0;
    let mut filled = Vec::with_capacity(cells.len());
    for &cell in cells {
        match grid.get(cell) {
            Some(0) | None => {}
            Some(value) => {
                total += u32::from(value);
                filled.push(cell);
            }
        }
    }
    let complete = filled.len() == cells.len();
    if (complete && total != sum) || total > sum {
        errors.extend(filled);
    }
}

fn check_thermometer(cells: &[Cell], grid: &Grid, errors: &mut BTreeSet<Cell>) {
    let filled: Vec<(usize, Cell, u8)> = cells
        .iter()
        .enumerate()
        .filter_map(|(i, &cell)| match grid.get(cell) {
            Some(0) | None => None,
            Some(value) => Some((i, cell, value)),
        })
        .collect();
    for (a, &(i, cell_i, value_i)) in filled.iter().enumerate() {
        for &(j, cell_j, value_j) in &filled[a + 1..] {
            // Each step along the bulb-to-tip path must add at least one.
            if usize::from(value_j) < usize::from(value_i) + (j - i) {
                errors.insert(cell_i);
                errors.insert(cell_j);
            }
        }
    }
}

fn check_dead_marks(
    constraints: &Constraints,
    grid: &Grid,
    marks: &CellMarks,
    errors: &mut BTreeSet<Cell>,
) {
    for (cell, value) in grid.cells() {
        if value != 0 {
            continue;
        }
        let cell_marks = marks.get(cell);
        if cell_marks.is_empty() {
            continue;
        }
        let placed: BTreeSet<u8> = constraints
            .uniqueness_regions()
            .filter(|region| region.contains(&cell))
            .flatten()
            .filter_map(|&peer| grid.get(peer))
            .filter(|&v| v != 0)
            .collect();
        if cell_marks.iter().all(|mark| placed.contains(&mark)) {
            errors.insert(cell);
        }
    }
}
