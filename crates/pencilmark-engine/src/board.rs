//! Flat board representation shared by the solvers.

use pencilmark_core::{Cell, Constraints, Grid, MarkSet};

use crate::EngineError;

/// A board with precomputed region membership.
///
/// Cells are addressed by their row-major index.
#[derive(Debug, Clone)]
pub(crate) struct Board {
    size: usize,
    values: Vec<u8>,
    regions: Vec<Vec<usize>>,
    cell_regions: Vec<Vec<usize>>,
    cages: Vec<(Vec<usize>, u32)>,
    cell_cages: Vec<Vec<usize>>,
    thermometers: Vec<Vec<usize>>,
    cell_thermometers: Vec<Vec<usize>>,
}

impl Board {
    /// Builds a board holding the givens of `constraints`.
    pub(crate) fn new(constraints: &Constraints) -> Result<Self, EngineError> {
        let size = constraints.size;
        if size == 0 || size > usize::from(MarkSet::MAX_VALUE) {
            return Err(EngineError::UnsupportedSize { size });
        }

        let index = |cell: Cell| -> Result<usize, EngineError> {
            if cell.is_within(size) {
                Ok(cell.row * size + cell.col)
            } else {
                Err(EngineError::CellOutOfRange { cell })
            }
        };
        let indices =
            |cells: &[Cell]| cells.iter().map(|&c| index(c)).collect::<Result<Vec<_>, _>>();

        let regions = constraints
            .uniqueness_regions()
            .map(indices)
            .collect::<Result<Vec<_>, _>>()?;
        let cages = constraints
            .killer_cages
            .iter()
            .map(|cage| Ok((indices(&cage.cells)?, cage.sum)))
            .collect::<Result<Vec<_>, EngineError>>()?;
        let thermometers = constraints
            .thermometers
            .iter()
            .map(|thermo| indices(&thermo.cells))
            .collect::<Result<Vec<_>, _>>()?;

        let mut cell_regions = vec![Vec::new(); size * size];
        for (r, region) in regions.iter().enumerate() {
            for &i in region {
                cell_regions[i].push(r);
            }
        }
        let mut cell_cages = vec![Vec::new(); size * size];
        for (c, (cells, _)) in cages.iter().enumerate() {
            for &i in cells {
                cell_cages[i].push(c);
            }
        }
        let mut cell_thermometers = vec![Vec::new(); size * size];
        for (t, cells) in thermometers.iter().enumerate() {
            for &i in cells {
                cell_thermometers[i].push(t);
            }
        }

        let mut board = Self {
            size,
            values: vec![0; size * size],
            regions,
            cell_regions,
            cages,
            cell_cages,
            thermometers,
            cell_thermometers,
        };
        for given in &constraints.givens {
            let i = index(given.cell)?;
            if given.value == 0 || usize::from(given.value) > size {
                return Err(EngineError::ValueOutOfRange {
                    cell: given.cell,
                    value: given.value,
                });
            }
            board.values[i] = given.value;
        }
        Ok(board)
    }

    /// Builds a board from `constraints` and overlays the non-empty cells of `grid`.
    pub(crate) fn with_grid(constraints: &Constraints, grid: &Grid) -> Result<Self, EngineError> {
        if grid.size() != constraints.size {
            return Err(EngineError::SizeMismatch {
                expected: constraints.size,
                found: grid.size(),
            });
        }
        let mut board = Self::new(constraints)?;
        for (cell, value) in grid.cells() {
            if value == 0 {
                continue;
            }
            if usize::from(value) > board.size {
                return Err(EngineError::ValueOutOfRange { cell, value });
            }
            board.values[cell.row * board.size + cell.col] = value;
        }
        Ok(board)
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Largest value a cell may hold.
    pub(crate) fn max_value(&self) -> u8 {
        u8::try_from(self.size).unwrap_or(MarkSet::MAX_VALUE)
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn value(&self, i: usize) -> u8 {
        self.values[i]
    }

    pub(crate) fn set(&mut self, i: usize, value: u8) {
        self.values[i] = value;
    }

    pub(crate) fn cell(&self, i: usize) -> Cell {
        Cell::new(i / self.size, i % self.size)
    }

    pub(crate) fn regions(&self) -> &[Vec<usize>] {
        &self.regions
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.values.iter().all(|&v| v != 0)
    }

    pub(crate) fn to_grid(&self) -> Grid {
        let mut grid = Grid::new(self.size);
        for (i, &value) in self.values.iter().enumerate() {
            grid.set(self.cell(i), value);
        }
        grid
    }

    /// Returns the values that may go into empty cell `i` without breaking a rule.
    pub(crate) fn candidates(&self, i: usize) -> MarkSet {
        let mut set: MarkSet = (1..=self.max_value()).collect();
        for &r in &self.cell_regions[i] {
            for &peer in &self.regions[r] {
                set.remove(self.values[peer]);
            }
        }
        set.iter().filter(|&v| self.fits_extras(i, v)).collect()
    }

    /// Returns `true` if every filled cell respects the rules.
    pub(crate) fn is_consistent(&self) -> bool {
        (0..self.len()).all(|i| {
            let value = self.values[i];
            if value == 0 {
                return true;
            }
            let unique = self.cell_regions[i].iter().all(|&r| {
                self.regions[r]
                    .iter()
                    .all(|&peer| peer == i || self.values[peer] != value)
            });
            unique && self.fits_extras(i, value)
        })
    }

    fn fits_extras(&self, i: usize, value: u8) -> bool {
        self.cell_cages[i].iter().all(|&c| self.fits_cage(c, i, value))
            && self.cell_thermometers[i]
                .iter()
                .all(|&t| self.fits_thermometer(t, i, value))
    }

    fn fits_cage(&self, cage: usize, i: usize, value: u8) -> bool {
        let (cells, sum) = &self.cages[cage];
        let mut total = u32::from(value);
        let mut empty = 0;
        for &peer in cells.iter().filter(|&&peer| peer != i) {
            match self.values[peer] {
                0 => empty += 1,
                v => total += u32::from(v),
            }
        }
        if empty == 0 { total == *sum } else { total < *sum }
    }

    fn fits_thermometer(&self, thermo: usize, i: usize, value: u8) -> bool {
        let cells = &self.thermometers[thermo];
        let Some(pos) = cells.iter().position(|&c| c == i) else {
            return true;
        };
        let value = usize::from(value);
        // Room is needed below for the cells before, and above for the cells after.
        if value <= pos || value + (cells.len() - 1 - pos) > self.size {
            return false;
        }
        cells.iter().enumerate().all(|(j, &peer)| {
            let other = usize::from(self.values[peer]);
            if other == 0 || j == pos {
                true
            } else if j < pos {
                other + (pos - j) <= value
            } else {
                value + (j - pos) <= other
            }
        })
    }
}
