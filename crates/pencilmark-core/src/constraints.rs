//! Rule sets describing puzzle variants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Cell, Grid, ModelError};

/// A list of cells that together form one rule region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region(pub Vec<Cell>);

impl Region {
    /// Returns the cells in this region.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.0
    }
}

impl FromIterator<Cell> for Region {
    fn from_iter<T: IntoIterator<Item = Cell>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A fixed value placed by the puzzle setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Given {
    /// Cell holding the given.
    pub cell: Cell,
    /// Fixed value.
    pub value: u8,
}

/// A killer cage: cells must hold distinct values summing to `sum`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KillerCage {
    /// Cells in the cage.
    pub cells: Vec<Cell>,
    /// Required total.
    pub sum: u32,
}

/// A thermometer: values strictly increase from the bulb (first cell) outwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Thermometer {
    /// Cells from bulb to tip.
    pub cells: Vec<Cell>,
}

/// Immutable description of a puzzle variant.
///
/// Each rule group is a list of region definitions. Keys that a variant adds
/// beyond the known groups are kept in [`extra`](Self::extra) and carried
/// through to the solving engine untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    /// Grid dimension.
    pub size: usize,
    /// Fixed values.
    #[serde(default)]
    pub givens: Vec<Given>,
    /// Row regions.
    #[serde(default)]
    pub rows: Vec<Region>,
    /// Column regions.
    #[serde(default)]
    pub columns: Vec<Region>,
    /// Box regions.
    #[serde(default)]
    pub boxes: Vec<Region>,
    /// Main diagonals, for diagonal variants.
    #[serde(default)]
    pub diagonals: Vec<Region>,
    /// Additional uniqueness regions (windoku, jigsaw pieces, ...).
    #[serde(default)]
    pub extra_regions: Vec<Region>,
    /// Killer cages.
    #[serde(default)]
    pub killer_cages: Vec<KillerCage>,
    /// Thermometers.
    #[serde(default)]
    pub thermometers: Vec<Thermometer>,
    /// Variant-specific keys with no dedicated field.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Constraints {
    /// Returns a builder for a puzzle of the given dimension.
    #[must_use]
    pub fn builder(size: usize) -> ConstraintsBuilder {
        ConstraintsBuilder::new(size)
    }

    /// Returns classic constraints: rows, columns, and boxes, no givens.
    ///
    /// # Example
    ///
    /// ```
    /// use pencilmark_core::Constraints;
    ///
    /// let constraints = Constraints::classic(9);
    /// assert_eq!(constraints.rows.len(), 9);
    /// assert_eq!(constraints.boxes.len(), 9);
    /// assert_eq!(constraints.uniqueness_regions().count(), 27);
    /// ```
    #[must_use]
    pub fn classic(size: usize) -> Self {
        Self::builder(size).rows().columns().boxes().constraints
    }

    /// Iterates over every region whose values must be distinct.
    ///
    /// Killer cages are included, since cage cells may not repeat.
    pub fn uniqueness_regions(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows
            .iter()
            .chain(&self.columns)
            .chain(&self.boxes)
            .chain(&self.diagonals)
            .chain(&self.extra_regions)
            .map(Region::cells)
            .chain(self.killer_cages.iter().map(|cage| cage.cells.as_slice()))
    }

    /// Returns the given value at `cell`, if any.
    #[must_use]
    pub fn given_at(&self, cell: Cell) -> Option<u8> {
        self.givens
            .iter()
            .find(|given| given.cell == cell)
            .map(|given| given.value)
    }

    /// Returns a grid holding only the givens.
    #[must_use]
    pub fn givens_grid(&self) -> Grid {
        let mut grid = Grid::new(self.size);
        for given in &self.givens {
            grid.set(given.cell, given.value);
        }
        grid
    }

    /// Checks that `grid` has this puzzle's dimension.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SizeMismatch`] if the dimensions differ.
    pub fn check_grid(&self, grid: &Grid) -> Result<(), ModelError> {
        if grid.size() == self.size {
            Ok(())
        } else {
            Err(ModelError::SizeMismatch {
                expected: self.size,
                found: grid.size(),
            })
        }
    }
}

/// Builder for [`Constraints`].
#[derive(Debug, Clone)]
pub struct ConstraintsBuilder {
    constraints: Constraints,
}

impl ConstraintsBuilder {
    fn new(size: usize) -> Self {
        Self {
            constraints: Constraints {
                size,
                givens: Vec::new(),
                rows: Vec::new(),
                columns: Vec::new(),
                boxes: Vec::new(),
                diagonals: Vec::new(),
                extra_regions: Vec::new(),
                killer_cages: Vec::new(),
                thermometers: Vec::new(),
                extra: BTreeMap::new(),
            },
        }
    }

    /// Adds one region per row.
    #[must_use]
    pub fn rows(mut self) -> Self {
        let size = self.constraints.size;
        self.constraints.rows = (0..size)
            .map(|row| (0..size).map(|col| Cell::new(row, col)).collect())
            .collect();
        self
    }

    /// Adds one region per column.
    #[must_use]
    pub fn columns(mut self) -> Self {
        let size = self.constraints.size;
        self.constraints.columns = (0..size)
            .map(|col| (0..size).map(|row| Cell::new(row, col)).collect())
            .collect();
        self
    }

    /// Adds box regions.
    ///
    /// Boxes are `h`×`w` where `h` is the largest divisor of the size not above
    /// its square root, so 9 gives 3×3 and 6 gives 2×3.
    #[must_use]
    pub fn boxes(mut self) -> Self {
        let size = self.constraints.size;
        let (height, width) = box_shape(size);
        self.constraints.boxes = (0..size)
            .map(|index| {
                let top = (index / (size / width)) * height;
                let left = (index % (size / width)) * width;
                (0..size)
                    .map(|i| Cell::new(top + i / width, left + i % width))
                    .collect()
            })
            .collect();
        self
    }

    /// Adds both main diagonals.
    #[must_use]
    pub fn diagonals(mut self) -> Self {
        let size = self.constraints.size;
        self.constraints.diagonals = vec![
            (0..size).map(|i| Cell::new(i, i)).collect(),
            (0..size).map(|i| Cell::new(i, size - 1 - i)).collect(),
        ];
        self
    }

    /// Adds an extra uniqueness region.
    #[must_use]
    pub fn region(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.constraints.extra_regions.push(cells.into_iter().collect());
        self
    }

    /// Adds a killer cage.
    #[must_use]
    pub fn cage(mut self, cells: impl IntoIterator<Item = Cell>, sum: u32) -> Self {
        self.constraints.killer_cages.push(KillerCage {
            cells: cells.into_iter().collect(),
            sum,
        });
        self
    }

    /// Adds a thermometer, bulb first.
    #[must_use]
    pub fn thermometer(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.constraints.thermometers.push(Thermometer {
            cells: cells.into_iter().collect(),
        });
        self
    }

    /// Adds a given.
    #[must_use]
    pub fn given(mut self, cell: Cell, value: u8) -> Self {
        self.constraints.givens.push(Given { cell, value });
        self
    }

    /// Adds givens from a grid, skipping empty cells.
    #[must_use]
    pub fn givens_from(mut self, grid: &Grid) -> Self {
        self.constraints.givens.extend(
            grid.cells()
                .filter(|&(_, value)| value != 0)
                .map(|(cell, value)| Given { cell, value }),
        );
        self
    }

    /// Adds a variant-specific key.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.constraints.extra.insert(key.into(), value);
        self
    }

    /// Finishes the builder.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::GivenOutOfRange`] if a given lies off the grid or
    /// holds a value outside `1..=size`.
    pub fn build(self) -> Result<Constraints, ModelError> {
        let size = self.constraints.size;
        for given in &self.constraints.givens {
            if !given.cell.is_within(size) || given.value == 0 || usize::from(given.value) > size {
                return Err(ModelError::GivenOutOfRange {
                    cell: given.cell,
                    value: given.value,
                });
            }
        }
        Ok(self.constraints)
    }
}

fn box_shape(size: usize) -> (usize, usize) {
    let height = (1..=size)
        .take_while(|h| h * h <= size)
        .filter(|h| size % h == 0)
        .last()
        .unwrap_or(1);
    (height, size / height.max(1))
}
