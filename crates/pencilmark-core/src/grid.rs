//! Live fill state and pencil marks.

use serde::{Deserialize, Serialize};

use crate::Cell;

/// Errors that can occur when building model values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ModelError {
    /// A row has a different length than the number of rows.
    #[display("grid is not square: row {row} has {len} cells, expected {size}")]
    NotSquare {
        /// Offending row index.
        row: usize,
        /// Length of that row.
        len: usize,
        /// Expected length.
        size: usize,
    },
    /// A grid or mark layer does not match the puzzle dimension.
    #[display("size mismatch: expected {expected}, found {found}")]
    SizeMismatch {
        /// Dimension required by the constraints.
        expected: usize,
        /// Dimension that was supplied.
        found: usize,
    },
    /// A mark layer does not hold one entry per cell.
    #[display("mark layer of size {size} has {found} entries, expected {expected}")]
    MarkLayerLength {
        /// Layer dimension.
        size: usize,
        /// Entries required.
        expected: usize,
        /// Entries supplied.
        found: usize,
    },
    /// A given lies outside the grid or its value is out of range.
    #[display("given at {cell} with value {value} is out of range")]
    GivenOutOfRange {
        /// Cell of the given.
        cell: Cell,
        /// Value of the given.
        value: u8,
    },
}

/// A square grid of cell values, where `0` marks an empty cell.
///
/// The core never mutates a grid it is handed; input components own the live copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Grid {
    size: usize,
    values: Vec<u8>,
}

impl Grid {
    /// Creates an empty grid of the given dimension.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            values: vec![0; size * size],
        }
    }

    /// Builds a grid from rows of values.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotSquare`] if any row length differs from the row count.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, ModelError> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != size {
                return Err(ModelError::NotSquare {
                    row,
                    len: cells.len(),
                    size,
                });
            }
            values.extend(cells);
        }
        Ok(Self { size, values })
    }

    /// Returns the grid dimension.
    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the value at `cell`, or `None` if the cell is off the grid.
    #[must_use]
    #[inline]
    pub fn get(&self, cell: Cell) -> Option<u8> {
        cell.is_within(self.size)
            .then(|| self.values[cell.row * self.size + cell.col])
    }

    /// Writes a value into `cell`. Cells off the grid are ignored.
    pub fn set(&mut self, cell: Cell, value: u8) {
        if cell.is_within(self.size) {
            self.values[cell.row * self.size + cell.col] = value;
        }
    }

    /// Returns `true` if no cell is empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|&v| v != 0)
    }

    /// Iterates over `(cell, value)` pairs in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, u8)> + '_ {
        Cell::all(self.size).zip(self.values.iter().copied())
    }

    /// Returns the grid as rows of values.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.values.chunks(self.size).map(<[u8]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<u8>>> for Grid {
    type Error = ModelError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<u8>> {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

/// A set of pencil-mark values for a single cell.
///
/// Stores one bit per value; values 1 to 31 are representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkSet(u32);

impl MarkSet {
    /// Largest value that fits in a mark set.
    pub const MAX_VALUE: u8 = 31;

    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Creates a set from raw bits, where bit `v` marks value `v`.
    ///
    /// Returns `None` if bit 0 is set, since 0 is not a value.
    #[must_use]
    pub const fn try_from_bits(bits: u32) -> Option<Self> {
        if bits & 1 != 0 { None } else { Some(Self(bits)) }
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Adds a value. Returns `false` if the value cannot be represented.
    pub fn insert(&mut self, value: u8) -> bool {
        if value == 0 || value > Self::MAX_VALUE {
            return false;
        }
        self.0 |= 1 << value;
        true
    }

    /// Removes a value.
    pub fn remove(&mut self, value: u8) {
        if value != 0 && value <= Self::MAX_VALUE {
            self.0 &= !(1 << value);
        }
    }

    /// Returns `true` if the value is marked.
    #[must_use]
    pub const fn contains(self, value: u8) -> bool {
        value != 0 && value <= Self::MAX_VALUE && self.0 & (1 << value) != 0
    }

    /// Returns `true` if nothing is marked.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of marked values.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates over marked values in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (1..=Self::MAX_VALUE).filter(move |&v| self.contains(v))
    }
}

impl FromIterator<u8> for MarkSet {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

/// Per-cell pencil marks, indexed like [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCellMarks")]
pub struct CellMarks {
    size: usize,
    marks: Vec<MarkSet>,
}

#[derive(Deserialize)]
struct RawCellMarks {
    size: usize,
    marks: Vec<MarkSet>,
}

impl TryFrom<RawCellMarks> for CellMarks {
    type Error = ModelError;

    fn try_from(raw: RawCellMarks) -> Result<Self, Self::Error> {
        Self::from_marks(raw.size, raw.marks)
    }
}

impl CellMarks {
    /// Creates an empty mark layer of the given dimension.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            marks: vec![MarkSet::new(); size * size],
        }
    }

    /// Builds a layer from row-major marks.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MarkLayerLength`] unless there is exactly one
    /// entry per cell.
    pub fn from_marks(size: usize, marks: Vec<MarkSet>) -> Result<Self, ModelError> {
        let expected = size * size;
        if marks.len() != expected {
            return Err(ModelError::MarkLayerLength {
                size,
                expected,
                found: marks.len(),
            });
        }
        Ok(Self { size, marks })
    }

    /// Returns the layer dimension.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the marks at `cell`; cells off the grid have no marks.
    #[must_use]
    pub fn get(&self, cell: Cell) -> MarkSet {
        if cell.is_within(self.size) {
            self.marks[cell.row * self.size + cell.col]
        } else {
            MarkSet::new()
        }
    }

    /// Replaces the marks at `cell`. Cells off the grid are ignored.
    pub fn set(&mut self, cell: Cell, marks: MarkSet) {
        if cell.is_within(self.size) {
            self.marks[cell.row * self.size + cell.col] = marks;
        }
    }
}
