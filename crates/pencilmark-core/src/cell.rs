use serde::{Deserialize, Serialize};

/// A cell coordinate on the grid.
///
/// Cells order row-major, so sets of cells iterate top to bottom, left to right.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("r{row}c{col}")]
pub struct Cell {
    /// Row index, starting at 0.
    pub row: usize,
    /// Column index, starting at 0.
    pub col: usize,
}

impl Cell {
    /// Creates a cell at the given row and column.
    #[must_use]
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns `true` if the cell lies on a grid of the given dimension.
    #[must_use]
    #[inline]
    pub const fn is_within(self, size: usize) -> bool {
        self.row < size && self.col < size
    }

    /// Returns every cell of a `size`×`size` grid in row-major order.
    pub fn all(size: usize) -> impl Iterator<Item = Self> {
        (0..size).flat_map(move |row| (0..size).map(move |col| Self::new(row, col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_row_major() {
        let mut cells = vec![Cell::new(1, 0), Cell::new(0, 2), Cell::new(0, 1)];
        cells.sort();
        assert_eq!(cells, [Cell::new(0, 1), Cell::new(0, 2), Cell::new(1, 0)]);
    }

    #[test]
    fn test_all_covers_grid() {
        let cells: Vec<_> = Cell::all(3).collect();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[4], Cell::new(1, 1));
        assert!(cells.iter().all(|cell| cell.is_within(3)));
        assert!(!Cell::new(3, 0).is_within(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Cell::new(2, 7).to_string(), "r2c7");
    }
}
