//! Core data structures for pencilmark puzzle sessions.
//!
//! This crate holds the passive puzzle model shared by the session controller
//! and solving engines, together with the pure functions that operate on it.
//!
//! # Overview
//!
//! 1. **Model types**
//!    - [`cell`]: Row/column coordinates.
//!    - [`grid`]: The live fill state ([`Grid`]) and pencil marks ([`CellMarks`]).
//!    - [`constraints`]: The rule set of a puzzle variant ([`Constraints`]).
//!
//! 2. **Engine boundary**
//!    - [`field_names`]: The static table mapping internal field names to the
//!      solving engine's naming, and the key translation built on it.
//!    - [`wire`]: Request/reply payloads exchanged with a [`SolvingEngine`].
//!
//! 3. **Validation**
//!    - [`validator`]: [`grid_errors`], the pure check that powers live error
//!      highlighting.
//!
//! # Examples
//!
//! ```
//! use pencilmark_core::{Cell, Constraints, Grid, grid_errors};
//!
//! let constraints = Constraints::classic(4);
//! let mut grid = Grid::new(4);
//! grid.set(Cell::new(0, 0), 1);
//! grid.set(Cell::new(0, 3), 1);
//!
//! let errors = grid_errors(true, &constraints, &grid, None);
//! assert!(errors.contains(&Cell::new(0, 0)));
//! assert!(errors.contains(&Cell::new(0, 3)));
//! ```

pub mod cell;
pub mod constraints;
pub mod field_names;
pub mod grid;
pub mod validator;
pub mod wire;

pub use self::{
    cell::Cell,
    constraints::{Constraints, ConstraintsBuilder, Given, KillerCage, Region, Thermometer},
    field_names::{Direction, TranslationError},
    grid::{CellMarks, Grid, MarkSet, ModelError},
    validator::grid_errors,
    wire::{SolverType, SolvingEngine},
};
