//! Reference solving engine for pencilmark.
//!
//! [`ReferenceEngine`] speaks the engine side of the wire contract in
//! [`pencilmark_core::wire`]: it reads constraints in engine naming, runs a
//! solver, and answers every request with exactly one reply carrying the same
//! id. Session code only ever talks to it through
//! [`SolvingEngine`], so any other engine honoring the contract can replace it.
//!
//! # Example
//!
//! ```
//! use pencilmark_core::{
//!     Constraints, SolverType, SolvingEngine,
//!     field_names::constraints_to_engine,
//!     wire::{EngineCall, EngineOutcome, EngineRequest, RequestId},
//! };
//! use pencilmark_engine::ReferenceEngine;
//!
//! let constraints = constraints_to_engine(&Constraints::classic(4))?;
//! let reply = ReferenceEngine::new().handle(EngineRequest {
//!     id: RequestId(1),
//!     call: EngineCall::Solve {
//!         constraints,
//!         solver_type: SolverType::Brute,
//!     },
//! });
//! assert_eq!(reply.id, RequestId(1));
//! assert!(matches!(reply.outcome, EngineOutcome::Solution(_)));
//! # Ok::<(), pencilmark_core::TranslationError>(())
//! ```

use pencilmark_core::{
    Cell, Constraints, Grid, SolverType, SolvingEngine, TranslationError,
    field_names::constraints_from_engine,
    grid_errors,
    wire::{CheckVerdict, EngineCall, EngineOutcome, EngineReply, EngineRequest},
};

use self::{backtrack::BacktrackSolver, board::Board, logical::LogicalSolver};

mod backtrack;
mod board;
mod logical;

/// Errors raised while handling a request.
///
/// They never cross the wire as values; the reply carries their message in
/// [`EngineOutcome::Failed`].
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum EngineError {
    /// The constraints payload could not be read.
    #[display("invalid constraints: {_0}")]
    InvalidConstraints(#[from] TranslationError),
    /// The grid dimension is outside what the engine supports.
    #[display("unsupported grid size {size}")]
    UnsupportedSize {
        /// Requested dimension.
        size: usize,
    },
    /// A rule refers to a cell off the grid.
    #[display("cell {cell} is off the grid")]
    CellOutOfRange {
        /// Offending cell.
        cell: Cell,
    },
    /// A value is outside `1..=size`.
    #[display("value {value} at {cell} is out of range")]
    ValueOutOfRange {
        /// Offending cell.
        cell: Cell,
        /// Offending value.
        value: u8,
    },
    /// The grid does not match the puzzle dimension.
    #[display("grid size {found} does not match puzzle size {expected}")]
    SizeMismatch {
        /// Puzzle dimension.
        expected: usize,
        /// Grid dimension.
        found: usize,
    },
    /// The puzzle has no solution.
    #[display("puzzle has no solution")]
    NoSolution,
}

/// The built-in solving engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceEngine {}

impl ReferenceEngine {
    /// Creates the engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Solves the puzzle from its givens.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the constraints are malformed, or
    /// [`EngineError::NoSolution`] if a brute-force search exhausts every branch.
    pub fn solve(
        &self,
        constraints: &Constraints,
        solver_type: SolverType,
    ) -> Result<EngineOutcome, EngineError> {
        let mut board = Board::new(constraints)?;
        match solver_type {
            SolverType::Logical => {
                let trace = LogicalSolver::new().solve(&mut board);
                Ok(EngineOutcome::Trace(trace))
            }
            SolverType::Brute => {
                if !board.is_consistent() || !BacktrackSolver::new().solve(&mut board) {
                    return Err(EngineError::NoSolution);
                }
                Ok(EngineOutcome::Solution(board.to_grid()))
            }
        }
    }

    /// Checks a partially filled grid.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the constraints or grid are malformed.
    pub fn check(
        &self,
        constraints: &Constraints,
        grid: &Grid,
    ) -> Result<CheckVerdict, EngineError> {
        let consistent = grid_errors(true, constraints, grid, None).is_empty();
        let mut board = Board::with_grid(constraints, grid)?;
        let solvable =
            consistent && board.is_consistent() && BacktrackSolver::new().solve(&mut board);
        Ok(CheckVerdict {
            consistent,
            solvable,
        })
    }

    fn dispatch(&self, call: EngineCall) -> Result<EngineOutcome, EngineError> {
        match call {
            EngineCall::Solve {
                constraints,
                solver_type,
            } => {
                let constraints = constraints_from_engine(&constraints)?;
                self.solve(&constraints, solver_type)
            }
            EngineCall::Check { constraints, grid } => {
                let constraints = constraints_from_engine(&constraints)?;
                self.check(&constraints, &grid.values).map(EngineOutcome::Verdict)
            }
        }
    }
}

impl SolvingEngine for ReferenceEngine {
    fn handle(&self, request: EngineRequest) -> EngineReply {
        let EngineRequest { id, call } = request;
        log::debug!("engine handling request {id}");
        let outcome = self.dispatch(call).unwrap_or_else(|err| {
            log::debug!("engine request {id} failed: {err}");
            EngineOutcome::Failed(err.to_string())
        });
        EngineReply { id, outcome }
    }
}
