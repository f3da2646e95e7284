use pencilmark_core::wire::{SolveStep, SolveTrace};

use crate::board::Board;

const NAKED_SINGLE: &str = "Naked Single";
const HIDDEN_SINGLE: &str = "Hidden Single";

/// Deduction-only solver that records every placement it makes.
///
/// Applies naked singles first, then hidden singles in regions that span a full
/// set of values, and stops when neither finds a placement.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogicalSolver {}

impl LogicalSolver {
    pub(crate) const fn new() -> Self {
        Self {}
    }

    pub(crate) fn solve(self, board: &mut Board) -> SolveTrace {
        let mut steps = Vec::new();
        while let Some((i, value, technique)) =
            Self::naked_single(board).or_else(|| Self::hidden_single(board))
        {
            board.set(i, value);
            log::trace!("{technique}: {} = {value}", board.cell(i));
            steps.push(SolveStep {
                technique: technique.to_owned(),
                cell: board.cell(i),
                value,
            });
        }

        let solution = (board.is_complete() && board.is_consistent()).then(|| board.to_grid());
        SolveTrace { steps, solution }
    }

    fn naked_single(board: &Board) -> Option<(usize, u8, &'static str)> {
        (0..board.len())
            .filter(|&i| board.value(i) == 0)
            .find_map(|i| {
                let candidates = board.candidates(i);
                if candidates.len() == 1 {
                    candidates.iter().next().map(|value| (i, value, NAKED_SINGLE))
                } else {
                    None
                }
            })
    }

    fn hidden_single(board: &Board) -> Option<(usize, u8, &'static str)> {
        let max = board.max_value();
        for region in board.regions().iter().filter(|r| r.len() == board.size()) {
            for value in 1..=max {
                if region.iter().any(|&i| board.value(i) == value) {
                    continue;
                }
                let mut spots = region
                    .iter()
                    .copied()
                    .filter(|&i| board.value(i) == 0 && board.candidates(i).contains(value));
                if let (Some(i), None) = (spots.next(), spots.next()) {
                    return Some((i, value, HIDDEN_SINGLE));
                }
            }
        }
        None
    }
}
