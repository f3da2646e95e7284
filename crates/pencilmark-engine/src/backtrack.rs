use crate::board::Board;

/// Exhaustive depth-first search.
///
/// Always branches on the empty cell with the fewest candidates.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct BacktrackSolver {}

impl BacktrackSolver {
    pub(crate) const fn new() -> Self {
        Self {}
    }

    /// Fills `board` with the first solution found. Returns `false` if there is none,
    /// leaving `board` unchanged.
    pub(crate) fn solve(self, board: &mut Board) -> bool {
        let Some((i, candidates)) = (0..board.len())
            .filter(|&i| board.value(i) == 0)
            .map(|i| (i, board.candidates(i)))
            .min_by_key(|(_, candidates)| candidates.len())
        else {
            return true;
        };

        for value in candidates.iter() {
            board.set(i, value);
            if self.solve(board) {
                return true;
            }
        }
        board.set(i, 0);
        false
    }
}
