//! An agent to solve blocked-cell Connect 4 positions exactly

use crate::{bitboard::BitBoard, transposition_table::TranspositionTable, HEIGHT, PLAYABLE_CELLS, WIDTH};

use std::cmp::Ordering;

/// The minimum possible score of a position
pub const MIN_SCORE: i32 = -((WIDTH * HEIGHT) as i32) / 2 + 3;
/// The maximum possible score of a postion
pub const MAX_SCORE: i32 = ((WIDTH * HEIGHT) as i32 + 1) / 2 - 3;

/// Sentinel score reported by [`Solver::analyze`] for columns that cannot
/// be played
///
/// [`Solver::analyze`]: struct.Solver.html#method.analyze
pub const INVALID_MOVE: i32 = -1000;

struct MoveSorter {
    size: usize,
    // move bitmap and heuristic score, ascending by score
    moves: [(u64, i32); WIDTH],
}

impl MoveSorter {
    pub fn new() -> Self {
        Self {
            size: 0,
            moves: [(0, 0); WIDTH],
        }
    }
    pub fn push(&mut self, new_move: u64, score: i32) {
        let mut pos = self.size;
        self.size += 1;
        while pos != 0 && self.moves[pos - 1].1 > score {
            self.moves[pos] = self.moves[pos - 1];
            pos -= 1;
        }
        self.moves[pos] = (new_move, score);
    }
}
impl Iterator for MoveSorter {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        match self.size {
            0 => None,
            _ => {
                self.size -= 1;
                Some(self.moves[self.size].0)
            }
        }
    }
}

/// Returns a slice ordering the columns from the middle outwards, as
/// the middle columns are often better moves
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        let offset = (1 - 2 * (i as i32 % 2)) * (i as i32 + 1) / 2;
        move_order[i] = ((WIDTH / 2) as i32 + offset) as usize;
        i += 1;
    }
    move_order
}

/// An agent to solve blocked-cell Connect 4 positions
///
/// # Notes
/// This agent uses a classical game tree search with various optimisations to
/// find the mathematically best move(s) in any position, thus 'solving' the
/// game. The solver owns its transposition table; keeping one solver alive
/// across queries lets later searches reuse earlier bounds.
///
/// # Position Scoring
/// A position is scored by how far a forced win is from the end of the game.
/// A win with the final token of the 40 playable cells scores 1 (or -1 when
/// the second player wins with their final token); earlier wins have scores
/// further from 0. A drawn position has a score of 0.
pub struct Solver {
    transposition_table: TranspositionTable,
    node_count: u64,
}

impl Solver {
    /// Creates a new `Solver` with an empty transposition table
    pub fn new() -> Self {
        Self {
            transposition_table: TranspositionTable::new(),
            node_count: 0,
        }
    }

    /// Creates a new `Solver` reusing a given transposition table
    pub fn with_transposition_table(transposition_table: TranspositionTable) -> Self {
        Self {
            transposition_table,
            node_count: 0,
        }
    }

    /// The number of nodes searched by this `Solver` since the last reset
    /// (for diagnostics only)
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Returns the `index`-th column in the engine's centre-first exploration
    /// order, or `None` out of range
    pub fn column_order_at(&self, index: usize) -> Option<usize> {
        move_order().get(index).copied()
    }

    /// Clears the node counter and the transposition table
    pub fn reset(&mut self) {
        self.node_count = 0;
        self.transposition_table.reset();
    }

    /// Performs game tree search
    ///
    /// Returns the score of the position (see [Position Scoring])
    ///
    /// The caller must have peeled off immediate wins: the side to move may
    /// not have a winning move available.
    ///
    /// [Position Scoring]: #position-scoring
    fn negamax(&mut self, board: &BitBoard, mut alpha: i32, mut beta: i32) -> i32 {
        assert!(alpha < beta);
        assert!(!board.can_win_next());

        self.node_count += 1;

        // check for draw
        if board.num_moves() >= PLAYABLE_CELLS {
            return 0;
        }

        // clamp the window to the scores still reachable at this depth
        let remaining = (PLAYABLE_CELLS - board.num_moves()) as i32;
        let min_possible = -(remaining / 2);
        let max_possible = (remaining + 1) / 2;
        if alpha < min_possible {
            alpha = min_possible;
            if alpha >= beta {
                return alpha;
            }
        }
        if beta > max_possible {
            beta = max_possible;
            if alpha >= beta {
                return beta;
            }
        }

        // try to fetch an upper or lower bound of the score from the
        // transposition table
        let key = board.key();
        let value = self.transposition_table.get(key) as i32;
        if value != 0 {
            // check if lower bound
            if value > MAX_SCORE - MIN_SCORE + 1 {
                let min = value + 2 * MIN_SCORE - MAX_SCORE - 2;
                if alpha < min {
                    alpha = min;
                    if alpha >= beta {
                        // prune the exploration
                        return alpha;
                    }
                }
            // else upper bound
            } else {
                let max = value + MIN_SCORE - 1;
                if beta > max {
                    beta = max;
                    if alpha >= beta {
                        // prune the exploration
                        return beta;
                    }
                }
            }
        }

        // order the surviving moves by their heuristic score
        let candidates = board.non_losing_columns();
        let mut moves = MoveSorter::new();
        for &column in move_order().iter() {
            if candidates & (1 << column) == 0 {
                continue;
            }
            let candidate = board.landing_mask(column);
            if candidate != 0 {
                moves.push(candidate, board.move_score(candidate));
            }
        }

        // search the next level of the tree
        let mut explored = 0;
        let mut best = i32::MIN;
        for move_bitmap in moves {
            explored += 1;
            let mut next = *board;
            next.play(move_bitmap);

            let score = if next.can_win_next() {
                // the opponent finishes immediately, no need to recurse
                -((PLAYABLE_CELLS as i32 + 1 - next.num_moves() as i32) / 2)
            } else {
                // the search window is flipped for the other player
                -self.negamax(&next, -beta, -alpha)
            };

            if score > best {
                best = score;
            }
            // if a child node's score is better than beta, we can prune the
            // tree here because a perfect opponent will not pick this branch
            if score >= beta {
                // save a lower bound of the score
                self.transposition_table
                    .put(key, (best + MAX_SCORE - 2 * MIN_SCORE + 2) as u8);
                return best;
            }
            if score > alpha {
                alpha = score;
            }
        }

        if explored == 0 {
            // no playable column at all
            return min_possible;
        }

        // offset of one to prevent putting a 0, which represents an empty entry
        self.transposition_table.put(key, (best - MIN_SCORE + 1) as u8);
        best
    }

    /// Calculates the score of a position
    ///
    /// # Notes
    /// A weak solve only proves the sign of the outcome (win/draw/loss) and
    /// explores far fewer nodes; a strong solve pins down the exact score.
    ///
    /// The score is found by binary-narrowing the window of possible scores
    /// with null-window probes. The probe midpoint is biased away from zero:
    /// balanced positions cluster near 0 but forced lines live near the
    /// extremes, so shifting toward the further endpoint converges faster.
    pub fn solve(&mut self, board: &BitBoard, weak: bool) -> i32 {
        // winning this move bypasses the search entirely
        if board.can_win_next() {
            return (PLAYABLE_CELLS as i32 + 1 - board.num_moves() as i32) / 2;
        }

        let (mut alpha, mut beta) = if weak {
            (-1, 1)
        } else {
            let remaining = PLAYABLE_CELLS as i32 - board.num_moves() as i32;
            (-(remaining / 2), (remaining + 1) / 2)
        };

        // iteratively narrow the window until the score is pinned down
        while alpha < beta {
            let mut med = alpha + (beta - alpha) / 2;
            if med <= 0 {
                if med > alpha / 2 && alpha != 0 && alpha != -1 {
                    med = alpha / 2;
                }
                if med == alpha {
                    med += 1;
                }
            } else {
                if med < beta / 2 && beta != 0 && beta != 1 {
                    med = beta / 2;
                }
                if med == beta {
                    med -= 1;
                }
            }
            if med <= alpha {
                med = alpha + 1;
            }
            if med >= beta {
                med = beta - 1;
            }
            if med >= beta {
                break;
            }

            // use a null window to determine if the actual score is greater
            // or less than med
            let r = self.negamax(board, med, med + 1);
            if r <= med {
                // actual score <= med
                beta = r;
            } else {
                // actual score > med
                alpha = r;
            }
        }
        alpha
    }

    /// Scores every root move of a position
    ///
    /// # Notes
    /// Unplayable columns score [`INVALID_MOVE`]; a column that wins on the
    /// spot scores the immediate-win value; every other legal column scores
    /// the negated solve of the position after playing it. The transposition
    /// table is deliberately kept warm between sibling columns: stored bounds
    /// are relative to the side to move, so they stay valid.
    ///
    /// [`INVALID_MOVE`]: constant.INVALID_MOVE.html
    pub fn analyze(&mut self, board: &BitBoard, weak: bool) -> [i32; WIDTH] {
        let mut scores = [INVALID_MOVE; WIDTH];
        for (column, score) in scores.iter_mut().enumerate() {
            if !board.playable(column) {
                continue;
            }
            if board.check_winning_move(column) {
                *score = (PLAYABLE_CELLS as i32 + 1 - board.num_moves() as i32) / 2;
            } else {
                let mut next = *board;
                next.play_column(column);
                *score = -self.solve(&next, weak);
            }
        }
        scores
    }

    /// Picks the best column from an [`Solver::analyze`] result
    ///
    /// Columns are compared in the engine's centre-first order with ties
    /// going to the first one visited; `None` means no column is playable
    ///
    /// [`Solver::analyze`]: #method.analyze
    pub fn best_column(board: &BitBoard, scores: &[i32; WIDTH]) -> Option<usize> {
        let mut best: Option<(usize, i32)> = None;
        for &column in move_order().iter() {
            if !board.playable(column) || scores[column] == INVALID_MOVE {
                continue;
            }
            if best.map_or(true, |(_, score)| scores[column] > score) {
                best = Some((column, scores[column]));
            }
        }
        best.map(|(column, _)| column)
    }

    /// Converts a position score to a win distance in a single player's tokens
    pub fn score_to_win_distance(board: &BitBoard, score: i32) -> usize {
        match score.cmp(&0) {
            Ordering::Equal => PLAYABLE_CELLS - board.num_moves(),
            Ordering::Greater => {
                (PLAYABLE_CELLS / 2 + 1 - score as usize) - board.num_moves() / 2
            }
            Ordering::Less => {
                (PLAYABLE_CELLS / 2 + 1) - (-score as usize) - board.num_moves() / 2
            }
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}
