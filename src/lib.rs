//! A perfect agent for playing or analysing 'Connect 4' on boards where
//! up to two cells have been permanently blocked before the game starts.
//!
//! This agent uses an optimised game tree search to find the
//! mathematically optimal move for any position. Blocked cells never hold
//! a token: a piece dropped into a column falls to the lowest cell that is
//! neither occupied nor blocked, stacking straight through any hole.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_blocked::{bitboard::BitBoard, solver::Solver};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let board = BitBoard::from_moves("112233")?;
//! let mut solver = Solver::new();
//!
//! // the side to move completes four in a row in column 4
//! assert_eq!(solver.solve(&board, false), 17);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod transposition_table;

pub mod bitboard;

pub mod solver;

pub mod arrayboard;

mod test;

pub use arrayboard::{ArrayBoard, Cell, GameState};
pub use bitboard::BitBoard;
pub use solver::{Solver, INVALID_MOVE, MAX_SCORE, MIN_SCORE};
pub use transposition_table::TranspositionTable;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

/// The number of cells that can hold a token once two cells are blocked
pub const PLAYABLE_CELLS: usize = WIDTH * HEIGHT - 2;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
