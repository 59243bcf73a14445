//! A compact, computationally efficient bit array representation of a
//! Connect 4 board with blocked cells

use anyhow::{anyhow, Result};

use crate::{HEIGHT, WIDTH};

mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

// move ordering heuristic weights; the immediate win/loss signals must
// always dwarf the tactical bonuses, which in turn dominate centrality
const IMMEDIATE_WIN_SCORE: i32 = 20000;
const IMMEDIATE_LOSS_PENALTY: i32 = -19000;
const BLOCK_OPPONENT_WIN_SCORE: i32 = 18000;
const DOUBLE_THREAT_SCORE: i32 = 1500;
const SINGLE_THREAT_SCORE: i32 = 500;
const CENTRALITY_WEIGHT: i32 = 5;

/// A Connect 4 bitboard with blocked cells
///
/// # Notes
/// Storing the state of the board in the bits of an integer allows parallel
/// computation of game conditions with bitwise operations. A 7x6 Connect 4
/// board fits into the bits of a `u64` like so:
///
/// ```comment
/// Column:  0  1  2  3  4  5  6
///
///          6  13 20 28 35 42 49
///          ____________________
///       5 |05 12 19 27 34 41 48|
///       4 |04 11 18 26 33 40 47|
///       3 |03 10 17 24 32 39 46|
///       2 |02 09 16 23 31 38 45|
///       1 |01 08 15 22 30 37 44|
/// Rows: 0 |00 07 14 21 29 36 43|
/// ```
/// Where bit index 00 is the least significant bit. The extra row of bits on
/// top of the board identifies full columns and prevents bits overflowing
/// into the next column.
///
/// # Blocked Cells
/// A third mask marks cells that were removed from the board before the game
/// started. A blocked cell never holds a token: the landing scan for a column
/// skips blocked bits, so a dropped token falls through holes and can rest on
/// the cell above one. The blocked mask is fixed for the lifetime of a board.
///
/// # Board Keys
/// `player ^ board ^ blocked` identifies a position among all positions that
/// share the same blocked-cell configuration. This key indexes the
/// [transposition table].
///
/// # Internal Representation
/// One `u64` stores a mask of all squares containing a tile of either color,
/// one stores a mask of the current player's tiles and one stores the blocked
/// cells.
///
/// [transposition table]: ../transposition_table/struct.TranspositionTable.html
#[derive(Copy, Clone)]
pub struct BitBoard {
    // mask of the current player's tiles
    player_mask: u64,
    // mask of all tiles
    board_mask: u64,
    // mask of cells removed before the game started, never occupied
    blocked_mask: u64,
    num_moves: usize,
}
impl BitBoard {
    /// Creates a new, empty bitboard without blocked cells
    pub fn new() -> Self {
        Self {
            player_mask: 0,
            board_mask: 0,
            blocked_mask: 0,
            num_moves: 0,
        }
    }

    /// Creates an empty bitboard with up to two blocked cells
    ///
    /// # Notes
    /// Rows are counted from the top of the board, so `(row 5, col 0)` is the
    /// bottom-left cell. Coordinates outside the board are dropped with a
    /// warning, and identical coordinates collapse to a single blocked cell.
    pub fn with_blocked(row1: i32, col1: i32, row2: i32, col2: i32) -> Self {
        let mut board = Self::new();
        board.block_cell(row1, col1);
        board.block_cell(row2, col2);
        board
    }

    fn block_cell(&mut self, row: i32, col: i32) {
        if row < 0 || row >= HEIGHT as i32 || col < 0 || col >= WIDTH as i32 {
            log::warn!(
                "ignoring blocked cell outside the board: (row={}, col={})",
                row,
                col
            );
            return;
        }
        // display rows count from the top, bit rows from the bottom
        let bit_row = HEIGHT - 1 - row as usize;
        self.blocked_mask |= 1 << (col as usize * (HEIGHT + 1) + bit_row);
    }

    /// Creates a board from a string of 1-indexed moves
    ///
    /// # Notes
    /// The move string is a sequence of columns played, indexed from 1
    /// (meaning `"0"` is an invalid move)
    ///
    /// Returns `Err` if the move string represents an invalid position.
    /// Invalid positions can contain moves outside the column range,
    /// overfilled columns and winning positions for either player
    ///
    /// # Example
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use connect4_blocked::bitboard::BitBoard;
    ///
    /// // columns in move strings are 1-indexed
    /// let board = BitBoard::from_moves("112233")?;
    ///
    /// // columns as integers are 0-indexed
    /// assert!(board.check_winning_move(3));
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        Self::new().with_moves(moves)
    }

    /// Plays a string of 1-indexed moves on an existing board, keeping its
    /// blocked cells (see [`BitBoard::from_moves`])
    ///
    /// [`BitBoard::from_moves`]: #method.from_moves
    pub fn with_moves<S: AsRef<str>>(mut self, moves: S) -> Result<Self> {
        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    let column = column - 1;
                    let landing = self.landing_mask(column);
                    if landing == 0 {
                        return Err(anyhow!("Invalid move, column {} full", column + 1));
                    }
                    // abort if the position is won at any point
                    if self.check_winning_move(column) {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    self.play(landing);
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(self)
    }

    /// Accesses the internal mask of the current player's tiles
    pub fn player_mask(&self) -> u64 {
        self.player_mask
    }

    /// Accesses the internal mask of tiles on the whole board
    pub fn board_mask(&self) -> u64 {
        self.board_mask
    }

    /// Accesses the internal mask of blocked cells
    pub fn blocked_mask(&self) -> u64 {
        self.blocked_mask
    }

    /// Accesses the internal move counter
    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    /// Returns which player moves next, `1` or `2`
    pub fn side_to_move(&self) -> u8 {
        if self.num_moves % 2 == 0 {
            1
        } else {
            2
        }
    }

    /// Returns a mask of the given column
    pub fn column_mask(column: usize) -> u64 {
        ((1 << HEIGHT) - 1) << (column * (HEIGHT + 1))
    }

    /// Returns the column represented by a move bitmap or [`WIDTH`] if the
    /// column is not found
    ///
    /// [`WIDTH`]: ../constant.WIDTH.html
    pub fn column_from_move(move_bitmap: u64) -> usize {
        for column in 0..WIDTH {
            if move_bitmap & Self::column_mask(column) != 0 {
                return column;
            }
        }
        // WIDTH is always an invalid column
        WIDTH
    }

    /// Returns the bit index where a token dropped into the column lands, or
    /// `None` if every cell that is not blocked is already occupied
    ///
    /// # Notes
    /// Blocked cells are skipped, not treated as a floor: the token falls to
    /// the lowest cell that is neither occupied nor blocked.
    pub fn landing_bit(&self, column: usize) -> Option<usize> {
        if column >= WIDTH {
            return None;
        }
        let unusable = self.board_mask | self.blocked_mask;
        (0..HEIGHT)
            .map(|row| column * (HEIGHT + 1) + row)
            .find(|&bit| unusable & (1 << bit) == 0)
    }

    /// Returns a one-bit mask of the landing cell for a column, or zero when
    /// the column cannot be played
    pub fn landing_mask(&self, column: usize) -> u64 {
        self.landing_bit(column).map_or(0, |bit| 1 << bit)
    }

    /// Returns whether a column is a legal move
    pub fn playable(&self, column: usize) -> bool {
        self.landing_bit(column).is_some()
    }

    /// Returns a mask of all possible moves in the position
    pub fn possible_moves(&self) -> u64 {
        (0..WIDTH).fold(0, |moves, column| moves | self.landing_mask(column))
    }

    /// Advances the game by applying a move bitmap and switching players
    pub fn play(&mut self, move_bitmap: u64) {
        // switch the current player
        self.player_mask ^= self.board_mask;
        // add a cell of the previous player to the correct column
        self.board_mask |= move_bitmap;
        self.num_moves += 1;
    }

    /// Drops a token into a column
    ///
    /// # Panics
    /// Panics if the column is not playable; check with [`BitBoard::playable`]
    ///
    /// [`BitBoard::playable`]: #method.playable
    pub fn play_column(&mut self, column: usize) {
        let landing = self.landing_mask(column);
        assert!(landing != 0, "column {} is not playable", column);
        self.play(landing);
    }

    /// Returns whether a column is a winning move for the current player
    pub fn check_winning_move(&self, column: usize) -> bool {
        self.landing_mask(column) & self.winning_positions(self.player_mask) != 0
    }

    /// Returns whether the current player can win on this move
    pub fn can_win_next(&self) -> bool {
        self.winning_positions(self.player_mask) & self.possible_moves() != 0
    }

    /// Returns a mask of open squares completing an alignment for the
    /// current player
    pub fn winning_spots(&self) -> u64 {
        self.winning_positions(self.player_mask)
    }

    /// Returns a bitmap of the columns whose moves don't hand the opponent an
    /// immediate win
    ///
    /// # Notes
    /// If every legal move loses, the bitmap of all legal columns is returned
    /// instead so callers still have branches to explore
    pub fn non_losing_columns(&self) -> u8 {
        let mut non_losing = 0u8;
        let mut playable = 0u8;
        for column in 0..WIDTH {
            let landing = self.landing_mask(column);
            if landing == 0 {
                continue;
            }
            playable |= 1 << column;
            let mut next = *self;
            next.play(landing);
            if !next.can_win_next() {
                non_losing |= 1 << column;
            }
        }
        if non_losing == 0 {
            playable
        } else {
            non_losing
        }
    }

    /// Returns a bitmap of open squares that complete alignments for the opponent
    fn opponent_winning_positions(&self) -> u64 {
        let opp_mask = self.player_mask ^ self.board_mask;
        self.winning_positions(opp_mask)
    }

    /// Returns a mask of open squares of the given player's partial alignments
    fn winning_positions(&self, player_mask: u64) -> u64 {
        // vertical
        // find the top ends of 3-alignments
        let mut r = (player_mask << 1) & (player_mask << 2) & (player_mask << 3);
        // find internal holes and bottom ends; under gravity these cells can
        // only be empty where the column has a hole
        r |= (player_mask >> 1) & (player_mask << 1) & (player_mask << 2);
        r |= (player_mask >> 2) & (player_mask >> 1) & (player_mask << 1);
        r |= (player_mask >> 3) & (player_mask >> 2) & (player_mask >> 1);

        // horizontal
        let mut p = (player_mask << (HEIGHT + 1)) & (player_mask << (2 * (HEIGHT + 1)));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT + 1)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT + 1));

        p = (player_mask >> (HEIGHT + 1)) & (player_mask >> (2 * (HEIGHT + 1)));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT + 1)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT + 1));

        // diagonal /
        p = (player_mask << HEIGHT) & (player_mask << (2 * HEIGHT));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT));

        p = (player_mask >> (HEIGHT)) & (player_mask >> (2 * HEIGHT));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT));

        // diagonal \
        p = (player_mask << (HEIGHT + 2)) & (player_mask << (2 * (HEIGHT + 2)));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT + 2)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT + 2));

        p = (player_mask >> (HEIGHT + 2)) & (player_mask >> (2 * (HEIGHT + 2)));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT + 2)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT + 2));

        r & (static_masks::full_board_mask() ^ self.board_mask)
    }

    /// Returns whether a board contains four aligned tiles in any direction
    pub fn has_alignment(board: u64) -> bool {
        // check horizontal alignment
        // mark all horizontal runs of 2
        let mut m = board & (board >> (HEIGHT + 1));
        // check for runs of 2 * (runs of 2)
        if m & (m >> (2 * (HEIGHT + 1))) != 0 {
            return true;
        }

        // check diagonal alignment 1
        m = board & (board >> HEIGHT);
        if m & (m >> (2 * HEIGHT)) != 0 {
            return true;
        }

        // check diagonal alignment 2
        m = board & (board >> (HEIGHT + 2));
        if m & (m >> (2 * (HEIGHT + 2))) != 0 {
            return true;
        }

        // check vertical alignment
        m = board & (board >> 1);
        if m & (m >> 2) != 0 {
            return true;
        }

        // no alignments
        false
    }

    /// Scores a candidate move bitmap for move ordering
    ///
    /// # Notes
    /// Immediate wins and self-inflicted losses saturate the score; otherwise
    /// the score sums a bonus for blocking an opponent win, a bonus for the
    /// threats the move creates and a small centrality bonus.
    pub fn move_score(&self, candidate: u64) -> i32 {
        if candidate == 0 {
            return -100_000;
        }

        if self.winning_positions(self.player_mask) & candidate != 0 {
            return IMMEDIATE_WIN_SCORE;
        }

        let mut after = *self;
        after.play(candidate);
        if after.can_win_next() {
            return IMMEDIATE_LOSS_PENALTY;
        }

        let mut score = 0;
        if self.opponent_winning_positions() & candidate != 0 {
            score += BLOCK_OPPONENT_WIN_SCORE;
        }

        // after playing, our tiles are the opponent's from the new mover's view
        let own_after = after.board_mask ^ after.player_mask;
        match after.winning_positions(own_after).count_ones() {
            0 => {}
            1 => score += SINGLE_THREAT_SCORE,
            _ => score += DOUBLE_THREAT_SCORE,
        }

        let column = Self::column_from_move(candidate);
        if column < WIDTH {
            let half = (WIDTH / 2) as i32;
            score += (half - (column as i32 - half).abs()) * CENTRALITY_WEIGHT;
        }
        score
    }

    /// Returns the key used for indexing into the transposition table
    /// (see [Board Keys])
    ///
    /// [Board Keys]: #board-keys
    pub fn key(&self) -> u64 {
        self.player_mask ^ self.board_mask ^ self.blocked_mask
    }

    /// Rebuilds the token masks from a grid of cell labels, keeping the
    /// blocked cells set at construction
    ///
    /// # Notes
    /// `grid[0]` is the top row of the board; cells are labelled `0` (empty),
    /// `1` (first player) and `2` (second player). The designated side to
    /// move is honoured even when it disagrees with the parity of the token
    /// count; the mismatch is reported with a warning.
    pub fn reconstruct_from_grid(&mut self, grid: &[[u8; WIDTH]; HEIGHT], side_to_move: u8) {
        self.player_mask = 0;
        self.board_mask = 0;
        self.num_moves = 0;

        for (row, cells) in grid.iter().enumerate() {
            for (column, &cell) in cells.iter().enumerate() {
                if cell != 1 && cell != 2 {
                    continue;
                }
                let bit_row = HEIGHT - 1 - row;
                let stone = 1u64 << (column * (HEIGHT + 1) + bit_row);
                self.board_mask |= stone;
                if cell == side_to_move {
                    self.player_mask |= stone;
                }
                self.num_moves += 1;
            }
        }

        let first_player_by_parity = self.num_moves % 2 == 0;
        if first_player_by_parity != (side_to_move == 1) {
            log::warn!(
                "side to move (player {}) does not match the parity of {} placed tokens",
                side_to_move,
                self.num_moves
            );
        }
    }

    /// Renders the position as a grid of cell labels, the inverse of
    /// [`BitBoard::reconstruct_from_grid`]
    ///
    /// [`BitBoard::reconstruct_from_grid`]: #method.reconstruct_from_grid
    pub fn to_grid(&self) -> [[u8; WIDTH]; HEIGHT] {
        let (first, second) = if self.num_moves % 2 == 0 {
            (self.player_mask, self.board_mask ^ self.player_mask)
        } else {
            (self.board_mask ^ self.player_mask, self.player_mask)
        };

        let mut grid = [[0u8; WIDTH]; HEIGHT];
        for (row, cells) in grid.iter_mut().enumerate() {
            for (column, cell) in cells.iter_mut().enumerate() {
                let bit_row = HEIGHT - 1 - row;
                let stone = 1u64 << (column * (HEIGHT + 1) + bit_row);
                if first & stone != 0 {
                    *cell = 1;
                } else if second & stone != 0 {
                    *cell = 2;
                }
            }
        }
        grid
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}
