//! A cell-array board for interactive play, with terminal rendering

use anyhow::{anyhow, Result};
use crossterm::{
    cursor::MoveTo,
    style::{style, Attribute, Color, PrintStyledContent, Stylize},
    QueueableCommand,
};

use std::io::{stdout, Write};

use crate::{HEIGHT, WIDTH};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Cell {
    PlayerOne,
    PlayerTwo,
    Empty,
    /// A cell removed from the board before the game started
    Blocked,
}

impl Cell {
    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

#[derive(Copy, Clone, Debug)]
pub enum GameState {
    Playing,
    PlayerOneWin,
    PlayerTwoWin,
    Draw,
}

/// A Connect 4 board stored as an array of cells
///
/// Used by interactive front ends; the solver works on a [`BitBoard`]
/// reconstructed from [`ArrayBoard::to_grid`].
///
/// [`BitBoard`]: ../bitboard/struct.BitBoard.html
/// [`ArrayBoard::to_grid`]: #method.to_grid
#[derive(Clone)]
pub struct ArrayBoard {
    cells: [Cell; WIDTH * HEIGHT], // cells are stored left-to-right, bottom-to-top
    pub player_one: bool,
    pub game: String,
    num_moves: usize,
    pub state: GameState,
}
impl ArrayBoard {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; WIDTH * HEIGHT],
            player_one: true,
            game: String::new(),
            num_moves: 0,
            state: GameState::Playing,
        }
    }

    /// Creates an empty board with up to two blocked cells
    ///
    /// Rows count from the top of the board; out-of-range coordinates are
    /// dropped with a warning, like [`BitBoard::with_blocked`]
    ///
    /// [`BitBoard::with_blocked`]: ../bitboard/struct.BitBoard.html#method.with_blocked
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
        let bottom_row = HEIGHT - 1 - row as usize;
        self.cells[col as usize + WIDTH * bottom_row] = Cell::Blocked;
    }

    #[allow(unused)]
    pub fn from_str(moves: &str) -> Result<Self> {
        let mut board = Self::new();

        for column_char in moves.chars() {
            match column_char.to_digit(10) {
                Some(column) => {
                    let _ = board.play_checked(column as usize)?;
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(board)
    }

    /// Returns the row a token dropped into the column settles in, counting
    /// from the bottom; blocked cells are fallen through, not landed on
    fn landing_row(&self, column: usize) -> Option<usize> {
        (0..HEIGHT).find(|row| self.cells[column + WIDTH * row].is_empty())
    }

    fn playable(&self, column: usize) -> bool {
        column < WIDTH && self.landing_row(column).is_some()
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    pub fn play_checked(&mut self, column_one_indexed: usize) -> Result<GameState> {
        if column_one_indexed < 1 || column_one_indexed > WIDTH {
            return Err(anyhow!(
                "Invalid move, column {} out of range. Columns must be between 1 and {}",
                column_one_indexed,
                WIDTH
            ));
        }
        let column = column_one_indexed - 1;
        if !self.playable(column) {
            return Err(anyhow!(
                "Invalid move, column {} full or blocked",
                column_one_indexed
            ));
        }

        if self.check_winning_move(column) {
            self.state = if self.player_one {
                GameState::PlayerOneWin
            } else {
                GameState::PlayerTwoWin
            }
        } else {
            self.state = if self.check_draw_move() {
                GameState::Draw
            } else {
                GameState::Playing
            };
        }
        self.play(column);
        self.game.push_str(&column_one_indexed.to_string());

        Ok(self.state)
    }

    pub fn check_draw_move(&self) -> bool {
        self.cells.iter().filter(|x| x.is_empty()).count() == 1
    }

    /// Renders the board as a grid of cell labels for
    /// [`BitBoard::reconstruct_from_grid`]
    ///
    /// [`BitBoard::reconstruct_from_grid`]: ../bitboard/struct.BitBoard.html#method.reconstruct_from_grid
    pub fn to_grid(&self) -> [[u8; WIDTH]; HEIGHT] {
        let mut grid = [[0u8; WIDTH]; HEIGHT];
        for (row, cells) in grid.iter_mut().enumerate() {
            for (column, cell) in cells.iter_mut().enumerate() {
                let bottom_row = HEIGHT - 1 - row;
                *cell = match self.cells[column + WIDTH * bottom_row] {
                    Cell::PlayerOne => 1,
                    Cell::PlayerTwo => 2,
                    Cell::Empty | Cell::Blocked => 0,
                };
            }
        }
        grid
    }

    pub fn display(&self) -> Result<()> {
        let mut stdout = stdout();

        let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
        stdout.queue(PrintStyledContent(style(cols + "\n")))?;
        for _ in 0..HEIGHT {
            stdout.queue(PrintStyledContent(style("\n")))?;
        }
        stdout.flush()?;

        let (origin_x, origin_y) = crossterm::cursor::position()?;

        for (idx, cell) in self.cells.iter().enumerate() {
            let (pos_x, pos_y) = (
                origin_x + (idx % WIDTH) as u16,
                origin_y - (idx / WIDTH) as u16,
            );

            let (glyph, color) = match cell {
                Cell::PlayerOne => ("O", Color::Red),
                Cell::PlayerTwo => ("O", Color::Yellow),
                Cell::Empty => ("O", Color::DarkBlue),
                Cell::Blocked => ("#", Color::Black),
            };
            stdout
                .queue(MoveTo(pos_x, pos_y))?
                .queue(PrintStyledContent(
                    style(glyph)
                        .attribute(Attribute::Bold)
                        .on(Color::DarkBlue)
                        .with(color),
                ))?;
        }
        stdout
            .queue(MoveTo(origin_x + WIDTH as u16, origin_y))?
            .queue(PrintStyledContent(style("\n")))?;
        stdout.flush()?;
        Ok(())
    }

    fn play(&mut self, column: usize) {
        let row = match self.landing_row(column) {
            Some(row) => row,
            None => panic!("column {} is not playable", column + 1),
        };
        let player = if self.player_one {
            Cell::PlayerOne
        } else {
            Cell::PlayerTwo
        };
        self.cells[column + WIDTH * row] = player;
        self.num_moves += 1;
        self.player_one = !self.player_one;
    }

    fn check_winning_move(&self, column: usize) -> bool {
        let row = match self.landing_row(column) {
            Some(row) => row,
            None => return false,
        };
        let player = if self.player_one {
            Cell::PlayerOne
        } else {
            Cell::PlayerTwo
        };

        // check vertical alignment; a blocked cell below the landing row
        // breaks the run like any non-player cell
        if row >= 3
            && self.cells[column + WIDTH * (row - 1)] == player
            && self.cells[column + WIDTH * (row - 2)] == player
            && self.cells[column + WIDTH * (row - 3)] == player
        {
            return true;
        }

        // check horizontal and diagonal alignment
        for dy_dx in -1i32..=1 {
            let mut run = 0;
            for dx in [-1i32, 1].iter() {
                let mut x = column as i32 + dx;
                let mut y = row as i32 + dx * dy_dx;
                loop {
                    if x < 0
                        || x >= WIDTH as i32
                        || y < 0
                        || y >= HEIGHT as i32
                        || self.cells[x as usize + WIDTH * y as usize] != player
                    {
                        break;
                    }
                    x += dx;
                    y += dx * dy_dx;
                    run += 1;
                }
            }
            if run >= 3 {
                return true;
            }
        }

        false
    }
}

impl Default for ArrayBoard {
    fn default() -> Self {
        Self::new()
    }
}
