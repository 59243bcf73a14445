#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use std::time::Instant;

    use crate::solver::move_order;
    use crate::transposition_table::{next_prime, TABLE_SIZE};
    use crate::{
        ArrayBoard, BitBoard, GameState, Solver, TranspositionTable, INVALID_MOVE, HEIGHT,
        PLAYABLE_CELLS, WIDTH,
    };

    /// A full board with no four-in-a-row anywhere: columns 0, 1, 4 and 5
    /// alternate starting with player 1 at the bottom, columns 2, 3 and 6
    /// start with player 2
    fn no_alignment_grid() -> [[u8; WIDTH]; HEIGHT] {
        let mut grid = [[0u8; WIDTH]; HEIGHT];
        for (row, cells) in grid.iter_mut().enumerate() {
            let bottom_row = HEIGHT - 1 - row;
            for (column, cell) in cells.iter_mut().enumerate() {
                let flipped = matches!(column, 2 | 3 | 6);
                *cell = if (bottom_row % 2 == 0) ^ flipped {
                    1
                } else {
                    2
                };
            }
        }
        grid
    }

    #[test]
    pub fn column_exploration_order() {
        assert_eq!(move_order(), [3, 2, 4, 1, 5, 0, 6]);

        let solver = Solver::new();
        assert_eq!(solver.column_order_at(0), Some(3));
        assert_eq!(solver.column_order_at(6), Some(6));
        assert_eq!(solver.column_order_at(WIDTH), None);
    }

    #[test]
    pub fn landing_skips_blocked_cells() {
        let mut board = BitBoard::with_blocked(2, 2, 3, 4);
        assert_eq!(board.blocked_mask().count_ones(), 2);
        // (row 2, col 2) -> bit 17, (row 3, col 4) -> bit 30
        assert_eq!(board.blocked_mask(), (1 << 17) | (1 << 30));

        // five tokens fill column 2 around the hole, which stays empty
        let hole = 1u64 << 17;
        for _ in 0..5 {
            assert!(board.playable(2));
            board.play_column(2);
            assert_eq!(board.board_mask() & hole, 0);
        }
        assert!(!board.playable(2));
        assert_eq!(board.board_mask() & board.blocked_mask(), 0);
    }

    #[test]
    pub fn blocked_coordinates_validated() {
        // out-of-range coordinates are dropped
        let board = BitBoard::with_blocked(9, 9, 2, 2);
        assert_eq!(board.blocked_mask().count_ones(), 1);
        let board = BitBoard::with_blocked(-1, 0, 0, -1);
        assert_eq!(board.blocked_mask(), 0);

        // identical coordinates collapse to one blocked cell
        let board = BitBoard::with_blocked(2, 2, 2, 2);
        assert_eq!(board.blocked_mask().count_ones(), 1);

        // blocked cells feed the position key
        assert_ne!(BitBoard::with_blocked(2, 2, 3, 4).key(), BitBoard::new().key());
    }

    #[test]
    pub fn winning_move_detection() -> Result<()> {
        let board = BitBoard::from_moves("112233")?;
        assert!(board.check_winning_move(3));
        assert!(board.can_win_next());

        let board = BitBoard::from_moves("121212")?;
        assert!(board.check_winning_move(0));

        // no winner on an empty board
        let board = BitBoard::new();
        assert!(!board.can_win_next());
        for column in 0..WIDTH {
            assert!(!board.check_winning_move(column));
        }
        assert!(!board.playable(WIDTH));
        Ok(())
    }

    #[test]
    pub fn can_win_next_matches_column_scan() -> Result<()> {
        for moves in ["", "112233", "121212", "2233", "1122", "445566"] {
            let board = BitBoard::from_moves(moves)?;
            let any_winning = (0..WIDTH).any(|column| board.check_winning_move(column));
            assert_eq!(board.can_win_next(), any_winning, "{}", moves);
        }
        Ok(())
    }

    #[test]
    pub fn winning_spots_are_empty_cells() -> Result<()> {
        for moves in ["", "112233", "121212", "223344"] {
            let board = BitBoard::from_moves(moves)?;
            assert_eq!(board.winning_spots() & board.board_mask(), 0, "{}", moves);
        }
        let board = BitBoard::with_blocked(2, 2, 3, 4).with_moves("1122")?;
        assert_eq!(board.winning_spots() & board.board_mask(), 0);
        Ok(())
    }

    #[test]
    pub fn play_advances_one_token() -> Result<()> {
        let board = BitBoard::with_blocked(2, 2, 3, 4).with_moves("1234")?;
        for column in 0..WIDTH {
            if !board.playable(column) {
                continue;
            }
            let mut next = board;
            next.play_column(column);
            assert_eq!(next.num_moves(), board.num_moves() + 1);
            assert_eq!(
                next.board_mask().count_ones(),
                board.board_mask().count_ones() + 1
            );
            assert_eq!(next.board_mask().count_ones() as usize, next.num_moves());
            assert_eq!(next.board_mask() & next.blocked_mask(), 0);
        }
        Ok(())
    }

    #[test]
    pub fn winning_move_matches_alignment() -> Result<()> {
        for moves in ["112233", "121212", "223344", "34455"] {
            let board = BitBoard::from_moves(moves)?;
            for column in 0..WIDTH {
                if !board.playable(column) {
                    continue;
                }
                let mut next = board;
                next.play_column(column);
                // after playing, the mover's tokens are the opponent's tiles
                let mover = next.board_mask() ^ next.player_mask();
                assert_eq!(
                    board.check_winning_move(column),
                    BitBoard::has_alignment(mover),
                    "{} column {}",
                    moves,
                    column
                );
            }
        }
        Ok(())
    }

    #[test]
    pub fn non_losing_columns_forced_block() -> Result<()> {
        // player 1 threatens column 3; every other reply loses on the spot
        let board = BitBoard::from_moves("11223")?;
        assert_eq!(board.non_losing_columns(), 1 << 3);
        Ok(())
    }

    #[test]
    pub fn non_losing_columns_all_lose() -> Result<()> {
        // a double threat on columns 0 and 4 cannot be parried, so every
        // playable column is handed back for the search to grind through
        let board = BitBoard::from_moves("22334")?;
        assert_eq!(board.non_losing_columns(), 0b111_1111);
        Ok(())
    }

    #[test]
    pub fn immediate_win_scoring() -> Result<()> {
        let mut solver = Solver::new();

        let board = BitBoard::from_moves("112233")?;
        assert_eq!(solver.solve(&board, false), 17);
        assert_eq!(Solver::score_to_win_distance(&board, 17), 1);

        let board = BitBoard::from_moves("121212")?;
        assert_eq!(solver.solve(&board, false), 17);
        Ok(())
    }

    #[test]
    pub fn forced_double_threat_win() -> Result<()> {
        let mut solver = Solver::new();

        // playing column 3 makes threats on both sides
        let board = BitBoard::from_moves("2233")?;
        assert_eq!(solver.solve(&board, false), 17);
        assert_eq!(Solver::score_to_win_distance(&board, 17), 2);

        // and the defender is lost whatever they do
        let board = BitBoard::from_moves("22334")?;
        assert_eq!(solver.solve(&board, false), -17);
        Ok(())
    }

    #[test]
    pub fn weak_solve_agrees_on_sign() -> Result<()> {
        let mut solver = Solver::new();

        let winning = BitBoard::from_moves("2233")?;
        assert!(solver.solve(&winning, true) > 0);

        let losing = BitBoard::from_moves("22334")?;
        assert!(solver.solve(&losing, true) < 0);
        Ok(())
    }

    #[test]
    pub fn drawn_board_scores_zero() {
        // a full 40-token board: the top cells of columns 0 and 6 stay empty
        let mut grid = no_alignment_grid();
        grid[0][0] = 0;
        grid[0][6] = 0;

        let mut board = BitBoard::new();
        board.reconstruct_from_grid(&grid, 1);
        assert_eq!(board.num_moves(), PLAYABLE_CELLS);
        assert!(!board.can_win_next());

        let mut solver = Solver::new();
        assert_eq!(solver.solve(&board, false), 0);
        assert_eq!(solver.solve(&board, true), 0);
    }

    #[test]
    pub fn analyze_matches_solve() {
        // columns 0 and 6 empty, everything else filled without alignments
        let mut grid = no_alignment_grid();
        for row in grid.iter_mut() {
            row[0] = 0;
            row[6] = 0;
        }

        let mut board = BitBoard::new();
        board.reconstruct_from_grid(&grid, 1);

        let mut solver = Solver::new();
        let scores = solver.analyze(&board, false);
        for column in 0..WIDTH {
            if !board.playable(column) {
                assert_eq!(scores[column], INVALID_MOVE);
                continue;
            }
            if board.check_winning_move(column) {
                continue;
            }
            let mut next = board;
            next.play_column(column);
            assert_eq!(scores[column], -solver.solve(&next, false), "column {}", column);
        }
    }

    #[test]
    pub fn mirror_symmetric_scores() {
        // columns 0, 2, 4 and 6 filled alternately, the open columns primed
        // with two tokens each; the position is its own mirror image
        let mut grid = [[0u8; WIDTH]; HEIGHT];
        for row in 0..HEIGHT {
            let bottom_row = HEIGHT - 1 - row;
            for column in [0, 2, 4, 6] {
                grid[row][column] = if bottom_row % 2 == 0 { 1 } else { 2 };
            }
        }
        // bottom two cells of columns 1 and 5: player 1 under player 2
        grid[HEIGHT - 1][1] = 1;
        grid[HEIGHT - 2][1] = 2;
        grid[HEIGHT - 1][5] = 1;
        grid[HEIGHT - 2][5] = 2;
        // column 3 mirrors onto itself
        grid[HEIGHT - 1][3] = 2;
        grid[HEIGHT - 2][3] = 1;

        let mut board = BitBoard::new();
        board.reconstruct_from_grid(&grid, 1);

        let mut solver = Solver::new();
        let scores = solver.analyze(&board, false);
        for column in 0..WIDTH {
            assert_eq!(scores[column], scores[WIDTH - 1 - column], "column {}", column);
        }
        assert_eq!(scores[0], INVALID_MOVE);
    }

    #[test]
    pub fn reconstruct_round_trip() -> Result<()> {
        let board = BitBoard::with_blocked(2, 2, 3, 4).with_moves("112244")?;

        let grid = board.to_grid();
        let mut rebuilt = BitBoard::with_blocked(2, 2, 3, 4);
        rebuilt.reconstruct_from_grid(&grid, board.side_to_move());

        assert_eq!(rebuilt.player_mask(), board.player_mask());
        assert_eq!(rebuilt.board_mask(), board.board_mask());
        assert_eq!(rebuilt.num_moves(), board.num_moves());
        assert_eq!(rebuilt.blocked_mask(), board.blocked_mask());
        assert_eq!(rebuilt.key(), board.key());
        Ok(())
    }

    #[test]
    pub fn reconstruct_honours_designated_side() {
        // a lone player-1 token with player 1 designated to move disagrees
        // with parity; the designated side still gets the mover's mask
        let mut grid = [[0u8; WIDTH]; HEIGHT];
        grid[HEIGHT - 1][3] = 1;

        let mut board = BitBoard::new();
        board.reconstruct_from_grid(&grid, 1);
        assert_eq!(board.num_moves(), 1);
        assert_eq!(board.player_mask(), 1 << (3 * (HEIGHT + 1)));
    }

    #[test]
    pub fn transposition_table_basics() {
        assert_eq!(next_prime(1 << 4), 17);
        assert_eq!(next_prime(17), 17);
        assert!(TABLE_SIZE >= 1 << 24);

        let mut table = TranspositionTable::new();
        let key = 0x1234_5678_9ABC_u64;
        assert_eq!(table.get(key), 0);
        table.put(key, 42);
        assert_eq!(table.get(key), 42);

        // a colliding key evicts the previous entry, which then misses cleanly
        let colliding = key + TABLE_SIZE as u64;
        table.put(colliding, 7);
        assert_eq!(table.get(colliding), 7);
        assert_eq!(table.get(key), 0);

        table.reset();
        assert_eq!(table.get(colliding), 0);
    }

    #[test]
    pub fn node_count_and_reset() -> Result<()> {
        let board = BitBoard::from_moves("2233")?;
        let mut solver = Solver::with_transposition_table(TranspositionTable::new());
        solver.solve(&board, false);
        assert!(solver.node_count() > 0);

        solver.reset();
        assert_eq!(solver.node_count(), 0);
        Ok(())
    }

    #[test]
    pub fn arrayboard_matches_bitboard() -> Result<()> {
        let mut array_board = ArrayBoard::with_blocked(2, 2, 3, 4);
        let bit_board = BitBoard::with_blocked(2, 2, 3, 4).with_moves("343434")?;

        for column_char in "343434".chars() {
            let column = column_char.to_digit(10).unwrap() as usize;
            array_board.play_checked(column)?;
        }
        assert_eq!(array_board.to_grid(), bit_board.to_grid());

        // the next token in column 3 floats above the hole without winning
        assert!(matches!(array_board.play_checked(3)?, GameState::Playing));
        Ok(())
    }

    #[test]
    pub fn arrayboard_detects_wins() -> Result<()> {
        let mut board = ArrayBoard::from_str("112233")?;
        assert!(matches!(board.play_checked(4)?, GameState::PlayerOneWin));

        let mut board = ArrayBoard::new();
        assert!(board.play_checked(0).is_err());
        assert!(board.play_checked(WIDTH + 1).is_err());
        Ok(())
    }

    #[test]
    #[ignore = "searching the whole game takes minutes"]
    pub fn full_search() {
        let board = BitBoard::with_blocked(1, 0, 5, 5);
        let mut solver = Solver::new();

        let start_time = Instant::now();
        let score = solver.solve(&board, false);
        let time = start_time.elapsed();
        let posis = solver.node_count();

        println!(
            "Full game search\n Time: {:.6}s, No. of positions: {}, kpos/s: {}",
            time.as_secs_f64(),
            posis,
            posis as f64 / (1000.0 * time.as_secs_f64())
        );
        println!("Calculated score: {}", score);
    }
}
