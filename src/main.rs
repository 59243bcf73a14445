use connect4_blocked::*;

use std::io::{stdin, stdout, Write};
use std::time::Instant;

// the two holes of the default game, as (row, col) from the top-left corner
const BLOCKED_CELLS: [(i32, i32); 2] = [(5, 1), (0, 5)];

fn main() {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let [(row1, col1), (row2, col2)] = BLOCKED_CELLS;
    let mut board = ArrayBoard::with_blocked(row1, col1, row2, col2);
    let mut solver = Solver::new();

    println!("Welcome to Connect 4 with blocked cells");
    println!("You play first; blocked cells are shown as '#'\n");

    let stdin = stdin();
    loop {
        board.display().expect("Failed to draw board!");
        println!("Moves played: {}", board.num_moves());

        let state = if board.player_one {
            print!("> ");
            stdout().flush().expect("Failed to flush to stdout!");
            let mut input_str = String::new();
            stdin
                .read_line(&mut input_str)
                .expect("Failed to read stdin!");

            let input = match input_str.trim().parse::<usize>() {
                Err(_) => {
                    println!("Invalid number: {}", input_str);
                    continue;
                }
                Ok(column) => column,
            };

            match board.play_checked(input) {
                Err(err) => {
                    println!("{}", err);
                    continue;
                }
                Ok(state) => state,
            }
        } else {
            // the solver works on a bitboard rebuilt from the displayed grid
            let mut position = BitBoard::with_blocked(row1, col1, row2, col2);
            position.reconstruct_from_grid(&board.to_grid(), 2);

            println!("Solver is thinking...");
            let start = Instant::now();
            let scores = solver.analyze(&position, false);
            let elapsed = start.elapsed();

            let column = match Solver::best_column(&position, &scores) {
                Some(column) => column,
                None => {
                    println!("No playable column left");
                    break;
                }
            };

            let score = scores[column];
            println!(
                "Solver plays column {} (score {}, {} nodes, {:.3}s)",
                column + 1,
                score,
                solver.node_count(),
                elapsed.as_secs_f64()
            );
            if score > 0 {
                println!(
                    "Solver expects to win within {} of its tokens",
                    Solver::score_to_win_distance(&position, score)
                );
            } else if score < 0 {
                println!(
                    "You can still force a win within {} of your tokens",
                    Solver::score_to_win_distance(&position, score)
                );
            }

            board
                .play_checked(column + 1)
                .expect("Solver chose an unplayable column!")
        };

        match state {
            GameState::Playing => {}
            GameState::PlayerOneWin => {
                board.display().expect("Failed to draw board!");
                println!("Player 1 wins!");
                break;
            }
            GameState::PlayerTwoWin => {
                board.display().expect("Failed to draw board!");
                println!("Solver wins!");
                break;
            }
            GameState::Draw => {
                board.display().expect("Failed to draw board!");
                println!("Draw!");
                break;
            }
        }
    }
}
