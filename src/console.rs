use std::io::{BufRead, Write};

use anyhow::Result;

use crate::board::notation::{color_name, display_move};
use crate::board::render::render_text;
use crate::board::MoveInputError;
use crate::eval::ScoreFn;
use crate::game::{Game, TurnState};

/// Plays one game over text streams. Returns when the game ends, the human
/// quits, or input runs out.
pub fn run<S, R, W>(game: &mut Game<S>, mut input: R, out: &mut W) -> Result<()>
where
    S: ScoreFn,
    R: BufRead,
    W: Write,
{
    writeln!(out, "You play {}. Enter moves like e2e4 or e7e8q, 'resign' or 'quit'.", color_name(game.human()))?;
    loop {
        match game.state() {
            TurnState::GameOver => {
                writeln!(out, "\n{}", render_text(game.position().board()))?;
                let transcript = game.transcript();
                if !transcript.is_empty() { writeln!(out, "Moves: {}", transcript)?; }
                match game.outcome() {
                    Some(o) => writeln!(out, "Game over: {}", o.describe())?,
                    None => writeln!(out, "Game over: {}", game.result())?,
                }
                return Ok(());
            }
            TurnState::AwaitingHuman => {
                writeln!(out, "\n{}'s turn", color_name(game.position().side_to_move()))?;
                write!(out, "{}", render_text(game.position().board()))?;
                write!(out, "Your move: ")?;
                out.flush()?;
                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    writeln!(out, "\nInput closed, leaving the game.")?;
                    return Ok(());
                }
                let text = line.trim();
                match text {
                    "" => continue,
                    "quit" | "exit" => {
                        writeln!(out, "Thanks for playing!")?;
                        return Ok(());
                    }
                    "resign" => {
                        game.resign();
                        continue;
                    }
                    _ => {}
                }
                match game.submit_human(text) {
                    Ok(applied) => writeln!(out, "You play {}", applied.san)?,
                    Err(e @ MoveInputError::Malformed(_)) => writeln!(out, "Invalid move format! {}", e)?,
                    Err(MoveInputError::Illegal(m)) => {
                        let legal: Vec<String> = game
                            .position()
                            .legal_moves()
                            .into_iter()
                            .map(|mv| display_move(game.position().board(), mv))
                            .collect();
                        writeln!(out, "Illegal move: {}. Legal moves are: {}", m, legal.join(" "))?;
                    }
                    Err(e) => writeln!(out, "{}", e)?,
                }
            }
            TurnState::AwaitingAi => {
                writeln!(out, "Thinking...")?;
                out.flush()?;
                // a scoring failure ends the session with the error
                if let Some(ai) = game.play_ai()? {
                    writeln!(out, "Computer plays: {} ({}), score {:.4} over {} moves",
                        ai.applied.uci, ai.applied.san, ai.score, ai.candidates)?;
                }
            }
        }
    }
}
