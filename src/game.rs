use cozy_chess::{Color, Move};
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::board::notation::display_move;
use crate::board::{FenError, MoveInputError, Outcome, Position};
use crate::eval::ScoreFn;
use crate::search::{MoveSelector, SelectError, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnState {
    AwaitingHuman,
    AwaitingAi,
    GameOver,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("cannot start from this position: {0}")]
    Fen(#[from] FenError),
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub human: Color,
    pub fen: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self { Self { human: Color::White, fen: None } }
}

/// A move that was applied, in coordinate notation and SAN.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMove {
    pub mv: Move,
    pub uci: String,
    pub san: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiMove {
    pub applied: AppliedMove,
    pub score: f32,
    pub candidates: usize,
}

/// Alternates human input and greedy AI replies until the rules report the end.
#[derive(Debug, Clone)]
pub struct Game<S> {
    config: GameConfig,
    start: Position,
    position: Position,
    selector: MoveSelector<S>,
    state: TurnState,
    last_applied: Option<AppliedMove>,
    // set when the selector found nothing to play although the rules saw no end
    stalled: bool,
}

impl<S: ScoreFn> Game<S> {
    pub fn new(config: GameConfig, scorer: S) -> Result<Self, GameError> {
        let start = match &config.fen {
            Some(fen) => Position::from_fen(fen)?,
            None => Position::startpos(),
        };
        let mut game = Self {
            config,
            position: start.clone(),
            start,
            selector: MoveSelector::new(scorer),
            state: TurnState::GameOver,
            last_applied: None,
            stalled: false,
        };
        game.refresh_state();
        Ok(game)
    }

    fn refresh_state(&mut self) {
        self.state = if self.stalled || self.position.is_game_over() {
            TurnState::GameOver
        } else if self.position.side_to_move() == self.config.human {
            TurnState::AwaitingHuman
        } else {
            TurnState::AwaitingAi
        };
        if self.state == TurnState::GameOver {
            info!("game over: {}", self.position.result());
        }
    }

    pub fn state(&self) -> TurnState { self.state }

    pub fn is_over(&self) -> bool { self.state == TurnState::GameOver }

    pub fn human(&self) -> Color { self.config.human }

    pub fn position(&self) -> &Position { &self.position }

    pub fn last_applied(&self) -> Option<&AppliedMove> { self.last_applied.as_ref() }

    pub fn outcome(&self) -> Option<Outcome> { self.position.outcome() }

    pub fn result(&self) -> &'static str { self.position.result() }

    pub fn transcript(&self) -> String { self.position.variation_san() }

    fn apply(&mut self, mv: Move) -> Result<AppliedMove, MoveInputError> {
        let uci = display_move(self.position.board(), mv);
        let san = self.position.play(mv)?;
        let applied = AppliedMove { mv, uci, san };
        self.last_applied = Some(applied.clone());
        self.refresh_state();
        Ok(applied)
    }

    /// Parses and plays the human's move. Rejected input leaves the game untouched.
    pub fn submit_human(&mut self, text: &str) -> Result<AppliedMove, MoveInputError> {
        match self.state {
            TurnState::GameOver => return Err(MoveInputError::GameOver),
            TurnState::AwaitingAi => return Err(MoveInputError::NotYourTurn),
            TurnState::AwaitingHuman => {}
        }
        let mv = self.position.parse_move(text).map_err(|e| {
            warn!("rejected human move: {e}");
            e
        })?;
        self.apply(mv)
    }

    /// Runs one AI turn. `Ok(None)` when there was nothing to do or the game ended.
    pub fn play_ai(&mut self) -> Result<Option<AiMove>, SelectError> {
        if self.state != TurnState::AwaitingAi { return Ok(None); }
        let Some(Selection { mv, score, candidates }) = self.selector.select(self.position.board())? else {
            warn!("selector found no move in a position the rules consider live");
            self.stalled = true;
            self.refresh_state();
            return Ok(None);
        };
        let applied = self.apply(mv).map_err(|e| {
            warn!("selected move was rejected: {e}");
            SelectError::Rejected(e)
        })?;
        info!("ai plays {} ({}) score {:.4}", applied.uci, applied.san, score);
        Ok(Some(AiMove { applied, score, candidates }))
    }

    /// The human gives up; only while the game is live.
    pub fn resign(&mut self) -> bool {
        if self.is_over() { return false; }
        self.position.resign(self.config.human);
        self.refresh_state();
        true
    }

    pub fn reset(&mut self) {
        self.position = self.start.clone();
        self.last_applied = None;
        self.stalled = false;
        self.refresh_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ValueNet;

    #[test]
    fn rejected_ai_move_keeps_its_cause() {
        let config = GameConfig { human: Color::Black, fen: None };
        let mut game = Game::new(config, ValueNet::seeded(4)).unwrap();
        assert_eq!(game.state(), TurnState::AwaitingAi);
        // end the game behind the state machine's back
        game.position.resign(Color::White);
        let err = game.play_ai().unwrap_err();
        assert_eq!(err, SelectError::Rejected(MoveInputError::GameOver));
        assert!(game.position().moves().is_empty());
    }
}
