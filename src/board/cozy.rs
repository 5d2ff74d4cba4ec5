use cozy_chess::{Board as CozyBoard, Color, FenParseError, Move, Piece};
use thiserror::Error;

use crate::board::notation::{self, MoveInputError};
use crate::board::outcome::{self, Outcome, Termination};

#[derive(Debug, Error)]
#[error("invalid FEN '{fen}': {reason}")]
pub struct FenError {
    pub fen: String,
    pub reason: FenParseError,
}

/// A board plus the game history the rules need: repetition hashes,
/// the move stack with its SAN, the quiet-ply count, and a resignation if
/// one happened.
#[derive(Clone, Debug)]
pub struct Position {
    start: CozyBoard,
    board: CozyBoard,
    moves: Vec<Move>,
    san: Vec<String>,
    hashes: Vec<u64>,
    // cozy-chess caps its own halfmove clock at 100
    quiet_plies: u32,
    resigned: Option<Color>,
}

impl Position {
    pub fn new(board: CozyBoard) -> Self {
        let hashes = vec![board.hash()];
        let quiet_plies = u32::from(board.halfmove_clock());
        Self { start: board.clone(), board, moves: Vec::new(), san: Vec::new(), hashes, quiet_plies, resigned: None }
    }

    pub fn startpos() -> Self { Self::new(CozyBoard::default()) }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        CozyBoard::from_fen(fen, false)
            .map(Self::new)
            .map_err(|reason| FenError { fen: fen.to_string(), reason })
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    pub fn legal_moves(&self) -> Vec<Move> { notation::legal_moves(&self.board) }

    pub fn moves(&self) -> &[Move] { &self.moves }

    pub fn fen(&self) -> String { format!("{}", self.board) }

    pub fn parse_move(&self, text: &str) -> Result<Move, MoveInputError> {
        notation::parse_move(&self.board, text)
    }

    /// Plays a legal move and returns its SAN. Anything outside the legal set is rejected untouched.
    pub fn play(&mut self, mv: Move) -> Result<String, MoveInputError> {
        if self.is_game_over() { return Err(MoveInputError::GameOver); }
        if !self.legal_moves().contains(&mv) {
            return Err(MoveInputError::Illegal(notation::display_move(&self.board, mv)));
        }
        let san = notation::san(&self.board, mv);
        let irreversible = self.board.piece_on(mv.from) == Some(Piece::Pawn)
            || self.board.colors(!self.board.side_to_move()).has(mv.to);
        self.quiet_plies = if irreversible { 0 } else { self.quiet_plies + 1 };
        self.board.play(mv);
        self.moves.push(mv);
        self.san.push(san.clone());
        self.hashes.push(self.board.hash());
        Ok(san)
    }

    pub fn play_uci(&mut self, mv_uci: &str) -> Result<String, MoveInputError> {
        let mv = self.parse_move(mv_uci)?;
        self.play(mv)
    }

    pub fn set_from_start_and_moves(moves: &[String]) -> Result<Self, MoveInputError> {
        let mut pos = Self::startpos();
        for m in moves { pos.play_uci(m)?; }
        Ok(pos)
    }

    pub fn resign(&mut self, side: Color) {
        if !self.is_game_over() { self.resigned = Some(side); }
    }

    /// Half-moves since the last capture or pawn move.
    pub fn quiet_plies(&self) -> u32 { self.quiet_plies }

    pub fn repetitions(&self) -> usize {
        let current = self.board.hash();
        self.hashes.iter().filter(|&&h| h == current).count()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if let Some(loser) = self.resigned {
            return Some(Outcome { termination: Termination::Resignation, winner: Some(!loser) });
        }
        let has_moves = !self.legal_moves().is_empty();
        if let Some(o) = outcome::board_outcome(&self.board, has_moves) { return Some(o); }
        if self.quiet_plies >= outcome::SEVENTY_FIVE_MOVE_PLIES {
            return Some(Outcome { termination: Termination::SeventyFiveMoves, winner: None });
        }
        if self.repetitions() >= outcome::FIVEFOLD {
            return Some(Outcome { termination: Termination::FivefoldRepetition, winner: None });
        }
        None
    }

    pub fn is_game_over(&self) -> bool { self.outcome().is_some() }

    pub fn result(&self) -> &'static str {
        self.outcome().map(|o| o.result()).unwrap_or("*")
    }

    /// Numbered SAN transcript from the starting position, e.g. `1. e4 e5 2. Nf3`.
    pub fn variation_san(&self) -> String {
        let mut out = String::new();
        let mut number = self.start.fullmove_number();
        let mut stm = self.start.side_to_move();
        for (i, san) in self.san.iter().enumerate() {
            if stm == Color::White {
                if !out.is_empty() { out.push(' '); }
                out.push_str(&format!("{number}. "));
            } else if i == 0 {
                out.push_str(&format!("{number}... "));
            } else {
                out.push(' ');
            }
            out.push_str(san);
            if stm == Color::Black { number += 1; }
            stm = !stm;
        }
        out
    }
}
