//! One-ply greedy search: score the position after every legal move and
//! keep the best one for the side to move.
//!
//! Scores are from White's point of view, so White keeps the highest score
//! and Black the lowest. Candidates are visited in cozy-chess generation
//! order and only a strictly better score replaces the incumbent, so ties go
//! to the move generated first.

use cozy_chess::{Board, Color, Move};
use log::debug;
use thiserror::Error;

use crate::board::notation::{display_move, legal_moves};
use crate::board::MoveInputError;
use crate::encoder::{encode_position, EncodedState};
use crate::eval::{ScoreError, ScoreFn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectError {
    #[error("scoring failed during move selection: {0}")]
    Scoring(#[from] ScoreError),
    #[error("scorer returned {got} scores for {expected} candidate moves")]
    BatchSize { expected: usize, got: usize },
    #[error("no move selected from {legal} legal moves")]
    NoSelection { legal: usize },
    #[error("selected move was rejected: {0}")]
    Rejected(MoveInputError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub mv: Move,
    pub score: f32,
    pub candidates: usize,
}

fn improves(side: Color, score: f32, best: f32) -> bool {
    match side {
        Color::White => score > best,
        Color::Black => score < best,
    }
}

/// Picks the extremal move for the side to move. `Ok(None)` when there are no legal moves.
pub fn select_move<S: ScoreFn + ?Sized>(board: &Board, scorer: &S) -> Result<Option<Selection>, SelectError> {
    let moves = legal_moves(board);
    if moves.is_empty() { return Ok(None); }
    let children: Vec<EncodedState> = moves
        .iter()
        .map(|&m| {
            let mut child = board.clone();
            child.play(m);
            encode_position(&child)
        })
        .collect();
    let scores = scorer.score_batch(&children)?;
    if scores.len() != moves.len() {
        return Err(SelectError::BatchSize { expected: moves.len(), got: scores.len() });
    }
    let side = board.side_to_move();
    let mut best: Option<(Move, f32)> = None;
    for (&mv, &score) in moves.iter().zip(&scores) {
        match best {
            Some((_, b)) if !improves(side, score, b) => {}
            _ => best = Some((mv, score)),
        }
    }
    let (mv, score) = best.ok_or(SelectError::NoSelection { legal: moves.len() })?;
    debug!("selected {} (score {:.4}) from {} candidates", display_move(board, mv), score, moves.len());
    Ok(Some(Selection { mv, score, candidates: moves.len() }))
}

/// Move selection bound to one scorer, usually a shared `ValueNet`.
#[derive(Debug, Clone)]
pub struct MoveSelector<S> {
    scorer: S,
}

impl<S: ScoreFn> MoveSelector<S> {
    pub fn new(scorer: S) -> Self { Self { scorer } }

    pub fn select(&self, board: &Board) -> Result<Option<Selection>, SelectError> {
        select_move(board, &self.scorer)
    }
}
