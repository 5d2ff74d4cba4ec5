use cozy_chess::{Board, Color, Piece};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
    Resignation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub termination: Termination,
    pub winner: Option<Color>,
}

impl Outcome {
    pub fn result(&self) -> &'static str {
        match self.winner {
            Some(Color::White) => "1-0",
            Some(Color::Black) => "0-1",
            None => "1/2-1/2",
        }
    }

    pub fn describe(&self) -> String {
        let winner = match self.winner {
            Some(Color::White) => "White wins",
            Some(Color::Black) => "Black wins",
            None => "draw",
        };
        let how = match self.termination {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::InsufficientMaterial => "insufficient material",
            Termination::SeventyFiveMoves => "seventy-five-move rule",
            Termination::FivefoldRepetition => "fivefold repetition",
            Termination::Resignation => "resignation",
        };
        format!("{} by {} ({})", winner, how, self.result())
    }
}

// Half-moves without capture or pawn move that end the game outright.
pub const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;
pub const FIVEFOLD: usize = 5;

/// Neither side can possibly deliver mate: bare kings, a single minor piece,
/// or bishops that all stand on one square colour.
pub fn insufficient_material(board: &Board) -> bool {
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() { return false; }
    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    if knights.len() + bishops.len() <= 1 { return true; }
    if !knights.is_empty() { return false; }
    let mut shades = bishops.into_iter().map(|sq| (sq.file() as u8 + sq.rank() as u8) % 2);
    match shades.next() {
        Some(first) => shades.all(|s| s == first),
        None => true,
    }
}

/// Terminal state of a bare board. The 75-move rule, repetition and
/// resignation need history and are handled by `Position`.
pub fn board_outcome(board: &Board, has_moves: bool) -> Option<Outcome> {
    if !has_moves {
        return Some(if board.checkers().is_empty() {
            Outcome { termination: Termination::Stalemate, winner: None }
        } else {
            Outcome { termination: Termination::Checkmate, winner: Some(!board.side_to_move()) }
        });
    }
    if insufficient_material(board) {
        return Some(Outcome { termination: Termination::InsufficientMaterial, winner: None });
    }
    None
}
