//! Coordinate notation and SAN on top of cozy-chess.
//!
//! cozy-chess encodes castling as the king capturing its own rook
//! (`e1h1`). Text seen by players always uses the king's target square
//! (`e1g1`), so every conversion between the two goes through here.

use cozy_chess::{Board, Color, File, Move, Piece, Rank, Square};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveInputError {
    #[error("invalid move format '{0}', use coordinate notation like e2e4 or e7e8q")]
    Malformed(String),
    #[error("illegal move: {0}")]
    Illegal(String),
    #[error("it is not the human's turn")]
    NotYourTurn,
    #[error("the game is already over")]
    GameOver,
}

/// All legal moves in generation order.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    board.generate_moves(|ml| {
        moves.extend(ml);
        false
    });
    moves
}

pub fn file_char(file: File) -> char { (b'a' + file as u8) as char }

pub fn rank_char(rank: Rank) -> char { (b'1' + rank as u8) as char }

pub fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

fn square_str(sq: Square) -> String {
    format!("{}{}", file_char(sq.file()), rank_char(sq.rank()))
}

pub fn is_castle(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King) && board.colors(board.side_to_move()).has(mv.to)
}

/// Coordinate notation with castling written as the king's destination.
pub fn display_move(board: &Board, mv: Move) -> String {
    let to = if is_castle(board, mv) {
        let file = if mv.to.file() as u8 > mv.from.file() as u8 { File::G } else { File::C };
        Square::new(file, mv.from.rank())
    } else {
        mv.to
    };
    let mut out = square_str(mv.from);
    out.push_str(&square_str(to));
    if let Some(p) = mv.promotion { out.push(piece_char(p)); }
    out
}

fn parse_square(s: &str) -> Option<Square> {
    let b = s.as_bytes();
    if b.len() != 2 { return None; }
    let file = b[0].to_ascii_lowercase();
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&b[1]) { return None; }
    Some(Square::new(File::index((file - b'a') as usize), Rank::index((b[1] - b'1') as usize)))
}

/// Syntax only: `<from><to>[promotion]`. Says nothing about legality.
pub fn parse_coordinates(text: &str) -> Option<Move> {
    if !text.is_ascii() || !(4..=5).contains(&text.len()) { return None; }
    let from = parse_square(&text[0..2])?;
    let to = parse_square(&text[2..4])?;
    let promotion = match text.as_bytes().get(4).map(|c| c.to_ascii_lowercase()) {
        None => None,
        Some(b'n') => Some(Piece::Knight),
        Some(b'b') => Some(Piece::Bishop),
        Some(b'r') => Some(Piece::Rook),
        Some(b'q') => Some(Piece::Queen),
        Some(_) => return None,
    };
    if from == to { return None; }
    Some(Move { from, to, promotion })
}

// King two files sideways with castle rights on that wing becomes king-takes-rook.
fn to_rules_castle(board: &Board, mv: Move) -> Move {
    let stm = board.side_to_move();
    let is_own_king = board.piece_on(mv.from) == Some(Piece::King) && board.color_on(mv.from) == Some(stm);
    if !is_own_king || mv.promotion.is_some() || mv.from.rank() != mv.to.rank() {
        return mv;
    }
    let delta = mv.to.file() as i8 - mv.from.file() as i8;
    let rights = board.castle_rights(stm);
    let rook_file = match delta {
        2 => rights.short,
        -2 => rights.long,
        _ => None,
    };
    match rook_file {
        Some(file) => Move { from: mv.from, to: Square::new(file, mv.from.rank()), promotion: None },
        None => mv,
    }
}

/// Parses player text and checks it against the legal move set.
pub fn parse_move(board: &Board, text: &str) -> Result<Move, MoveInputError> {
    let text = text.trim();
    let mv = parse_coordinates(text).ok_or_else(|| MoveInputError::Malformed(text.to_string()))?;
    let mv = to_rules_castle(board, mv);
    if legal_moves(board).contains(&mv) { Ok(mv) } else { Err(MoveInputError::Illegal(text.to_string())) }
}

/// Standard algebraic notation for a legal move, including check and mate suffixes.
pub fn san(board: &Board, mv: Move) -> String {
    let mut out = if is_castle(board, mv) {
        if mv.to.file() as u8 > mv.from.file() as u8 { "O-O".to_string() } else { "O-O-O".to_string() }
    } else {
        let Some(piece) = board.piece_on(mv.from) else { return display_move(board, mv) };
        let capture = board.colors(!board.side_to_move()).has(mv.to)
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());
        let mut s = String::new();
        if piece == Piece::Pawn {
            if capture {
                s.push(file_char(mv.from.file()));
                s.push('x');
            }
            s.push_str(&square_str(mv.to));
            if let Some(p) = mv.promotion {
                s.push('=');
                s.push(piece_char(p).to_ascii_uppercase());
            }
        } else {
            s.push(piece_char(piece).to_ascii_uppercase());
            s.push_str(&disambiguation(board, mv, piece));
            if capture { s.push('x'); }
            s.push_str(&square_str(mv.to));
        }
        s
    };
    let mut child = board.clone();
    child.play(mv);
    if !child.checkers().is_empty() {
        out.push(if legal_moves(&child).is_empty() { '#' } else { '+' });
    }
    out
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|m| m.to == mv.to && m.from != mv.from && board.piece_on(m.from) == Some(piece))
        .map(|m| m.from)
        .collect();
    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        file_char(mv.from.file()).to_string()
    } else if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        rank_char(mv.from.rank()).to_string()
    } else {
        square_str(mv.from)
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}
