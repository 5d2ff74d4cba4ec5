use cozy_chess::{Board, Color, File, Rank, Square};
use crate::board::notation::{file_char, piece_char, rank_char};

/// Letter for the piece on `sq`, uppercase for White, `.` when empty.
pub fn square_symbol(board: &Board, sq: Square) -> char {
    match (board.piece_on(sq), board.color_on(sq)) {
        (Some(p), Some(Color::White)) => piece_char(p).to_ascii_uppercase(),
        (Some(p), Some(Color::Black)) => piece_char(p),
        _ => '.',
    }
}

/// Text grid, rank 8 on top, with rank and file labels.
pub fn render_text(board: &Board) -> String {
    let mut out = String::from("  +-----------------+\n");
    for rank in Rank::ALL.iter().rev() {
        out.push(rank_char(*rank));
        out.push_str(" |");
        for file in File::ALL {
            out.push(' ');
            out.push(square_symbol(board, Square::new(file, *rank)));
        }
        out.push_str(" |\n");
    }
    out.push_str("  +-----------------+\n   ");
    for file in File::ALL {
        out.push(' ');
        out.push(file_char(file));
    }
    out.push('\n');
    out
}
