use cozy_chess::{Board, Color, Piece, Square};
use thiserror::Error;

pub const RANKS: usize = 8;
pub const FILES: usize = 8;
pub const CHANNELS: usize = 12;
pub const STATE_LEN: usize = RANKS * FILES * CHANNELS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("encoded state needs {expected} values, got {got}")]
pub struct ShapeError {
    pub expected: usize,
    pub got: usize,
}

/// 8x8x12 piece planes laid out `[rank][file][channel]`, rank 0 = first rank.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedState {
    values: Vec<f32>,
}

impl EncodedState {
    pub fn zeros() -> Self { Self { values: vec![0.0; STATE_LEN] } }

    pub fn from_fn<F: FnMut(usize) -> f32>(f: F) -> Self {
        Self { values: (0..STATE_LEN).map(f).collect() }
    }

    /// Raw input, e.g. the training stub's random boards.
    pub fn from_values(values: Vec<f32>) -> Result<Self, ShapeError> {
        if values.len() != STATE_LEN {
            return Err(ShapeError { expected: STATE_LEN, got: values.len() });
        }
        Ok(Self { values })
    }

    #[inline]
    pub fn offset(rank: usize, file: usize, channel: usize) -> usize {
        (rank * FILES + file) * CHANNELS + channel
    }

    /// `None` when any coordinate is out of range.
    pub fn get(&self, rank: usize, file: usize, channel: usize) -> Option<f32> {
        if rank >= RANKS || file >= FILES || channel >= CHANNELS { return None; }
        self.values.get(Self::offset(rank, file, channel)).copied()
    }

    pub fn as_slice(&self) -> &[f32] { &self.values }

    pub fn count_set(&self) -> usize { self.values.iter().filter(|&&v| v != 0.0).count() }
}

/// Channel for a piece: kind (pawn..king) plus 6 for Black.
pub fn plane_index(piece: Piece, color: Color) -> usize {
    let base = match piece {
        Piece::Pawn => 0,
        Piece::Knight => 1,
        Piece::Bishop => 2,
        Piece::Rook => 3,
        Piece::Queen => 4,
        Piece::King => 5,
    };
    base + if color == Color::Black { 6 } else { 0 }
}

/// Encodes an arbitrary placement, including an empty one.
pub fn encode_placement<I>(pieces: I) -> EncodedState
where
    I: IntoIterator<Item = (Square, Piece, Color)>,
{
    let mut state = EncodedState::zeros();
    for (sq, piece, color) in pieces {
        let idx = EncodedState::offset(sq.rank() as usize, sq.file() as usize, plane_index(piece, color));
        state.values[idx] = 1.0;
    }
    state
}

pub fn encode_position(board: &Board) -> EncodedState {
    let occupied = board.occupied();
    encode_placement(occupied.into_iter().filter_map(|sq| {
        board.piece_on(sq).zip(board.color_on(sq)).map(|(p, c)| (sq, p, c))
    }))
}
