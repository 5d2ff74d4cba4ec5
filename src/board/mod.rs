pub mod cozy;
pub mod notation;
pub mod outcome;
pub mod render;

pub use cozy::{FenError, Position};
pub use notation::{legal_moves, MoveInputError};
pub use outcome::{Outcome, Termination};
