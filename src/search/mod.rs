pub mod greedy;

pub use greedy::{select_move, MoveSelector, SelectError, Selection};
