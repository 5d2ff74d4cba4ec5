//! The scoring boundary between move selection and whatever produces scores.
//!
//! Scores are from White's point of view: higher is better for White.

use crate::encoder::EncodedState;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("scoring produced a non-finite value: {0}")]
    NonFinite(f32),
    #[error("scoring backend failed: {0}")]
    Backend(String),
}

pub trait ScoreFn {
    fn score(&self, state: &EncodedState) -> Result<f32, ScoreError>;

    /// Scores in input order. Implementations may batch or fan out, but the
    /// i-th result always belongs to the i-th state.
    fn score_batch(&self, states: &[EncodedState]) -> Result<Vec<f32>, ScoreError> {
        states.iter().map(|s| self.score(s)).collect()
    }
}

impl<T: ScoreFn + ?Sized> ScoreFn for &T {
    fn score(&self, state: &EncodedState) -> Result<f32, ScoreError> { (**self).score(state) }
    fn score_batch(&self, states: &[EncodedState]) -> Result<Vec<f32>, ScoreError> { (**self).score_batch(states) }
}

impl<T: ScoreFn + ?Sized> ScoreFn for Arc<T> {
    fn score(&self, state: &EncodedState) -> Result<f32, ScoreError> { (**self).score(state) }
    fn score_batch(&self, states: &[EncodedState]) -> Result<Vec<f32>, ScoreError> { (**self).score_batch(states) }
}

pub(crate) fn check_finite(v: f32) -> Result<f32, ScoreError> {
    if v.is_finite() { Ok(v) } else { Err(ScoreError::NonFinite(v)) }
}
