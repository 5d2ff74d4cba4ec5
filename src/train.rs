//! Weight lifecycle exercise: predict on random boards, then persist.
//!
//! There is no learning step here. The episodes only check that the network
//! produces finite predictions before the weights are written back.

use log::info;
use rand::Rng;
use serde::Serialize;

use crate::encoder::EncodedState;
use crate::eval::{ScoreError, ScoreFn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeReport {
    pub episode: usize,
    pub prediction: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub mean_prediction: f32,
    pub min_prediction: f32,
    pub max_prediction: f32,
}

/// Uniform [0, 1) values in every cell, like a noisy board.
pub fn random_board<R: Rng + ?Sized>(rng: &mut R) -> EncodedState {
    EncodedState::from_fn(|_| rng.gen::<f32>())
}

pub fn run_episodes<S, R, F>(scorer: &S, episodes: usize, rng: &mut R, mut on_episode: F) -> Result<Vec<EpisodeReport>, ScoreError>
where
    S: ScoreFn + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(&EpisodeReport),
{
    let mut reports = Vec::with_capacity(episodes);
    for episode in 1..=episodes {
        let board = random_board(rng);
        let prediction = scorer.score(&board)?;
        let report = EpisodeReport { episode, prediction };
        info!("episode {}, prediction {:.6}", episode, prediction);
        on_episode(&report);
        reports.push(report);
    }
    Ok(reports)
}

pub fn summarize(reports: &[EpisodeReport]) -> TrainingSummary {
    let n = reports.len();
    let preds = reports.iter().map(|r| r.prediction);
    let min_prediction = preds.clone().fold(f32::INFINITY, f32::min);
    let max_prediction = preds.clone().fold(f32::NEG_INFINITY, f32::max);
    let mean_prediction = if n > 0 { preds.sum::<f32>() / n as f32 } else { 0.0 };
    TrainingSummary {
        episodes: n,
        mean_prediction,
        min_prediction: if n > 0 { min_prediction } else { 0.0 },
        max_prediction: if n > 0 { max_prediction } else { 0.0 },
    }
}
