use anyhow::Result;
use clap::{Args, Parser};
use cozy_chess::Color;
use std::path::PathBuf;

use crate::network::DEFAULT_WEIGHTS_PATH;

/// Where the weights live. Every binary takes this.
#[derive(Args, Debug, Clone)]
pub struct WeightsArgs {
    /// Path to the value network weights
    #[arg(long, default_value = DEFAULT_WEIGHTS_PATH)]
    pub weights: PathBuf,
}

/// Weights plus a seed, for binaries that may start from random weights.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    #[command(flatten)]
    pub weights: WeightsArgs,

    /// Seed for random initialization when no weights exist
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(name = "valuebot", version, about = "Play chess against the value network in the terminal", long_about = None)]
pub struct ConsoleArgs {
    #[command(flatten)]
    pub model: WeightsArgs,

    /// Your color: 'w' for white, 'b' for black
    #[arg(long, default_value = "w")]
    pub color: String,

    /// Starting FEN position
    #[arg(long)]
    pub fen: Option<String>,
}

#[derive(Parser, Debug)]
#[command(name = "valuebot-web", about = "Serve a browser game against the value network")]
pub struct WebArgs {
    #[command(flatten)]
    pub model: WeightsArgs,

    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Human color: 'w' or 'b'
    #[arg(long, default_value = "w")]
    pub color: String,
}

#[derive(Parser, Debug)]
#[command(name = "valuebot-train", about = "Run prediction episodes on random boards and save the weights")]
pub struct TrainArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, default_value_t = 10)]
    pub episodes: usize,
}

pub fn parse_color(color_str: &str) -> Result<Color> {
    match color_str.to_lowercase().as_str() {
        "w" | "white" => Ok(Color::White),
        "b" | "black" => Ok(Color::Black),
        _ => anyhow::bail!("Invalid color: use 'w' or 'b'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_only_where_weights_may_be_fresh() {
        assert!(ConsoleArgs::try_parse_from(["valuebot", "--seed", "3"]).is_err());
        assert!(WebArgs::try_parse_from(["valuebot-web", "--seed", "3"]).is_err());
        let t = TrainArgs::try_parse_from(["valuebot-train", "--seed", "3", "--weights", "w.bin"]).unwrap();
        assert_eq!(t.model.seed, Some(3));
        assert_eq!(t.model.weights.weights, PathBuf::from("w.bin"));
        assert_eq!(t.episodes, 10);
    }

    #[test]
    fn defaults() {
        let c = ConsoleArgs::try_parse_from(["valuebot"]).unwrap();
        assert_eq!(c.model.weights, PathBuf::from(DEFAULT_WEIGHTS_PATH));
        assert_eq!(parse_color(&c.color).unwrap(), Color::White);
        let w = WebArgs::try_parse_from(["valuebot-web", "--color", "black"]).unwrap();
        assert_eq!(w.bind, "127.0.0.1:8080");
        assert_eq!(parse_color(&w.color).unwrap(), Color::Black);
        assert!(parse_color("green").is_err());
    }
}
