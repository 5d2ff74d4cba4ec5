use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::sync::Arc;
use valuebot::config::{parse_color, ConsoleArgs};
use valuebot::console;
use valuebot::game::{Game, GameConfig};
use valuebot::network::load_required;

fn main() -> Result<()> {
    env_logger::init();
    let args = ConsoleArgs::parse();
    let human = parse_color(&args.color)?;

    // No game starts without trained weights.
    let weights = &args.model.weights;
    println!("Loading model from: {}", weights.display());
    let net = load_required(weights)
        .with_context(|| format!("cannot start a game without weights at {}", weights.display()))?;
    println!("Model loaded successfully!");

    let config = GameConfig { human, fen: args.fen };
    let mut game = Game::new(config, Arc::new(net)).context("Invalid FEN string")?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    console::run(&mut game, stdin.lock(), &mut stdout)
}
