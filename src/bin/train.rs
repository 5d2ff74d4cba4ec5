use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use valuebot::config::TrainArgs;
use valuebot::network::{load_or_init, WeightsOrigin};
use valuebot::train::{run_episodes, summarize};

fn main() -> Result<()> {
    env_logger::init();
    let a = TrainArgs::parse();
    let weights = &a.model.weights.weights;
    let (net, origin) = load_or_init(weights, a.model.seed)
        .with_context(|| format!("load weights from {}", weights.display()))?;
    match origin {
        WeightsOrigin::Loaded => eprintln!("Model found, loaded weights from {}", weights.display()),
        WeightsOrigin::Fresh => eprintln!("No model file found, starting with random weights"),
    }

    let mut rng = match a.model.seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_entropy(),
    };
    let pb = ProgressBar::new(a.episodes as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
    let reports = run_episodes(&net, a.episodes, &mut rng, |r| {
        pb.set_message(format!("prediction {:.6}", r.prediction));
        pb.inc(1);
    })?;
    pb.finish_and_clear();
    for r in &reports {
        eprintln!("Episode {}, Prediction: {:.6}", r.episode, r.prediction);
    }
    println!("{}", serde_json::to_string(&summarize(&reports))?);

    net.save(weights)?;
    eprintln!("Model saved to: {}", weights.display());
    Ok(())
}
