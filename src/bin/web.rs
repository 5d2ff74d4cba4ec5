use anyhow::Result;
use clap::Parser;
use log::error;
use std::sync::Arc;
use valuebot::config::{parse_color, WebArgs};
use valuebot::game::GameConfig;
use valuebot::network::load_required;
use valuebot::web::{serve, AppState, ModelSlot};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let a = WebArgs::parse();
    let human = parse_color(&a.color)?;
    // A missing model is shown to every visitor instead of a game.
    let model = match load_required(&a.model.weights) {
        Ok(net) => ModelSlot::Ready(Arc::new(net)),
        Err(e) => {
            error!("{e}");
            ModelSlot::Unavailable(e.to_string())
        }
    };
    let state = AppState::new(model, GameConfig { human, fen: None })?;
    serve(&a.bind, state).await
}
