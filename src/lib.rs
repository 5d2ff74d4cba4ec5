// One-ply greedy chess over a small value network
pub mod board;
pub mod config;
pub mod console;
pub mod encoder;
pub mod eval;
pub mod game;
pub mod network;
pub mod search;
pub mod train;
pub mod web;
