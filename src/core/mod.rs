//! Core types: identity, players, configuration, RNG.

pub mod config;
pub mod identity;
pub mod player;
pub mod rng;

pub use config::GameConfig;
pub use identity::Identity;
pub use player::Player;
pub use rng::GameRng;
