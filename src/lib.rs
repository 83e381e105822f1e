//! A round-based phrase-matching party game engine.
//!
//! Each round one player, the Card Czar, judges: a question card with
//! blanks is announced, every other player fills it from their hand, and
//! the czar picks the winning entry. The engine runs any number of
//! channel-keyed games, each with its own deck, roster, scores and timers.
//!
//! The crate is transport-agnostic and single-threaded: hosts feed player
//! commands into [`registry::Games`], receive finished message lines
//! through an [`engine::MessageSink`], and drive time by calling `tick()`
//! against a [`timers::Clock`] they control. Games are deterministic under
//! a fixed seed.
//!
//! ```
//! use std::rc::Rc;
//!
//! use phrase_czar::cards::CardStock;
//! use phrase_czar::core::{GameConfig, Identity};
//! use phrase_czar::engine::MemorySink;
//! use phrase_czar::registry::Games;
//! use phrase_czar::timers::ManualClock;
//!
//! let sink = Rc::new(MemorySink::new());
//! let clock = Rc::new(ManualClock::new());
//! let mut games = Games::new(
//!     GameConfig::default(),
//!     CardStock::sample(),
//!     sink.clone(),
//!     clock.clone(),
//!     42,
//! );
//!
//! games.start("#play", &Identity::new("alice", "host"), "Alice", None);
//! assert!(games.has_game("#play"));
//! assert!(sink.channel_contains("#play", "Alice has joined the game."));
//! ```

pub mod cards;
pub mod core;
pub mod decks;
pub mod engine;
pub mod registry;
pub mod scoring;
pub mod timers;

pub use cards::{Card, CardCollection, CardStock, CardType, DeckPair, DrawError};
pub use core::{GameConfig, GameRng, Identity, Player};
pub use engine::{Game, GameState, MemorySink, MessageSink};
pub use registry::Games;
pub use scoring::Ledger;
pub use timers::{Clock, ManualClock, SystemClock, TimerKind};
