//! The game engine: state machine, table, message formatting and delivery.

pub mod format;
pub mod game;
pub mod sink;
pub mod state;
pub mod table;

pub use game::{Game, RemoveOptions, ScoreFlavor};
pub use sink::{MemorySink, MessageSink, SinkMessage};
pub use state::{GameState, PauseSnapshot};
pub use table::{Entry, Table};
