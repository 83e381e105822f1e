//! Card model: immutable cards, ordered collections, paired decks.

pub mod card;
pub mod collection;
pub mod stock;

pub use card::{Card, CardType, Fragments};
pub use collection::{CardCollection, DeckPair, DrawError};
pub use stock::CardStock;
