//! Ordered card piles.
//!
//! `CardCollection` is the ordered, shuffleable sequence used for hands,
//! draw piles, discard piles and table entries. Cards only ever move between
//! collections; no path clones or drops a card, which keeps the game-wide
//! card multiset constant.
//!
//! `DeckPair` couples a draw pile with its discard pile and recycles the
//! discard back into the draw pile when a draw would otherwise fall short.

use log::info;
use thiserror::Error;

use super::Card;
use crate::core::GameRng;

/// A draw that cannot be satisfied even after recycling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("requested {requested} cards but only {available} remain")]
pub struct DrawError {
    /// Cards asked for.
    pub requested: usize,
    /// Cards actually available.
    pub available: usize,
}

/// Ordered sequence of cards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardCollection {
    cards: Vec<Card>,
}

impl CardCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection from existing cards.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Number of cards held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Is the collection empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over the cards in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    /// Get a card by position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// In-place uniform random permutation.
    pub fn shuffle(&mut self, rng: &mut GameRng) {
        rng.shuffle(&mut self.cards);
    }

    /// Remove and return the first `n` cards.
    ///
    /// Fails without removing anything if fewer than `n` remain.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, DrawError> {
        if self.cards.len() < n {
            return Err(DrawError {
                requested: n,
                available: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..n).collect())
    }

    /// Append a card, clearing any owner reference.
    pub fn discard(&mut self, mut card: Card) {
        card.owner = None;
        self.cards.push(card);
    }

    /// Append many cards, clearing owner references.
    pub fn discard_all(&mut self, cards: impl IntoIterator<Item = Card>) {
        for card in cards {
            self.discard(card);
        }
    }

    /// Append a card keeping its owner reference (dealing into a hand).
    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Insert a card at a position, clamped to the current length.
    pub fn insert(&mut self, index: usize, card: Card) {
        let index = index.min(self.cards.len());
        self.cards.insert(index, card);
    }

    /// Remove the cards at `indices`, returned in the order given along with
    /// the position each occupied before any removal.
    ///
    /// Returns `None` if any index is out of range or indices repeat; the
    /// collection is unchanged in that case.
    pub fn take_indices(&mut self, indices: &[usize]) -> Option<Vec<(usize, Card)>> {
        if indices.iter().any(|&i| i >= self.cards.len()) {
            return None;
        }
        let mut seen = indices.to_vec();
        seen.sort_unstable();
        if seen.windows(2).any(|w| w[0] == w[1]) {
            return None;
        }

        let taken: Vec<(usize, Card)> = indices
            .iter()
            .map(|&i| (i, self.cards[i].clone()))
            .collect();
        // Remove from the back so earlier indices stay valid.
        for &i in seen.iter().rev() {
            self.cards.remove(i);
        }
        Some(taken)
    }

    /// Move every card out, leaving the collection empty.
    pub fn drain_all(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.cards)
    }
}

impl IntoIterator for CardCollection {
    type Item = Card;
    type IntoIter = std::vec::IntoIter<Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

impl<'a> IntoIterator for &'a CardCollection {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

/// A draw pile and its paired discard pile.
#[derive(Clone, Debug, Default)]
pub struct DeckPair {
    /// Cards available to draw.
    pub pile: CardCollection,
    /// Cards discarded since the last recycle.
    pub discard: CardCollection,
    /// Label used in log lines ("call" / "response").
    label: &'static str,
}

impl DeckPair {
    /// Create a deck pair from a shuffled pile.
    #[must_use]
    pub fn new(label: &'static str, mut cards: Vec<Card>, rng: &mut GameRng) -> Self {
        rng.shuffle(&mut cards);
        Self {
            pile: CardCollection::from_cards(cards),
            discard: CardCollection::new(),
            label,
        }
    }

    /// Cards across both piles.
    #[must_use]
    pub fn total(&self) -> usize {
        self.pile.len() + self.discard.len()
    }

    /// Draw `n` cards, recycling the discard pile into the draw pile first
    /// if the pile alone cannot satisfy the draw. The retry happens once;
    /// a second shortfall is an error and the piles are left as recycled.
    pub fn draw(&mut self, n: usize, rng: &mut GameRng) -> Result<Vec<Card>, DrawError> {
        if self.pile.len() < n && !self.discard.is_empty() {
            info!(
                "recycling {} discarded {} cards into the deck",
                self.discard.len(),
                self.label
            );
            let mut recycled = self.discard.drain_all();
            rng.shuffle(&mut recycled);
            for card in recycled {
                self.pile.add(card);
            }
        }
        self.pile.draw(n)
    }
}
