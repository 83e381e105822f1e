//! The table: the current question card and the submitted entries.

use crate::cards::{Card, CardCollection};
use crate::core::Identity;

/// One player's submission for the round.
///
/// Cards are kept together with the hand index each one occupied before
/// being played, so a pick change can put them back exactly where they were
/// and the replacement indices mean the same thing they did the first time.
#[derive(Clone, Debug)]
pub struct Entry {
    /// Who played it. Scoring key; the display name is resolved at
    /// announcement time so it survives renames.
    pub owner: Identity,
    /// Played cards with their original hand positions, in pick order.
    pub picks: Vec<(usize, Card)>,
}

impl Entry {
    /// The played cards, in pick order.
    #[must_use]
    pub fn cards(&self) -> Vec<&Card> {
        self.picks.iter().map(|(_, card)| card).collect()
    }
}

/// Cards in play for the current round.
#[derive(Clone, Debug, Default)]
pub struct Table {
    /// The question being answered, if a round is underway.
    pub question: Option<Card>,
    /// Entries in submission order.
    pub entries: Vec<Entry>,
}

impl Table {
    /// Position of `identity`'s entry, if they have played this round.
    #[must_use]
    pub fn entry_position(&self, identity: &Identity) -> Option<usize> {
        self.entries.iter().position(|e| &e.owner == identity)
    }

    /// Move every card on the table into the given discard collections.
    /// Leaves the table empty.
    pub fn sweep(&mut self, call_discard: &mut CardCollection, response_discard: &mut CardCollection) {
        if let Some(question) = self.question.take() {
            call_discard.discard(question);
        }
        for entry in self.entries.drain(..) {
            for (_, card) in entry.picks {
                response_discard.discard(card);
            }
        }
    }
}
