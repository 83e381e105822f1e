//! Card records.
//!
//! Cards are immutable once created, with one exception: the `owner` field
//! is bookkeeping that tracks which seated player currently holds or played
//! the card, and it is cleared whenever the card reaches a discard pile.
//!
//! Call cards ("questions") carry one or more template fragments; the blanks
//! between consecutive fragments are what response cards fill. A call with
//! `n` fragments therefore requires `n - 1` response cards.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::Identity;

/// Fragment storage. Calls rarely have more than three fragments and
/// responses always have exactly one.
pub type Fragments = SmallVec<[String; 3]>;

/// Which side of the game a card belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    /// Prompt card with blanks to fill.
    Call,
    /// Card played to fill a blank.
    Response,
}

/// A single card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Template fragments. Responses hold exactly one.
    pub text: Fragments,

    /// Call or response.
    pub card_type: CardType,

    /// Number of response cards needed to fill this call. Zero for responses.
    pub pick: usize,

    /// Extra cards dealt to every player when this call is played.
    pub draw: usize,

    /// Player currently holding or having played this card. Reference only;
    /// cleared on discard.
    #[serde(skip)]
    pub owner: Option<Identity>,
}

impl Card {
    /// Create a call card. `pick` is derived from the fragment count.
    #[must_use]
    pub fn call(fragments: impl IntoIterator<Item = impl Into<String>>, draw: usize) -> Self {
        let text: Fragments = fragments.into_iter().map(Into::into).collect();
        assert!(!text.is_empty(), "call card needs at least one fragment");
        let pick = text.len().saturating_sub(1).max(1);
        Self {
            text,
            card_type: CardType::Call,
            pick,
            draw,
            owner: None,
        }
    }

    /// Create a response card.
    #[must_use]
    pub fn response(text: impl Into<String>) -> Self {
        Self {
            text: std::iter::once(text.into()).collect(),
            card_type: CardType::Response,
            pick: 0,
            draw: 0,
            owner: None,
        }
    }

    /// Is this a call card?
    #[must_use]
    pub fn is_call(&self) -> bool {
        self.card_type == CardType::Call
    }

    /// The card text with blanks shown as `___`.
    #[must_use]
    pub fn blank_text(&self) -> String {
        self.text.join("___")
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.blank_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_derives_pick() {
        let one = Card::call(["What happened? ", ""], 0);
        assert_eq!(one.pick, 1);
        assert!(one.is_call());

        let two = Card::call(["I never understood ", " until I met ", "."], 1);
        assert_eq!(two.pick, 2);
        assert_eq!(two.draw, 1);
    }

    #[test]
    fn test_single_fragment_call_still_picks_one() {
        let card = Card::call(["Fill in the blank."], 0);
        assert_eq!(card.pick, 1);
    }

    #[test]
    fn test_response() {
        let card = Card::response("A thing");
        assert_eq!(card.card_type, CardType::Response);
        assert_eq!(card.pick, 0);
        assert_eq!(card.text.as_slice(), ["A thing"]);
    }

    #[test]
    fn test_blank_text() {
        let card = Card::call(["I never understood ", " until I met ", "."], 0);
        assert_eq!(card.blank_text(), "I never understood ___ until I met ___.");
    }

    #[test]
    fn test_owner_not_serialized() {
        let mut card = Card::response("x");
        card.owner = Some(crate::core::Identity::new("u", "h"));

        let json = serde_json::to_string(&card).unwrap();
        let back: Card = serde_json::from_str(&json).unwrap();

        assert!(back.owner.is_none());
        assert_eq!(back.text, card.text);
    }
}
