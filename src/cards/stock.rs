//! Source decks.
//!
//! A `CardStock` is the pool of call and response cards a game is built
//! from. Hosts typically deserialize one from a deck file; the bundled
//! [`CardStock::sample`] stock exists for tests and quick demos.

use serde::{Deserialize, Serialize};

use super::Card;

/// The call and response cards available to a game.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CardStock {
    /// Prompt cards.
    pub calls: Vec<Card>,
    /// Answer cards.
    pub responses: Vec<Card>,
}

impl CardStock {
    /// An empty stock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A small built-in stock, enough for a few rounds with up to six
    /// players.
    #[must_use]
    pub fn sample() -> Self {
        let calls = vec![
            Card::call(["What ended my last relationship? ", ""], 0),
            Card::call(["I never truly understood ", " until I encountered ", "."], 0),
            Card::call(["The secret ingredient is ", "."], 0),
            Card::call(["Next on the news: ", " and its effect on ", "."], 1),
            Card::call(["", " is the reason the meeting ran long."], 0),
            Card::call(["My new year's resolution: less ", ", more ", "."], 0),
            Card::call(["Nothing says teamwork like ", "."], 0),
            Card::call(["The museum's newest exhibit: ", "."], 0),
        ];

        let mut responses: Vec<Card> = [
            "Switching providers",
            "Bling",
            "A suspicious amount of glitter",
            "The office printer",
            "An unexpected sea shanty",
            "Twelve angry geese",
            "Lukewarm coffee",
            "A very long elevator pitch",
            "Interpretive dance",
            "The quarterly report",
            "A surprise kazoo solo",
            "Mandatory fun",
        ]
        .into_iter()
        .map(Card::response)
        .collect();
        // Filler to keep multi-player games dealable for several rounds.
        responses.extend((responses.len()..96).map(|i| Card::response(format!("Sample answer #{i}"))));

        Self { calls, responses }
    }

    /// Total cards across both pools.
    #[must_use]
    pub fn total(&self) -> usize {
        self.calls.len() + self.responses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardType;

    #[test]
    fn test_sample_stock_shape() {
        let stock = CardStock::sample();

        assert!(!stock.calls.is_empty());
        assert!(stock.responses.len() >= 96);
        assert!(stock.calls.iter().all(|c| c.card_type == CardType::Call));
        assert!(stock.responses.iter().all(|c| c.card_type == CardType::Response));
    }

    #[test]
    fn test_stock_deserializes_from_json() {
        let json = r#"{
            "calls": [
                {"text": ["Why? ", ""], "card_type": "Call", "pick": 1, "draw": 0}
            ],
            "responses": [
                {"text": ["Because"], "card_type": "Response", "pick": 0, "draw": 0}
            ]
        }"#;

        let stock: CardStock = serde_json::from_str(json).unwrap();

        assert_eq!(stock.calls.len(), 1);
        assert_eq!(stock.calls[0].pick, 1);
        assert_eq!(stock.responses[0].text[0], "Because");
    }
}
