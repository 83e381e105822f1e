//! External deck metadata.
//!
//! Games play from a [`CardStock`](crate::cards::CardStock) the host loads
//! up front; this module only covers looking up metadata about published
//! decks by code. Hosts resolve lookups however suits their transport and
//! feed results back through `Games::deck_info_resolved`, or hand the
//! registry a [`DeckInfoProvider`] to resolve inline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata about one published deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckInfo {
    /// Lookup code, e.g. `"CAHBS"`.
    pub code: String,
    /// Display name.
    pub name: String,
    pub description: String,
    pub author: String,
    /// Creation date as the upstream service reports it.
    pub created: String,
    /// Number of call cards in the deck.
    pub call_count: usize,
    /// Number of response cards in the deck.
    pub response_count: usize,
}

impl DeckInfo {
    /// One-line channel summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: \"{}\" by {} [{} calls, {} responses] - {}",
            self.code, self.name, self.author, self.call_count, self.response_count, self.description
        )
    }
}

/// Why a deck lookup failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeckInfoError {
    #[error("deck {0} not found")]
    NotFound(String),
    #[error("deck lookup failed: {0}")]
    Lookup(String),
}

/// Source of deck metadata.
pub trait DeckInfoProvider {
    /// Look up a deck by code.
    fn fetch(&self, code: &str) -> Result<DeckInfo, DeckInfoError>;
}

/// Fixed in-memory provider, for tests and offline hosts.
#[derive(Clone, Debug, Default)]
pub struct StaticDeckInfoProvider {
    decks: Vec<DeckInfo>,
}

impl StaticDeckInfoProvider {
    /// Provider answering from the given decks.
    #[must_use]
    pub fn new(decks: Vec<DeckInfo>) -> Self {
        Self { decks }
    }
}

impl DeckInfoProvider for StaticDeckInfoProvider {
    fn fetch(&self, code: &str) -> Result<DeckInfo, DeckInfoError> {
        self.decks
            .iter()
            .find(|d| d.code.eq_ignore_ascii_case(code))
            .cloned()
            .ok_or_else(|| DeckInfoError::NotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> DeckInfo {
        DeckInfo {
            code: "CAHBS".to_string(),
            name: "Base Set".to_string(),
            description: "The original".to_string(),
            author: "cards".to_string(),
            created: "2013-01-01".to_string(),
            call_count: 90,
            response_count: 460,
        }
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            info().summary(),
            "CAHBS: \"Base Set\" by cards [90 calls, 460 responses] - The original"
        );
    }

    #[test]
    fn test_static_provider_is_case_insensitive() {
        let provider = StaticDeckInfoProvider::new(vec![info()]);

        assert_eq!(provider.fetch("cahbs").unwrap().name, "Base Set");
        assert_eq!(
            provider.fetch("NOPE").unwrap_err(),
            DeckInfoError::NotFound("NOPE".to_string())
        );
    }

    #[test]
    fn test_deck_info_serde_round_trip() {
        let json = serde_json::to_string(&info()).unwrap();
        let back: DeckInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info());
    }
}
