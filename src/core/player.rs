//! Seated participants.
//!
//! A `Player` exists only while seated in a running game; it is created on
//! join and dropped on quit/kick/disconnect. Long-lived score state lives in
//! the scoring ledger, keyed by [`Identity`], not here.

use crate::cards::CardCollection;
use crate::core::Identity;

/// One seated participant in a game.
#[derive(Clone, Debug)]
pub struct Player {
    /// Persistent scoring key.
    pub identity: Identity,
    /// Current display name. May change mid-game.
    pub nick: String,
    /// Response cards currently held.
    pub hand: CardCollection,
    /// Has this player submitted an entry this round?
    pub has_played: bool,
    /// Is this player judging the current round?
    pub is_czar: bool,
    /// Consecutive rounds this player failed to act in.
    pub inactive_rounds: u32,
}

impl Player {
    /// Create a freshly joined player with an empty hand.
    #[must_use]
    pub fn new(identity: Identity, nick: impl Into<String>) -> Self {
        Self {
            identity,
            nick: nick.into(),
            hand: CardCollection::new(),
            has_played: false,
            is_czar: false,
            inactive_rounds: 0,
        }
    }

    /// Reset per-round flags. Hand contents are untouched.
    pub fn reset_round(&mut self) {
        self.has_played = false;
        self.is_czar = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let p = Player::new(Identity::new("u", "h"), "Frederick");

        assert_eq!(p.nick, "Frederick");
        assert!(p.hand.is_empty());
        assert!(!p.has_played);
        assert!(!p.is_czar);
        assert_eq!(p.inactive_rounds, 0);
    }

    #[test]
    fn test_reset_round_clears_flags() {
        let mut p = Player::new(Identity::new("u", "h"), "n");
        p.has_played = true;
        p.is_czar = true;
        p.inactive_rounds = 2;

        p.reset_round();

        assert!(!p.has_played);
        assert!(!p.is_czar);
        // Inactivity is cleared by playing, not by round turnover.
        assert_eq!(p.inactive_rounds, 2);
    }
}
