//! Scoring ledger.
//!
//! Points are keyed by [`Identity`], not by the live `Player`, so a player
//! who leaves and rejoins (possibly under a new nick) keeps their score.
//! Entries are created the first time an identity is seen and never removed
//! while the game runs. Points only increase.

use crate::core::Identity;

/// Accumulated score for one identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Scoring key.
    pub identity: Identity,
    /// Last display name seen for this identity, for score listings after
    /// the player has left.
    pub nick: String,
    /// Points won. Never decreases.
    pub points: u32,
}

/// Identity -> points mapping for one game, in join order.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    last_winner: Option<(Identity, u32)>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the ledger empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create the entry for `identity` if absent, refreshing its nick either
    /// way. Returns the entry's current points.
    pub fn ensure(&mut self, identity: &Identity, nick: &str) -> u32 {
        if let Some(entry) = self.entry_mut(identity) {
            entry.nick = nick.to_string();
            return entry.points;
        }
        self.entries.push(LedgerEntry {
            identity: identity.clone(),
            nick: nick.to_string(),
            points: 0,
        });
        0
    }

    /// Add `n` points to `identity`'s entry, creating it if absent.
    /// Returns the new total.
    pub fn award(&mut self, identity: &Identity, n: u32) -> u32 {
        if self.entry_mut(identity).is_none() {
            self.ensure(identity, &identity.user);
        }
        let entry = self.entry_mut(identity).expect("entry just ensured");
        entry.points += n;
        entry.points
    }

    /// Points for `identity`, zero if unseen.
    #[must_use]
    pub fn points(&self, identity: &Identity) -> u32 {
        self.entry(identity).map_or(0, |e| e.points)
    }

    /// Last display name seen for `identity`, if any. Lets announcements
    /// name a winner who has already left the roster.
    #[must_use]
    pub fn nick_of(&self, identity: &Identity) -> Option<&str> {
        self.entry(identity).map(|e| e.nick.as_str())
    }

    /// Refresh the display name stored for `identity`.
    pub fn rename(&mut self, identity: &Identity, nick: &str) {
        if let Some(entry) = self.entry_mut(identity) {
            entry.nick = nick.to_string();
        }
    }

    /// Lazy `(nick, points)` listing in join order. Ties keep their order.
    pub fn scores(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|e| (e.nick.as_str(), e.points))
    }

    /// The entry that has reached `point_limit`, if any. A limit of zero or
    /// below means play forever and never yields a winner.
    #[must_use]
    pub fn check_winner(&self, point_limit: i32) -> Option<&LedgerEntry> {
        if point_limit <= 0 {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.points >= point_limit as u32)
    }

    /// Record a round win for `identity` and return the current consecutive
    /// win count (1 for a fresh streak).
    pub fn update_streak(&mut self, identity: &Identity) -> u32 {
        match &mut self.last_winner {
            Some((last, count)) if last == identity => {
                *count += 1;
                *count
            }
            _ => {
                self.last_winner = Some((identity.clone(), 1));
                1
            }
        }
    }

    fn entry(&self, identity: &Identity) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| &e.identity == identity)
    }

    fn entry_mut(&mut self, identity: &Identity) -> Option<&mut LedgerEntry> {
        self.entries.iter_mut().find(|e| &e.identity == identity)
    }
}
