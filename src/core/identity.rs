//! Persistent participant identity.
//!
//! Chat display names are volatile: nicks change mid-game and players
//! reconnect under new ones. Scoring continuity therefore keys on the
//! `(user, host)` pair, which survives both. Display-name lookups are a
//! separate, explicit secondary index owned by whoever needs them.

use serde::{Deserialize, Serialize};

/// Immutable scoring key for one participant.
///
/// Two `Identity` values compare equal exactly when they refer to the same
/// account on the same host, regardless of current display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Account / username part.
    pub user: String,
    /// Hostname part.
    pub host: String,
}

impl Identity {
    /// Create a new identity.
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}
