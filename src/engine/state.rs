//! Round lifecycle states.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one game.
///
/// `Paused` doubles as the short pre-round gate between `RoundEnd` and the
/// next `Playable`; a user-initiated pause additionally carries a
/// [`PauseSnapshot`] so `resume` can restore where play left off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Below quorum; players may join.
    Waiting,
    /// Players may submit answers.
    Playable,
    /// All answers in; the czar is selecting.
    Played,
    /// Transient cleanup between rounds.
    RoundEnd,
    /// Suspended (user pause or pre-round countdown).
    Paused,
    /// Terminal.
    Stopped,
}

/// What a user pause needs to restore on resume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PauseSnapshot {
    /// State the game was in when paused.
    pub state: GameState,
    /// Phase time already elapsed, so the countdown resumes with the
    /// remaining budget rather than a fresh one.
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serde_round_trip() {
        let json = serde_json::to_string(&GameState::Playable).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GameState::Playable);
    }
}
