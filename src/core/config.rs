//! Game configuration.
//!
//! One `GameConfig` is shared by every game a host runs; per-game overrides
//! (currently the point limit) are applied at `start`. All durations are in
//! real time as measured by the host-supplied clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a single game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Minimum players required to leave the waiting state.
    pub min_players: usize,

    /// Points required to win the game. Zero or negative means play forever.
    pub point_limit: i32,

    /// Response cards each player is topped up to at the start of a round.
    pub hand_size: usize,

    /// Time budget for the play phase and for the czar's pick.
    pub time_limit: Duration,

    /// Interval between turn/winner timer checks.
    pub check_interval: Duration,

    /// Pre-round pause before the next round starts.
    pub time_between_rounds: Duration,

    /// How long to wait below quorum before stopping the game.
    pub wait_timeout: Duration,

    /// Restart the wait timeout whenever a player joins.
    pub wait_from_last_join: bool,

    /// How long after game start a join triggers a shortfall announcement.
    pub join_announce_after: Duration,

    /// Rounds of inactivity after which a player is removed. Zero disables.
    pub max_idle_rounds: u32,

    /// Stop the game when the last player leaves.
    pub stop_on_empty: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            point_limit: 10,
            hand_size: 10,
            time_limit: Duration::from_secs(120),
            check_interval: Duration::from_secs(10),
            time_between_rounds: Duration::from_secs(10),
            wait_timeout: Duration::from_secs(180),
            wait_from_last_join: false,
            join_announce_after: Duration::from_secs(30),
            max_idle_rounds: 2,
            stop_on_empty: true,
        }
    }
}

impl GameConfig {
    /// Config with a different point limit, leaving everything else alone.
    #[must_use]
    pub fn with_point_limit(mut self, limit: i32) -> Self {
        self.point_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();

        assert_eq!(config.min_players, 3);
        assert_eq!(config.hand_size, 10);
        assert_eq!(config.time_limit, Duration::from_secs(120));
        assert!(config.stop_on_empty);
    }

    #[test]
    fn test_with_point_limit() {
        let config = GameConfig::default().with_point_limit(0);
        assert_eq!(config.point_limit, 0);
        assert_eq!(config.min_players, 3);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = GameConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.min_players, config.min_players);
        assert_eq!(back.time_limit, config.time_limit);
    }
}
