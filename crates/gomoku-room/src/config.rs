//! Lobby configuration.

use std::time::Duration;

/// Settings for the coordinator and its matchmaker.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// How often the matchmaker pairs queued players. Zero disables it.
    pub matchmaking_interval: Duration,

    /// Per-subscriber event queue size. Events beyond this are dropped
    /// for that subscriber until it catches up.
    pub event_capacity: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            matchmaking_interval: Duration::from_secs(1),
            event_capacity: 64,
        }
    }
}
