//! Background loop that pairs players waiting in the matchmaking queue.

use std::sync::Arc;

use gomoku_tick::Ticker;
use tokio_util::sync::CancellationToken;

use crate::ServerState;

/// Periodically calls [`ServerState::run_matchmaking_pass`].
///
/// The matchmaker only goes through the coordinator's public API, so it
/// takes the same lock as every other caller and can't see a room or a
/// player half-way through a transition.
pub struct Matchmaker {
    state: Arc<ServerState>,
    ticker: Ticker,
}

impl Matchmaker {
    /// A matchmaker ticking at `state.config().matchmaking_interval`.
    pub fn new(state: Arc<ServerState>) -> Self {
        let ticker = Ticker::with_period(state.config().matchmaking_interval);
        Self { state, ticker }
    }

    /// Runs until `cancel` fires. A failed pass is logged and the loop
    /// carries on with the next tick.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            interval_ms = self.state.config().matchmaking_interval.as_millis() as u64,
            "matchmaker started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                tick = self.ticker.wait_for_tick() => {
                    match self.state.run_matchmaking_pass().await {
                        Ok(rooms) if !rooms.is_empty() => {
                            tracing::debug!(tick = tick.tick, matched = rooms.len(), "matchmaking pass");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(tick = tick.tick, error = %e, "matchmaking pass failed");
                        }
                    }
                }
            }
        }

        tracing::info!("matchmaker stopped");
    }
}
