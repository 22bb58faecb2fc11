//! `LobbyServer` builder and background task wiring.
//!
//! This is the entry point for running the lobby. It ties the layers
//! together: the room-id pool, the coordinator on top of it, and the
//! two background loops (matchmaker and lease reclaimer).

use std::sync::Arc;

use gomoku_lease::{LeaseConfig, RoomIdPool};
use gomoku_room::{LobbyConfig, Matchmaker, ServerState};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::GomokuError;

/// Builder for configuring and starting a lobby.
///
/// # Example
///
/// ```rust,ignore
/// use gomoku::prelude::*;
///
/// let server = LobbyServer::builder()
///     .lobby_config(LobbyConfig {
///         matchmaking_interval: Duration::from_millis(500),
///         ..LobbyConfig::default()
///     })
///     .build()
///     .await;
/// ```
pub struct LobbyServerBuilder {
    lobby_config: LobbyConfig,
    lease_config: LeaseConfig,
}

impl LobbyServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            lobby_config: LobbyConfig::default(),
            lease_config: LeaseConfig::default(),
        }
    }

    /// Sets the coordinator and matchmaker configuration.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby_config = config;
        self
    }

    /// Sets the room-id pool configuration.
    pub fn lease_config(mut self, config: LeaseConfig) -> Self {
        self.lease_config = config;
        self
    }

    /// Builds the lobby and spawns its background loops on the current
    /// Tokio runtime.
    pub async fn build(self) -> LobbyServer {
        let pool = Arc::new(RoomIdPool::new(self.lease_config));
        let state = Arc::new(ServerState::new(self.lobby_config, Arc::clone(&pool)));
        let cancel = CancellationToken::new();

        let matchmaker = tokio::spawn(
            Matchmaker::new(Arc::clone(&state)).run(cancel.child_token()),
        );
        let reclaimer = {
            let cancel = cancel.child_token();
            tokio::spawn(async move { pool.run_reclaimer(cancel).await })
        };

        tracing::info!("lobby server running");
        LobbyServer {
            state,
            cancel,
            tasks: vec![matchmaker, reclaimer],
        }
    }
}

impl Default for LobbyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running lobby.
///
/// Hand [`state()`](Self::state) to the transport. Call
/// [`shutdown()`](Self::shutdown) to stop the background loops; dropping
/// the server without it cancels them but doesn't wait.
pub struct LobbyServer {
    state: Arc<ServerState>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl LobbyServer {
    /// Creates a new builder.
    pub fn builder() -> LobbyServerBuilder {
        LobbyServerBuilder::new()
    }

    /// The shared coordinator.
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Cancels the background loops and waits for them to finish.
    ///
    /// # Errors
    /// [`GomokuError::Task`] if a loop panicked.
    pub async fn shutdown(mut self) -> Result<(), GomokuError> {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            task.await?;
        }
        tracing::info!("lobby server stopped");
        Ok(())
    }
}

impl Drop for LobbyServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
