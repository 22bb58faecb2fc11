//! # Gomoku lobby
//!
//! Coordination core for a Gomoku game server: who is idle, who is
//! waiting for a match, who sits in which room, and who is playing
//! which game.
//!
//! The transport (HTTP, WebSocket, anything) is left to the embedder.
//! It calls into [`ServerState`] for every player action and hands
//! [`room_feed`] / [`game_feed`] streams to its push connections.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gomoku::prelude::*;
//!
//! # async fn run() -> Result<(), GomokuError> {
//! gomoku::init_tracing();
//!
//! let server = LobbyServer::builder().build().await;
//! let lobby = server.state();
//!
//! let host = PlayerId::from("alice");
//! if let Some(room_id) = lobby.create_room(&host).await? {
//!     println!("share this code: {room_id}");
//! }
//!
//! server.shutdown().await
//! # }
//! ```

mod error;
mod push;
mod server;
mod telemetry;

pub use error::GomokuError;
pub use push::{game_feed, room_feed};
pub use server::{LobbyServer, LobbyServerBuilder};
pub use telemetry::init_tracing;

pub use gomoku_lease::{LeaseConfig, PoolError, RoomIdPool};
pub use gomoku_protocol::{
    BOARD_SIZE, Board, Cell, Frame, GameId, GameState, GameStateChange,
    PlayerId, PlayerState, ProtocolError, RoomId, RoomState,
    RoomStateChange, Stone,
};
pub use gomoku_room::{
    EventSource, LobbyConfig, Matchmaker, Rejection, RoomError, ServerState,
};
pub use gomoku_tick::{TickConfig, TickInfo, Ticker};

pub mod prelude {
    pub use crate::{
        GameId, GameState, GameStateChange, GomokuError, LeaseConfig,
        LobbyConfig, LobbyServer, LobbyServerBuilder, PlayerId, PlayerState,
        RoomId, RoomState, RoomStateChange, ServerState, Stone, game_feed,
        room_feed,
    };
}
