//! Lobby coordination core for Gomoku.
//!
//! Tracks every player's lifecycle (idle → matchmaking or room → game),
//! manages room seats and readiness, validates moves, pairs waiting
//! players, and pushes every change to whoever is watching.
//!
//! # Key types
//!
//! - [`ServerState`]: the coordinator; every lifecycle transition
//! - [`Observable`]: a value plus per-subscriber event queues
//! - [`EventSource`]: the receiving end handed to a subscriber
//! - [`Matchmaker`]: background loop that pairs queued players
//! - [`LobbyConfig`]: intervals and queue sizes
//! - [`Rejection`]: why an operation returned `false` / `None`

mod config;
mod error;
mod game;
mod matchmaker;
mod observable;
mod state;

pub use config::LobbyConfig;
pub use error::{Rejection, RoomError};
pub use matchmaker::Matchmaker;
pub use observable::{EventSource, Observable};
pub use state::{GameCell, RoomCell, ServerState};
