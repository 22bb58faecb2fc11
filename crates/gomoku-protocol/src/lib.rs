//! Data model and push frames for the Gomoku lobby.
//!
//! This crate defines the "nouns" every other layer talks about:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`], [`GameId`]): opaque string
//!   newtypes used as directory keys.
//! - **Lifecycle** ([`PlayerState`]): what a player is currently doing.
//! - **Room and game state** ([`RoomState`], [`GameState`], [`Board`]):
//!   the values held by observable cells.
//! - **Events** ([`RoomStateChange`], [`GameStateChange`]): the deltas
//!   fanned out to subscribers.
//! - **Frames** ([`Frame`]): how a snapshot and its events are rendered
//!   for a push connection.
//!
//! # Architecture
//!
//! The protocol layer has no behavior beyond small accessors. It doesn't
//! know about locks, channels, or timers. The room layer owns those.
//!
//! ```text
//! Lease (room ids) → Room (coordinator, cells) → Facade (server, feeds)
//!         ↘                 ↓                      ↙
//!                 Protocol (this crate)
//! ```

mod error;
mod frame;
mod types;

pub use error::ProtocolError;
pub use frame::Frame;
pub use types::{
    BOARD_SIZE, Board, Cell, GameId, GameState, GameStateChange, PlayerId,
    PlayerState, ROOM_ID_DIGITS, RoomId, RoomState, RoomStateChange, SEATS,
    Stone,
};
