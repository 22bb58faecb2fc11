//! Core data model for the Gomoku lobby.
//!
//! Every type here is plain data: it can be cloned into a snapshot,
//! serialized into a push frame, and compared in tests. The rules that
//! mutate these values live in the room layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Width and height of the Gomoku board.
pub const BOARD_SIZE: usize = 15;

/// Number of seats in a room.
pub const SEATS: usize = 2;

/// Number of decimal digits in a room id.
pub const ROOM_ID_DIGITS: usize = 6;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An opaque player identifier supplied by the identity layer.
///
/// The lobby places no structure on its format; it is only ever used as
/// a directory key and compared for equality. `#[serde(transparent)]`
/// makes it serialize as the bare string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A short, human-typeable room identifier: exactly six decimal digits.
///
/// Room ids are leased from a finite pool, so the type keeps the mapping
/// to a numeric index (`000042` ↔ `42`) that the pool stores internally.
/// Deserialization goes through [`RoomId::parse`], so a malformed id
/// never makes it past the transport.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Builds the id for a numeric index, zero-padded to six digits.
    ///
    /// Indices are expected to be below `10^6`; larger values would
    /// produce a longer string, which the pool never hands out.
    pub fn from_index(index: u32) -> Self {
        Self(format!("{index:0width$}", width = ROOM_ID_DIGITS))
    }

    /// Parses a six-digit decimal string.
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        if value.len() != ROOM_ID_DIGITS
            || !value.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ProtocolError::InvalidRoomId(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// The numeric index this id was built from.
    pub fn index(&self) -> u32 {
        // Every constructor guarantees six ASCII digits, which always fit.
        self.0
            .bytes()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'))
    }

    /// Returns the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

/// A game identifier. Games are not leased, so this is a free-form string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    /// Returns the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Player lifecycle
// ---------------------------------------------------------------------------

/// What a player is currently doing.
///
/// ```text
/// Idle ──→ InMatchmaking ──(matched)──┐
///   │                                 ▼
///   └──(create/join)──────────────→ InRoom ──(start)──→ InGame
/// ```
///
/// `Idle` is never stored: it is what the coordinator reports for a
/// player that has no directory entry. Serialized with a `status` tag,
/// e.g. `{"status":"in_room","id":"p1","room_id":"004217"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayerState {
    Idle {
        #[serde(rename = "id")]
        player_id: PlayerId,
    },
    InMatchmaking {
        #[serde(rename = "id")]
        player_id: PlayerId,
    },
    InRoom {
        #[serde(rename = "id")]
        player_id: PlayerId,
        room_id: RoomId,
    },
    InGame {
        #[serde(rename = "id")]
        player_id: PlayerId,
        game_id: GameId,
    },
}

impl PlayerState {
    /// The player this state belongs to.
    pub fn player_id(&self) -> &PlayerId {
        match self {
            Self::Idle { player_id }
            | Self::InMatchmaking { player_id }
            | Self::InRoom { player_id, .. }
            | Self::InGame { player_id, .. } => player_id,
        }
    }

    /// Returns `true` for the implicit idle state.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle { .. })
    }

    /// The room the player sits in, if any.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::InRoom { room_id, .. } => Some(room_id),
            Self::Idle { .. }
            | Self::InMatchmaking { .. }
            | Self::InGame { .. } => None,
        }
    }

    /// The game the player is playing, if any.
    pub fn game_id(&self) -> Option<&GameId> {
        match self {
            Self::InGame { game_id, .. } => Some(game_id),
            Self::Idle { .. }
            | Self::InMatchmaking { .. }
            | Self::InRoom { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// A two-seat room waiting for its game to start.
///
/// Invariants maintained by the coordinator:
/// - `host` always occupies one of the seats.
/// - `ready` only has entries for seated players.
/// - The host never needs a `ready` entry; their readiness is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    pub id: RoomId,
    pub players: [Option<PlayerId>; SEATS],
    pub host: PlayerId,
    pub ready: BTreeMap<PlayerId, bool>,
}

impl RoomState {
    /// A fresh room with `host` in seat 0 and nobody ready.
    pub fn hosted_by(id: RoomId, host: PlayerId) -> Self {
        Self {
            id,
            players: [Some(host.clone()), None],
            host,
            ready: BTreeMap::new(),
        }
    }

    /// The seat index `player` occupies, if seated.
    pub fn seat_of(&self, player: &PlayerId) -> Option<usize> {
        self.players
            .iter()
            .position(|seat| seat.as_ref() == Some(player))
    }

    /// Returns `true` if `player` occupies a seat.
    pub fn is_seated(&self, player: &PlayerId) -> bool {
        self.seat_of(player).is_some()
    }

    /// Seated players, lowest seat first.
    pub fn occupants(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.iter().flatten()
    }

    /// Number of seated players.
    pub fn occupant_count(&self) -> usize {
        self.occupants().count()
    }

    /// Index of the first empty seat, if any.
    pub fn first_empty_seat(&self) -> Option<usize> {
        self.players.iter().position(Option::is_none)
    }

    /// Returns `true` if every seat is taken.
    pub fn is_full(&self) -> bool {
        self.first_empty_seat().is_none()
    }

    /// Returns `true` if every seat is empty.
    pub fn is_empty(&self) -> bool {
        self.players.iter().all(Option::is_none)
    }
}

/// An event fanned out to a room's subscribers.
///
/// Internally tagged with snake_case names so a client can switch on
/// `type`: `{"type":"update","new_state":{...}}`, `{"type":"delete"}`,
/// `{"type":"game_start","game_id":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomStateChange {
    /// The room changed; here is the whole new state.
    Update { new_state: RoomState },
    /// The room is gone.
    Delete,
    /// The room turned into a game.
    GameStart { game_id: GameId },
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

/// A player's stone colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stone {
    Black,
    White,
}

impl Stone {
    /// The other colour.
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => write!(f, "black"),
            Self::White => write!(f, "white"),
        }
    }
}

/// One intersection on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Black,
    White,
}

impl From<Stone> for Cell {
    fn from(stone: Stone) -> Self {
        match stone {
            Stone::Black => Self::Black,
            Stone::White => Self::White,
        }
    }
}

/// A 15×15 board, indexed `[x][y]`.
///
/// Cells only ever go from `Empty` to a stone; [`Board::place`] refuses
/// to overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([[Cell; BOARD_SIZE]; BOARD_SIZE]);

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self([[Cell::Empty; BOARD_SIZE]; BOARD_SIZE])
    }

    /// Reads a cell. Returns `None` outside the board.
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.0.get(x).and_then(|column| column.get(y)).copied()
    }

    /// Puts `stone` on an empty, in-bounds cell.
    ///
    /// Returns `false` (and leaves the board untouched) if the cell is
    /// outside the board or already occupied.
    pub fn place(&mut self, x: usize, y: usize, stone: Stone) -> bool {
        match self.0.get_mut(x).and_then(|column| column.get_mut(y)) {
            Some(cell) if *cell == Cell::Empty => {
                *cell = stone.into();
                true
            }
            _ => false,
        }
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.0
            .iter()
            .flatten()
            .filter(|cell| **cell != Cell::Empty)
            .count()
    }

    /// Raw access to the grid.
    pub fn cells(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.0
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// A running game between two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub id: GameId,
    pub board: Board,
    pub black_player_id: PlayerId,
    pub white_player_id: PlayerId,
    pub current_turn: Stone,
}

impl GameState {
    /// A fresh game on an empty board. Black moves first.
    pub fn new(id: GameId, black: PlayerId, white: PlayerId) -> Self {
        Self {
            id,
            board: Board::new(),
            black_player_id: black,
            white_player_id: white,
            current_turn: Stone::Black,
        }
    }

    /// The colour `player` plays, if they are in this game.
    pub fn stone_of(&self, player: &PlayerId) -> Option<Stone> {
        if *player == self.black_player_id {
            Some(Stone::Black)
        } else if *player == self.white_player_id {
            Some(Stone::White)
        } else {
            None
        }
    }
}

/// An event fanned out to a game's subscribers after a move is applied.
///
/// `who` carries the colour whose turn it is *after* the move, not the
/// colour that just moved. Clients key off this field, so it stays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateChange {
    pub who: Stone,
    pub x: usize,
    pub y: usize,
}
