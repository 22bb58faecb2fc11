//! Error types for the room layer.

use gomoku_lease::PoolError;
use gomoku_protocol::{GameId, PlayerId, RoomId};

/// Failures a caller can't fix by retrying right away.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Leasing a room id failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Why the coordinator refused an operation.
///
/// Rejections are not errors: the operation returns `false` or `None`,
/// nothing was changed, and the reason is logged at `debug`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The player is already queued, seated, or playing.
    #[error("player {0} is busy")]
    NotIdle(PlayerId),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// Both seats are taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    #[error("player {0} is not the host")]
    NotHost(PlayerId),

    /// The kick target doesn't occupy a seat in the host's room.
    #[error("player {0} is not seated here")]
    NotSeated(PlayerId),

    #[error("the host cannot kick themselves")]
    CannotKickSelf,

    /// A game needs both seats filled.
    #[error("room {0} needs two players")]
    RoomNotFull(RoomId),

    #[error("player {0} is not ready")]
    NotReady(PlayerId),

    #[error("player {0} is not in a game")]
    NotInGame(PlayerId),

    #[error("game {0} not found")]
    GameNotFound(GameId),

    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("({x}, {y}) is off the board")]
    OutOfBounds { x: usize, y: usize },

    #[error("({x}, {y}) is occupied")]
    CellOccupied { x: usize, y: usize },

    #[error("player {0} is not queued for matchmaking")]
    NotQueued(PlayerId),
}
