//! Unified error type for the Gomoku lobby.

use gomoku_lease::PoolError;
use gomoku_protocol::ProtocolError;
use gomoku_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GomokuError {
    /// Rendering a push frame or parsing an id failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room-id pool ran dry.
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// A background task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidRoomId("12ab".into());
        let gomoku_err: GomokuError = err.into();
        assert!(matches!(gomoku_err, GomokuError::Protocol(_)));
        assert!(gomoku_err.to_string().contains("12ab"));
    }

    #[test]
    fn test_from_pool_error() {
        let err = PoolError::Exhausted { capacity: 3 };
        let gomoku_err: GomokuError = err.into();
        assert!(matches!(gomoku_err, GomokuError::Pool(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::Pool(PoolError::Exhausted { capacity: 3 });
        let gomoku_err: GomokuError = err.into();
        assert!(matches!(gomoku_err, GomokuError::Room(_)));
        assert_eq!(
            gomoku_err.to_string(),
            PoolError::Exhausted { capacity: 3 }.to_string()
        );
    }
}
