//! Move legality and application for a Gomoku game.
//!
//! Only placement and turn order are enforced. Win detection is not
//! part of the lobby core; a game simply accepts moves until the board
//! fills up.

use gomoku_protocol::{Cell, GameState, GameStateChange, PlayerId, Stone};

use crate::Rejection;

/// Checks that `player` may put a stone on `(x, y)` right now and
/// returns the colour they play.
pub(crate) fn check_move(
    game: &GameState,
    player: &PlayerId,
    x: usize,
    y: usize,
) -> Result<Stone, Rejection> {
    let stone = game
        .stone_of(player)
        .ok_or_else(|| Rejection::NotInGame(player.clone()))?;
    if stone != game.current_turn {
        return Err(Rejection::NotYourTurn(player.clone()));
    }
    match game.board.get(x, y) {
        None => Err(Rejection::OutOfBounds { x, y }),
        Some(Cell::Empty) => Ok(stone),
        Some(Cell::Black | Cell::White) => Err(Rejection::CellOccupied { x, y }),
    }
}

/// Places `stone` and passes the turn. Call only after [`check_move`].
///
/// The returned event reports the colour to move *next* in `who`.
pub(crate) fn apply_move(
    game: &mut GameState,
    stone: Stone,
    x: usize,
    y: usize,
) -> GameStateChange {
    let placed = game.board.place(x, y, stone);
    debug_assert!(placed, "apply_move on an unchecked cell");
    game.current_turn = stone.opponent();
    GameStateChange {
        who: game.current_turn,
        x,
        y,
    }
}
