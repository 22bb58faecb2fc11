//! The coordinator: every player lifecycle transition in one place.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use gomoku_lease::RoomIdPool;
use gomoku_protocol::{
    GameId, GameState, GameStateChange, PlayerId, PlayerState, RoomId,
    RoomState, RoomStateChange,
};
use rand::Rng;
use tokio::sync::Mutex;

use crate::game::{apply_move, check_move};
use crate::{EventSource, LobbyConfig, Observable, Rejection, RoomError};

/// A room and its subscribers.
pub type RoomCell = Observable<RoomState, RoomStateChange>;

/// A game and its subscribers.
pub type GameCell = Observable<GameState, GameStateChange>;

/// The directories guarded by the coordinator's lock.
///
/// A player id appears in at most one of: the matchmaking queue, a
/// room's seats, a game's colours. `players` is the source of truth for
/// which one, and a player with no entry is idle.
#[derive(Default)]
struct Directories {
    players: HashMap<PlayerId, PlayerState>,
    rooms: HashMap<RoomId, RoomCell>,
    games: HashMap<GameId, GameCell>,
    queue: VecDeque<PlayerId>,
}

/// Shared lobby state.
///
/// Constructed once and handed out as `Arc<ServerState>` to the
/// transport, the push layer, and the matchmaker. Every operation runs
/// under one lock, so each lifecycle transition is indivisible. Room ids
/// come from a separate [`RoomIdPool`]; the pool is only ever entered
/// while this lock is held, never the other way round.
///
/// Operations report rule violations as `false` / `None` and log the
/// [`Rejection`] at `debug`. Only pool exhaustion is an error.
pub struct ServerState {
    dirs: Mutex<Directories>,
    pool: Arc<RoomIdPool>,
    config: LobbyConfig,
}

impl ServerState {
    /// Creates an empty lobby that leases room ids from `pool`.
    pub fn new(config: LobbyConfig, pool: Arc<RoomIdPool>) -> Self {
        Self {
            dirs: Mutex::new(Directories::default()),
            pool,
            config,
        }
    }

    /// The lobby configuration.
    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    /// The pool room ids are leased from.
    pub fn pool(&self) -> &Arc<RoomIdPool> {
        &self.pool
    }

    // -- Rooms --------------------------------------------------------------

    /// Creates a room with `player` as host in seat 0.
    ///
    /// Returns `Ok(None)` if the player is already busy.
    ///
    /// # Errors
    /// [`RoomError::Pool`] if no room id can be leased.
    pub async fn create_room(
        &self,
        player: &PlayerId,
    ) -> Result<Option<RoomId>, RoomError> {
        let mut dirs = self.dirs.lock().await;
        if let Err(reason) = dirs.ensure_idle(player) {
            log_rejection("create_room", player, &reason);
            return Ok(None);
        }

        let room_id = self.lease_room_id(&dirs.rooms).await?;
        let room = RoomState::hosted_by(room_id.clone(), player.clone());
        dirs.rooms.insert(
            room_id.clone(),
            Observable::new(room, self.config.event_capacity),
        );
        dirs.players.insert(
            player.clone(),
            PlayerState::InRoom {
                player_id: player.clone(),
                room_id: room_id.clone(),
            },
        );

        tracing::info!(%player, %room_id, "room created");
        Ok(Some(room_id))
    }

    /// Seats `player` in the first empty seat of `room_id`, not ready.
    pub async fn join_room(&self, player: &PlayerId, room_id: &RoomId) -> bool {
        let mut dirs = self.dirs.lock().await;
        settle("join_room", player, dirs.join(player, room_id))
    }

    /// Takes `player` out of their room.
    ///
    /// The host role passes to whoever is left. The last player out
    /// deletes the room and its id goes back to the pool.
    pub async fn leave_room(&self, player: &PlayerId) -> bool {
        let mut dirs = self.dirs.lock().await;
        match dirs.leave(player) {
            Ok(deleted) => {
                if let Some(room_id) = deleted {
                    self.pool.release(&room_id).await;
                }
                true
            }
            Err(reason) => {
                log_rejection("leave_room", player, &reason);
                false
            }
        }
    }

    /// Sets `player`'s ready flag in their room.
    pub async fn set_ready(&self, player: &PlayerId, ready: bool) -> bool {
        let mut dirs = self.dirs.lock().await;
        settle("set_ready", player, dirs.set_ready(player, ready))
    }

    /// Removes `target` from `host`'s room. Only the host may kick.
    pub async fn kick_player(&self, host: &PlayerId, target: &PlayerId) -> bool {
        let mut dirs = self.dirs.lock().await;
        settle("kick_player", host, dirs.kick(host, target))
    }

    /// Turns the host's full, ready room into a game.
    ///
    /// Seat 0 plays black, seat 1 white. The room's subscribers get
    /// `GameStart` before the room is removed.
    pub async fn start_game(&self, host: &PlayerId) -> Option<GameId> {
        let mut dirs = self.dirs.lock().await;
        let game_id = dirs.fresh_game_id();
        match dirs.start(host, game_id, self.config.event_capacity) {
            Ok((room_id, game_id)) => {
                self.pool.release(&room_id).await;
                Some(game_id)
            }
            Err(reason) => {
                log_rejection("start_game", host, &reason);
                None
            }
        }
    }

    /// Keeps a live room's id leased.
    pub async fn renew_room(&self, room_id: &RoomId) -> bool {
        let dirs = self.dirs.lock().await;
        if !dirs.rooms.contains_key(room_id) {
            tracing::debug!(%room_id, "renew for unknown room");
            return false;
        }
        self.pool.renew(room_id).await
    }

    // -- Games --------------------------------------------------------------

    /// Puts `player`'s stone on `(x, y)` if it is their turn and the cell
    /// is empty, then passes the turn.
    pub async fn make_move(&self, player: &PlayerId, x: usize, y: usize) -> bool {
        let mut dirs = self.dirs.lock().await;
        settle("make_move", player, dirs.play(player, x, y))
    }

    // -- Matchmaking ----------------------------------------------------------

    /// Queues an idle player for matchmaking.
    pub async fn join_matchmaking(&self, player: &PlayerId) -> bool {
        let mut dirs = self.dirs.lock().await;
        settle("join_matchmaking", player, dirs.enqueue(player))
    }

    /// Takes a queued player out of matchmaking.
    pub async fn leave_matchmaking(&self, player: &PlayerId) -> bool {
        let mut dirs = self.dirs.lock().await;
        settle("leave_matchmaking", player, dirs.dequeue(player))
    }

    /// Pairs queued players two at a time, longest-waiting first.
    ///
    /// Each pair gets a room with both seated and both ready; the first
    /// of the pair hosts. No room event is sent, since nobody can be
    /// subscribed to a room that didn't exist. Returns the new room ids.
    ///
    /// # Errors
    /// [`RoomError::Pool`] if ids run out. The pair that couldn't be
    /// seated goes back to the head of the queue in its original order;
    /// rooms made earlier in the pass are kept.
    pub async fn run_matchmaking_pass(&self) -> Result<Vec<RoomId>, RoomError> {
        let mut dirs = self.dirs.lock().await;
        let mut created = Vec::new();

        while let Some((first, second)) = dirs.pop_pair() {
            let room_id = match self.lease_room_id(&dirs.rooms).await {
                Ok(room_id) => room_id,
                Err(e) => {
                    dirs.queue.push_front(second);
                    dirs.queue.push_front(first);
                    return Err(e);
                }
            };
            dirs.seat_pair(&room_id, first, second, self.config.event_capacity);
            created.push(room_id);
        }

        Ok(created)
    }

    // -- Queries and subscriptions --------------------------------------------

    /// What `player` is doing. Players with no entry are idle.
    pub async fn player_state(&self, player: &PlayerId) -> PlayerState {
        let dirs = self.dirs.lock().await;
        dirs.players
            .get(player)
            .cloned()
            .unwrap_or_else(|| PlayerState::Idle {
                player_id: player.clone(),
            })
    }

    /// A copy of a room's current state.
    pub async fn room_snapshot(&self, room_id: &RoomId) -> Option<RoomState> {
        let dirs = self.dirs.lock().await;
        dirs.rooms.get(room_id).map(|cell| cell.get().clone())
    }

    /// A copy of a game's current state.
    pub async fn game_snapshot(&self, game_id: &GameId) -> Option<GameState> {
        let dirs = self.dirs.lock().await;
        dirs.games.get(game_id).map(|cell| cell.get().clone())
    }

    /// Subscribes to a room. `None` if the room doesn't exist.
    pub async fn subscribe_room(
        &self,
        room_id: &RoomId,
        subscriber: &str,
    ) -> Option<(EventSource<RoomStateChange>, RoomState)> {
        let mut dirs = self.dirs.lock().await;
        dirs.rooms
            .get_mut(room_id)
            .map(|cell| cell.subscribe(subscriber))
    }

    /// Unsubscribes from a room. Best-effort: unknown rooms or
    /// subscribers are logged and ignored.
    pub async fn unsubscribe_room(&self, room_id: &RoomId, subscriber: &str) -> bool {
        let mut dirs = self.dirs.lock().await;
        match dirs.rooms.get_mut(room_id) {
            Some(cell) => cell.unsubscribe(subscriber),
            None => {
                tracing::debug!(%room_id, subscriber, "unsubscribe from a room that is gone");
                false
            }
        }
    }

    /// Subscribes to a game. `None` if the game doesn't exist.
    pub async fn subscribe_game(
        &self,
        game_id: &GameId,
        subscriber: &str,
    ) -> Option<(EventSource<GameStateChange>, GameState)> {
        let mut dirs = self.dirs.lock().await;
        dirs.games
            .get_mut(game_id)
            .map(|cell| cell.subscribe(subscriber))
    }

    /// Unsubscribes from a game. Best-effort, like [`unsubscribe_room`](Self::unsubscribe_room).
    pub async fn unsubscribe_game(&self, game_id: &GameId, subscriber: &str) -> bool {
        let mut dirs = self.dirs.lock().await;
        match dirs.games.get_mut(game_id) {
            Some(cell) => cell.unsubscribe(subscriber),
            None => {
                tracing::debug!(%game_id, subscriber, "unsubscribe from a game that is gone");
                false
            }
        }
    }

    /// Unsubscribes from a room unless the queue is still held elsewhere.
    ///
    /// Used by push feeds on disconnect: a client that already reconnected
    /// under the same id keeps its queue.
    pub async fn unsubscribe_room_if_unused(&self, room_id: &RoomId, subscriber: &str) -> bool {
        let mut dirs = self.dirs.lock().await;
        dirs.rooms
            .get_mut(room_id)
            .is_some_and(|cell| cell.unsubscribe_if_unused(subscriber))
    }

    /// Game counterpart of [`unsubscribe_room_if_unused`](Self::unsubscribe_room_if_unused).
    pub async fn unsubscribe_game_if_unused(&self, game_id: &GameId, subscriber: &str) -> bool {
        let mut dirs = self.dirs.lock().await;
        dirs.games
            .get_mut(game_id)
            .is_some_and(|cell| cell.unsubscribe_if_unused(subscriber))
    }

    /// Players waiting for a match, longest-waiting first.
    pub async fn queued_players(&self) -> Vec<PlayerId> {
        self.dirs.lock().await.queue.iter().cloned().collect()
    }

    /// Number of open rooms.
    pub async fn room_count(&self) -> usize {
        self.dirs.lock().await.rooms.len()
    }

    /// Number of games.
    pub async fn game_count(&self) -> usize {
        self.dirs.lock().await.games.len()
    }

    /// Leases an id that doesn't name a live room.
    ///
    /// An id whose lease expired while its room lived on can come back
    /// out of the pool. Acquiring it re-leases it for that room, so it is
    /// simply skipped.
    async fn lease_room_id(
        &self,
        rooms: &HashMap<RoomId, RoomCell>,
    ) -> Result<RoomId, RoomError> {
        loop {
            let room_id = self.pool.acquire().await?;
            if !rooms.contains_key(&room_id) {
                return Ok(room_id);
            }
            tracing::warn!(%room_id, "leased id still names a live room, skipping");
        }
    }
}

impl Directories {
    fn ensure_idle(&self, player: &PlayerId) -> Result<(), Rejection> {
        if self.players.contains_key(player) {
            return Err(Rejection::NotIdle(player.clone()));
        }
        Ok(())
    }

    /// The room `player` is seated in.
    fn room_of(&self, player: &PlayerId) -> Result<RoomId, Rejection> {
        match self.players.get(player) {
            Some(PlayerState::InRoom { room_id, .. }) => Ok(room_id.clone()),
            Some(
                PlayerState::Idle { .. }
                | PlayerState::InMatchmaking { .. }
                | PlayerState::InGame { .. },
            )
            | None => Err(Rejection::NotInRoom(player.clone())),
        }
    }

    fn join(&mut self, player: &PlayerId, room_id: &RoomId) -> Result<(), Rejection> {
        self.ensure_idle(player)?;
        let cell = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| Rejection::RoomNotFound(room_id.clone()))?;
        let seat = cell
            .get()
            .first_empty_seat()
            .ok_or_else(|| Rejection::RoomFull(room_id.clone()))?;

        cell.update(|room| {
            room.players[seat] = Some(player.clone());
            room.ready.insert(player.clone(), false);
            RoomStateChange::Update {
                new_state: room.clone(),
            }
        });
        self.players.insert(
            player.clone(),
            PlayerState::InRoom {
                player_id: player.clone(),
                room_id: room_id.clone(),
            },
        );

        tracing::info!(%player, %room_id, seat, "player joined room");
        Ok(())
    }

    /// Returns the room id if the room was deleted.
    fn leave(&mut self, player: &PlayerId) -> Result<Option<RoomId>, Rejection> {
        let room_id = self.room_of(player)?;
        let Some(cell) = self.rooms.get_mut(&room_id) else {
            tracing::warn!(%player, %room_id, "player pointed at a missing room");
            return Err(Rejection::RoomNotFound(room_id));
        };
        self.players.remove(player);

        cell.update(|room| {
            if let Some(seat) = room.seat_of(player) {
                room.players[seat] = None;
            }
            room.ready.remove(player);
            if room.is_empty() {
                return RoomStateChange::Delete;
            }
            if room.host == *player {
                let next = room.occupants().next().cloned();
                if let Some(next) = next {
                    room.host = next;
                }
            }
            RoomStateChange::Update {
                new_state: room.clone(),
            }
        });

        if cell.get().is_empty() {
            self.rooms.remove(&room_id);
            tracing::info!(%player, %room_id, "last player left, room deleted");
            return Ok(Some(room_id));
        }

        tracing::info!(
            %player,
            %room_id,
            host = %cell.get().host,
            "player left room"
        );
        Ok(None)
    }

    fn set_ready(&mut self, player: &PlayerId, ready: bool) -> Result<(), Rejection> {
        let room_id = self.room_of(player)?;
        let cell = self
            .rooms
            .get_mut(&room_id)
            .ok_or(Rejection::RoomNotFound(room_id))?;
        cell.update(|room| {
            room.ready.insert(player.clone(), ready);
            RoomStateChange::Update {
                new_state: room.clone(),
            }
        });
        tracing::debug!(%player, ready, "ready flag set");
        Ok(())
    }

    fn kick(&mut self, host: &PlayerId, target: &PlayerId) -> Result<(), Rejection> {
        let room_id = self.room_of(host)?;
        let cell = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| Rejection::RoomNotFound(room_id.clone()))?;
        if cell.get().host != *host {
            return Err(Rejection::NotHost(host.clone()));
        }
        if host == target {
            return Err(Rejection::CannotKickSelf);
        }
        let seat = cell
            .get()
            .seat_of(target)
            .ok_or_else(|| Rejection::NotSeated(target.clone()))?;

        cell.update(|room| {
            room.players[seat] = None;
            room.ready.remove(target);
            RoomStateChange::Update {
                new_state: room.clone(),
            }
        });
        self.players.remove(target);

        tracing::info!(%host, %target, %room_id, "player kicked");
        Ok(())
    }

    /// Returns the deleted room's id and the new game's id.
    fn start(
        &mut self,
        host: &PlayerId,
        game_id: GameId,
        capacity: usize,
    ) -> Result<(RoomId, GameId), Rejection> {
        let room_id = self.room_of(host)?;
        let cell = self
            .rooms
            .get(&room_id)
            .ok_or_else(|| Rejection::RoomNotFound(room_id.clone()))?;
        let room = cell.get();

        if room.host != *host {
            return Err(Rejection::NotHost(host.clone()));
        }
        let [Some(black), Some(white)] = room.players.clone() else {
            return Err(Rejection::RoomNotFull(room_id));
        };
        if let Some(unready) = room
            .occupants()
            .filter(|p| **p != room.host)
            .find(|p| !room.ready.get(*p).copied().unwrap_or(false))
        {
            return Err(Rejection::NotReady(unready.clone()));
        }

        let game = GameState::new(game_id.clone(), black.clone(), white.clone());
        self.games
            .insert(game_id.clone(), Observable::new(game, capacity));
        for player in [&black, &white] {
            self.players.insert(
                player.clone(),
                PlayerState::InGame {
                    player_id: player.clone(),
                    game_id: game_id.clone(),
                },
            );
        }

        if let Some(cell) = self.rooms.remove(&room_id) {
            cell.notify(RoomStateChange::GameStart {
                game_id: game_id.clone(),
            });
        }

        tracing::info!(%room_id, %game_id, %black, %white, "game started");
        Ok((room_id, game_id))
    }

    fn play(&mut self, player: &PlayerId, x: usize, y: usize) -> Result<(), Rejection> {
        let game_id = match self.players.get(player) {
            Some(PlayerState::InGame { game_id, .. }) => game_id.clone(),
            Some(
                PlayerState::Idle { .. }
                | PlayerState::InMatchmaking { .. }
                | PlayerState::InRoom { .. },
            )
            | None => return Err(Rejection::NotInGame(player.clone())),
        };
        let cell = self
            .games
            .get_mut(&game_id)
            .ok_or_else(|| Rejection::GameNotFound(game_id.clone()))?;

        let stone = check_move(cell.get(), player, x, y)?;
        cell.update(|game| apply_move(game, stone, x, y));

        tracing::debug!(%player, %game_id, %stone, x, y, "move applied");
        Ok(())
    }

    fn enqueue(&mut self, player: &PlayerId) -> Result<(), Rejection> {
        self.ensure_idle(player)?;
        self.queue.push_back(player.clone());
        self.players.insert(
            player.clone(),
            PlayerState::InMatchmaking {
                player_id: player.clone(),
            },
        );
        tracing::info!(%player, waiting = self.queue.len(), "player queued for matchmaking");
        Ok(())
    }

    fn dequeue(&mut self, player: &PlayerId) -> Result<(), Rejection> {
        match self.players.get(player) {
            Some(PlayerState::InMatchmaking { .. }) => {}
            Some(
                PlayerState::Idle { .. }
                | PlayerState::InRoom { .. }
                | PlayerState::InGame { .. },
            )
            | None => return Err(Rejection::NotQueued(player.clone())),
        }
        self.queue.retain(|queued| queued != player);
        self.players.remove(player);
        tracing::info!(%player, "player left matchmaking");
        Ok(())
    }

    /// Takes the two longest-waiting players off the queue.
    fn pop_pair(&mut self) -> Option<(PlayerId, PlayerId)> {
        if self.queue.len() < 2 {
            return None;
        }
        let first = self.queue.pop_front()?;
        let second = self.queue.pop_front()?;
        Some((first, second))
    }

    fn seat_pair(
        &mut self,
        room_id: &RoomId,
        first: PlayerId,
        second: PlayerId,
        capacity: usize,
    ) {
        let mut room = RoomState::hosted_by(room_id.clone(), first.clone());
        room.players[1] = Some(second.clone());
        room.ready.insert(first.clone(), true);
        room.ready.insert(second.clone(), true);
        self.rooms
            .insert(room_id.clone(), Observable::new(room, capacity));

        for player in [&first, &second] {
            self.players.insert(
                player.clone(),
                PlayerState::InRoom {
                    player_id: player.clone(),
                    room_id: room_id.clone(),
                },
            );
        }

        tracing::info!(%room_id, %first, %second, "players matched");
    }

    /// A game id not already in use: 128 random bits as hex.
    fn fresh_game_id(&self) -> GameId {
        loop {
            let bytes: [u8; 16] = rand::rng().random();
            let game_id = GameId(bytes.iter().map(|b| format!("{b:02x}")).collect());
            if !self.games.contains_key(&game_id) {
                return game_id;
            }
        }
    }
}

/// Maps a rule check to the `bool` the public API returns.
fn settle(op: &'static str, player: &PlayerId, result: Result<(), Rejection>) -> bool {
    match result {
        Ok(()) => true,
        Err(reason) => {
            log_rejection(op, player, &reason);
            false
        }
    }
}

fn log_rejection(op: &'static str, player: &PlayerId, reason: &Rejection) {
    tracing::debug!(op, %player, %reason, "operation rejected");
}
