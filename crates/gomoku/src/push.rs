//! Push feeds: a subscription as a stream of [`Frame`]s.
//!
//! A feed yields the subscribe-time snapshot as `Frame::Initial`, then one
//! `Frame::Event` per change. It ends when the room or game goes away and
//! the remaining events are drained. Dropping a feed unsubscribes it.

use std::sync::Arc;

use futures_util::Stream;
use futures_util::stream;
use gomoku_protocol::{
    Frame, GameId, GameState, GameStateChange, RoomId, RoomState,
    RoomStateChange,
};
use gomoku_room::{EventSource, ServerState};

/// What a feed is subscribed to.
#[derive(Clone)]
enum Target {
    Room(RoomId),
    Game(GameId),
}

/// A feed's queue plus the cleanup to run when the feed is dropped.
///
/// `Drop` is synchronous and unsubscribing takes the coordinator lock,
/// so the actual work runs in a spawned task. The queue handle is let go
/// first, so the task only finds it held if the client has already
/// subscribed again under the same id.
struct FeedSubscription<E> {
    state: Arc<ServerState>,
    target: Target,
    subscriber: String,
    events: Option<EventSource<E>>,
}

impl<E> FeedSubscription<E> {
    async fn next_event(&self) -> Option<E> {
        self.events.as_ref()?.recv().await
    }
}

impl<E> Drop for FeedSubscription<E> {
    fn drop(&mut self) {
        drop(self.events.take());
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(subscriber = %self.subscriber, "no runtime, skipping unsubscribe");
            return;
        };
        let state = Arc::clone(&self.state);
        let subscriber = self.subscriber.clone();
        let target = self.target.clone();
        runtime.spawn(async move {
            match target {
                Target::Room(room_id) => {
                    state.unsubscribe_room_if_unused(&room_id, &subscriber).await;
                }
                Target::Game(game_id) => {
                    state.unsubscribe_game_if_unused(&game_id, &subscriber).await;
                }
            }
        });
    }
}

/// Subscribes `subscriber` to a room and returns its feed.
///
/// `None` if the room doesn't exist. The feed ends after `delete` or
/// `game_start`, since the room is gone at that point.
pub async fn room_feed(
    state: &Arc<ServerState>,
    room_id: &RoomId,
    subscriber: &str,
) -> Option<impl Stream<Item = Frame<RoomState, RoomStateChange>> + Send + 'static> {
    let (events, snapshot) = state.subscribe_room(room_id, subscriber).await?;
    tracing::debug!(%room_id, subscriber, "room feed opened");
    let subscription = FeedSubscription {
        state: Arc::clone(state),
        target: Target::Room(room_id.clone()),
        subscriber: subscriber.to_string(),
        events: Some(events),
    };
    Some(feed(snapshot, subscription))
}

/// Subscribes `subscriber` to a game and returns its feed.
pub async fn game_feed(
    state: &Arc<ServerState>,
    game_id: &GameId,
    subscriber: &str,
) -> Option<impl Stream<Item = Frame<GameState, GameStateChange>> + Send + 'static> {
    let (events, snapshot) = state.subscribe_game(game_id, subscriber).await?;
    tracing::debug!(%game_id, subscriber, "game feed opened");
    let subscription = FeedSubscription {
        state: Arc::clone(state),
        target: Target::Game(game_id.clone()),
        subscriber: subscriber.to_string(),
        events: Some(events),
    };
    Some(feed(snapshot, subscription))
}

fn feed<S, E>(
    snapshot: S,
    subscription: FeedSubscription<E>,
) -> impl Stream<Item = Frame<S, E>> + Send + 'static
where
    S: Send + 'static,
    E: Send + 'static,
{
    stream::unfold(
        (Some(snapshot), subscription),
        |(snapshot, subscription)| async move {
            if let Some(state) = snapshot {
                return Some((Frame::Initial(state), (None, subscription)));
            }
            let event = subscription.next_event().await?;
            Some((Frame::Event(event), (None, subscription)))
        },
    )
}
