//! A value paired with per-subscriber event queues.
//!
//! [`Observable`] is the pub-sub building block behind every room and
//! game. Writers change the value and announce the change in one step
//! ([`Observable::update`]); each subscriber gets its own bounded queue.
//!
//! # Delivery
//!
//! Fan-out never blocks the writer. If a subscriber's queue is full the
//! event is dropped for that subscriber and a warning is logged. There
//! is no replay: a subscriber that suspects a gap subscribes again and
//! starts over from the fresh snapshot.
//!
//! # Concurrency note
//!
//! `Observable` is not synchronized by itself. It lives inside the
//! coordinator's directories and is only touched under that lock, so
//! events are queued in exactly the order mutations are applied.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

/// The receiving end of a subscription.
///
/// Cheap to clone; clones share one queue, so each event is received
/// once no matter how many clones exist. `recv` returns `None` after the
/// observable is dropped and the queued events have been drained.
pub struct EventSource<E> {
    rx: Arc<Mutex<mpsc::Receiver<E>>>,
}

impl<E> Clone for EventSource<E> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<E> EventSource<E> {
    /// Waits for the next event.
    pub async fn recv(&self) -> Option<E> {
        self.rx.lock().await.recv().await
    }

    /// Takes the next queued event without waiting.
    ///
    /// Returns `None` if the queue is empty or another task is in the
    /// middle of `recv`.
    pub fn try_recv(&self) -> Option<E> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Returns `true` if `other` reads from the same queue.
    pub fn same_queue(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rx, &other.rx)
    }

    /// Number of live handles on this queue, the observable's own included.
    fn handles(&self) -> usize {
        Arc::strong_count(&self.rx)
    }
}

struct Subscriber<E> {
    tx: mpsc::Sender<E>,
    source: EventSource<E>,
}

/// A value of type `S` broadcasting events of type `E`.
pub struct Observable<S, E> {
    value: S,
    subscribers: HashMap<String, Subscriber<E>>,
    capacity: usize,
}

impl<S: Clone, E: Clone> Observable<S, E> {
    /// Wraps `value`. Each subscriber queue holds up to `capacity` events
    /// (at least one).
    pub fn new(value: S, capacity: usize) -> Self {
        Self {
            value,
            subscribers: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Registers `subscriber` and returns its queue plus a snapshot.
    ///
    /// Idempotent: subscribing an id that is already registered returns
    /// the same queue it got the first time, with a fresh snapshot.
    pub fn subscribe(&mut self, subscriber: &str) -> (EventSource<E>, S) {
        let capacity = self.capacity;
        let entry = self
            .subscribers
            .entry(subscriber.to_string())
            .or_insert_with(|| {
                let (tx, rx) = mpsc::channel(capacity);
                Subscriber {
                    tx,
                    source: EventSource {
                        rx: Arc::new(Mutex::new(rx)),
                    },
                }
            });
        (entry.source.clone(), self.value.clone())
    }

    /// Drops `subscriber`'s queue. Unknown ids are logged and ignored.
    pub fn unsubscribe(&mut self, subscriber: &str) -> bool {
        if self.subscribers.remove(subscriber).is_some() {
            true
        } else {
            tracing::warn!(subscriber, "unsubscribe of unknown subscriber");
            false
        }
    }

    /// Drops `subscriber`'s queue only if nobody outside the observable
    /// still holds an [`EventSource`] for it.
    ///
    /// A subscriber that re-subscribed under the same id shares the old
    /// queue, so a late cleanup for the old handle must leave it alone.
    pub fn unsubscribe_if_unused(&mut self, subscriber: &str) -> bool {
        match self.subscribers.get(subscriber) {
            Some(entry) if entry.source.handles() > 1 => {
                tracing::debug!(subscriber, "queue still in use, keeping subscription");
                false
            }
            Some(_) => {
                self.subscribers.remove(subscriber);
                true
            }
            None => {
                tracing::debug!(subscriber, "subscription already gone");
                false
            }
        }
    }

    /// Queues `event` for every subscriber. Returns how many got it.
    pub fn notify(&self, event: E) -> usize {
        let mut delivered = 0;
        for (id, subscriber) in &self.subscribers {
            match subscriber.tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber = %id,
                        capacity = self.capacity,
                        "subscriber queue full, dropping event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(subscriber = %id, "subscriber queue closed");
                }
            }
        }
        delivered
    }

    /// Mutates the value and queues the event `change` returns, as one
    /// step. Returns the number of subscribers that got the event.
    pub fn update<F>(&mut self, change: F) -> usize
    where
        F: FnOnce(&mut S) -> E,
    {
        let event = change(&mut self.value);
        self.notify(event)
    }

    /// The live value. Use [`update`](Self::update) to change it.
    pub fn get(&self) -> &S {
        &self.value
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns `true` if `subscriber` is registered.
    pub fn is_subscribed(&self, subscriber: &str) -> bool {
        self.subscribers.contains_key(subscriber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Counter = Observable<u32, u32>;

    #[test]
    fn test_subscribe_returns_snapshot() {
        let mut cell = Counter::new(5, 4);
        let (_events, snapshot) = cell.subscribe("a");
        assert_eq!(snapshot, 5);
        assert_eq!(cell.subscriber_count(), 1);
    }

    #[test]
    fn test_subscribe_twice_returns_same_queue() {
        let mut cell = Counter::new(0, 4);
        let (first, _) = cell.subscribe("a");
        cell.update(|v| {
            *v += 1;
            *v
        });
        let (second, snapshot) = cell.subscribe("a");

        assert!(first.same_queue(&second));
        assert_eq!(snapshot, 1);
        assert_eq!(cell.subscriber_count(), 1);
        assert_eq!(second.try_recv(), Some(1));
        assert_eq!(first.try_recv(), None, "each event is received once");
    }

    #[test]
    fn test_snapshot_is_detached_from_live_value() {
        let mut cell = Observable::<Vec<u32>, ()>::new(vec![1], 4);
        let (_events, mut snapshot) = cell.subscribe("a");
        snapshot.push(2);
        assert_eq!(cell.get(), &vec![1]);
    }

    #[test]
    fn test_notify_fans_out_to_every_subscriber() {
        let mut cell = Counter::new(0, 4);
        let (a, _) = cell.subscribe("a");
        let (b, _) = cell.subscribe("b");

        assert_eq!(cell.notify(7), 2);
        assert_eq!(a.try_recv(), Some(7));
        assert_eq!(b.try_recv(), Some(7));
    }

    #[test]
    fn test_notify_drops_when_queue_full() {
        let mut cell = Counter::new(0, 2);
        let (slow, _) = cell.subscribe("slow");
        let (fast, _) = cell.subscribe("fast");

        cell.notify(1);
        cell.notify(2);
        assert_eq!(fast.try_recv(), Some(1));
        assert_eq!(fast.try_recv(), Some(2));

        // `slow` is at capacity: the third event is dropped for it only.
        assert_eq!(cell.notify(3), 1);
        assert_eq!(fast.try_recv(), Some(3));
        assert_eq!(slow.try_recv(), Some(1));
        assert_eq!(slow.try_recv(), Some(2));
        assert_eq!(slow.try_recv(), None);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let mut cell = Counter::new(0, 4);
        assert!(!cell.unsubscribe("ghost"));
        cell.subscribe("a");
        assert!(cell.unsubscribe("a"));
        assert!(!cell.is_subscribed("a"));
        assert_eq!(cell.notify(1), 0);
    }

    #[test]
    fn test_unsubscribe_if_unused_keeps_queue_while_held() {
        let mut cell = Counter::new(0, 4);
        let (first, _) = cell.subscribe("a");
        drop(first);
        let (second, _) = cell.subscribe("a");

        assert!(!cell.unsubscribe_if_unused("a"));
        assert_eq!(cell.notify(3), 1);
        assert_eq!(second.try_recv(), Some(3));

        drop(second);
        assert!(cell.unsubscribe_if_unused("a"));
        assert!(!cell.is_subscribed("a"));
        assert!(!cell.unsubscribe_if_unused("a"));
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut cell = Counter::new(0, 0);
        let (events, _) = cell.subscribe("a");
        assert_eq!(cell.notify(9), 1);
        assert_eq!(events.try_recv(), Some(9));
    }

    #[tokio::test]
    async fn test_recv_drains_then_ends_after_drop() {
        let mut cell = Counter::new(0, 4);
        let (events, _) = cell.subscribe("a");
        cell.notify(1);
        cell.notify(2);
        drop(cell);

        assert_eq!(events.recv().await, Some(1));
        assert_eq!(events.recv().await, Some(2));
        assert_eq!(events.recv().await, None);
    }
}
