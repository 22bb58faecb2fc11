//! The room-id pool: a shuffled queue of free ids plus a lease table.

use std::collections::{HashMap, VecDeque};

use gomoku_protocol::RoomId;
use gomoku_tick::Ticker;
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{LeaseConfig, PoolError};

/// A claim on a room id.
///
/// `issued_at` is reset by every renewal; the lease expires once
/// `lease_duration` has passed since then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub room_id: RoomId,
    pub issued_at: Instant,
}

/// Everything guarded by the pool's lock.
///
/// An id index is always in exactly one of the two collections:
/// queued in `available`, or keyed in `leases`.
struct PoolInner {
    available: VecDeque<u32>,
    leases: HashMap<u32, Lease>,
}

/// Hands out unique six-digit room ids and takes them back.
///
/// ## Lifecycle of an id
///
/// ```text
///            acquire()             release() / lease expiry
/// [available] ───────→ [leased] ──────────────────────────→ [available]
///                         │  ↑
///                         └──┘ renew()
/// ```
///
/// Ids start in random order so that consecutive rooms don't get
/// guessable, consecutive ids. Freed ids go to the back of the queue.
pub struct RoomIdPool {
    inner: Mutex<PoolInner>,
    config: LeaseConfig,
}

impl RoomIdPool {
    /// Creates a pool holding every id in the configured space, shuffled.
    pub fn new(config: LeaseConfig) -> Self {
        let config = config.validated();

        let mut ids: Vec<u32> = (0..config.id_space).collect();
        ids.shuffle(&mut rand::rng());

        tracing::debug!(
            id_space = config.id_space,
            lease_secs = config.lease_duration.as_secs(),
            "room id pool created"
        );

        Self {
            inner: Mutex::new(PoolInner {
                available: ids.into(),
                leases: HashMap::new(),
            }),
            config,
        }
    }

    /// Leases the id at the front of the queue.
    ///
    /// # Errors
    /// Returns [`PoolError::Exhausted`] when every id is leased.
    pub async fn acquire(&self) -> Result<RoomId, PoolError> {
        let mut inner = self.inner.lock().await;
        let index = inner.available.pop_front().ok_or(PoolError::Exhausted {
            capacity: self.config.id_space,
        })?;

        let room_id = RoomId::from_index(index);
        inner.leases.insert(
            index,
            Lease {
                room_id: room_id.clone(),
                issued_at: Instant::now(),
            },
        );

        tracing::debug!(%room_id, available = inner.available.len(), "room id leased");
        Ok(room_id)
    }

    /// Returns a leased id to the pool ahead of its expiry.
    ///
    /// The lease record is dropped first, so the id can't be queued twice.
    /// Returns `false` (and logs) if the id wasn't leased.
    pub async fn release(&self, room_id: &RoomId) -> bool {
        let index = room_id.index();
        let mut inner = self.inner.lock().await;
        if inner.leases.remove(&index).is_none() {
            tracing::warn!(%room_id, "release of a room id that is not leased");
            return false;
        }
        inner.available.push_back(index);
        tracing::debug!(%room_id, "room id released");
        true
    }

    /// Restarts the lease clock for an id.
    ///
    /// Returns `false` (and logs) if the id isn't currently leased.
    pub async fn renew(&self, room_id: &RoomId) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.leases.get_mut(&room_id.index()) {
            Some(lease) => {
                lease.issued_at = Instant::now();
                tracing::trace!(%room_id, "room id lease renewed");
                true
            }
            None => {
                tracing::warn!(%room_id, "renew of a room id that is not leased");
                false
            }
        }
    }

    /// Returns every id whose lease has run past `lease_duration` to the
    /// pool. Returns the reclaimed ids.
    pub async fn reclaim_expired(&self) -> Vec<RoomId> {
        let lease_duration = self.config.lease_duration;
        let mut inner = self.inner.lock().await;

        let expired: Vec<u32> = inner
            .leases
            .iter()
            .filter(|(_, lease)| lease.issued_at.elapsed() > lease_duration)
            .map(|(index, _)| *index)
            .collect();

        let mut reclaimed = Vec::with_capacity(expired.len());
        for index in expired {
            if let Some(lease) = inner.leases.remove(&index) {
                inner.available.push_back(index);
                tracing::info!(room_id = %lease.room_id, "room id lease expired, reclaimed");
                reclaimed.push(lease.room_id);
            }
        }
        reclaimed
    }

    /// Runs [`reclaim_expired`](Self::reclaim_expired) every
    /// `reclaim_interval` until `cancel` fires.
    pub async fn run_reclaimer(&self, cancel: CancellationToken) {
        let mut ticker = Ticker::with_period(self.config.reclaim_interval);
        tracing::info!(
            interval_secs = self.config.reclaim_interval.as_secs_f64(),
            "room id reclaimer started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.wait_for_tick() => {
                    let reclaimed = self.reclaim_expired().await;
                    if !reclaimed.is_empty() {
                        tracing::debug!(count = reclaimed.len(), "reclaim pass finished");
                    }
                }
            }
        }

        tracing::info!("room id reclaimer stopped");
    }

    /// The lease record for an id, if it is leased.
    pub async fn lease(&self, room_id: &RoomId) -> Option<Lease> {
        self.inner.lock().await.leases.get(&room_id.index()).cloned()
    }

    /// Returns `true` if the id is currently leased.
    pub async fn is_leased(&self, room_id: &RoomId) -> bool {
        self.inner.lock().await.leases.contains_key(&room_id.index())
    }

    /// Number of ids ready to be acquired.
    pub async fn available(&self) -> usize {
        self.inner.lock().await.available.len()
    }

    /// Number of ids currently leased.
    pub async fn leased(&self) -> usize {
        self.inner.lock().await.leases.len()
    }

    /// The configuration this pool was built with (after validation).
    pub fn config(&self) -> &LeaseConfig {
        &self.config
    }
}

impl Default for RoomIdPool {
    fn default() -> Self {
        Self::new(LeaseConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;

    fn small_pool(id_space: u32) -> RoomIdPool {
        RoomIdPool::new(LeaseConfig {
            id_space,
            lease_duration: Duration::from_secs(10),
            reclaim_interval: Duration::from_secs(1),
        })
    }

    #[tokio::test]
    async fn test_new_pool_holds_whole_space() {
        let pool = small_pool(100);
        assert_eq!(pool.available().await, 100);
        assert_eq!(pool.leased().await, 0);
    }

    #[tokio::test]
    async fn test_acquire_returns_unique_six_digit_ids() {
        let pool = small_pool(50);
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let id = pool.acquire().await.unwrap();
            assert_eq!(id.as_str().len(), 6);
            assert!(id.index() < 50);
            assert!(seen.insert(id), "ids must not repeat while leased");
        }
        assert_eq!(pool.leased().await, 50);
    }

    #[tokio::test]
    async fn test_acquire_records_lease() {
        let pool = small_pool(10);
        let id = pool.acquire().await.unwrap();
        let lease = pool.lease(&id).await.expect("lease recorded");
        assert_eq!(lease.room_id, id);
    }

    #[tokio::test]
    async fn test_release_unleased_is_noop() {
        let pool = small_pool(3);
        let id = RoomId::from_index(1);
        assert!(!pool.release(&id).await);
        assert_eq!(pool.available().await, 3, "must not queue a duplicate");
    }

    #[tokio::test]
    async fn test_release_twice_only_queues_once() {
        let pool = small_pool(2);
        let id = pool.acquire().await.unwrap();
        assert!(pool.release(&id).await);
        assert!(!pool.release(&id).await);
        assert_eq!(pool.available().await, 2);
    }

    #[tokio::test]
    async fn test_renew_unleased_returns_false() {
        let pool = small_pool(3);
        assert!(!pool.renew(&RoomId::from_index(0)).await);
    }
}
