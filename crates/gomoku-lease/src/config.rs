//! Lease configuration.

use std::time::Duration;

/// Number of six-digit decimal ids.
const FULL_ID_SPACE: u32 = 1_000_000;

/// Configuration for a [`RoomIdPool`](crate::RoomIdPool).
///
/// The defaults are generous: a room that is never renewed still keeps
/// its id for well over half a day before the reclaimer takes it back.
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    /// How many ids the pool hands out, `000000` up to `id_space - 1`.
    ///
    /// Default: the full one million. Smaller spaces are mostly useful
    /// in tests.
    pub id_space: u32,

    /// How long a lease lives without renewal.
    ///
    /// Default: 60 000 seconds.
    pub lease_duration: Duration,

    /// How often the reclaimer scans for expired leases.
    ///
    /// Default: 60 seconds. Zero turns the reclaimer off.
    pub reclaim_interval: Duration,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            id_space: FULL_ID_SPACE,
            lease_duration: Duration::from_secs(60_000),
            reclaim_interval: Duration::from_secs(60),
        }
    }
}

impl LeaseConfig {
    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called by [`RoomIdPool::new`](crate::RoomIdPool::new). An id space
    /// larger than six digits can express is capped.
    pub fn validated(mut self) -> Self {
        if self.id_space > FULL_ID_SPACE {
            tracing::warn!(
                id_space = self.id_space,
                max = FULL_ID_SPACE,
                "id_space exceeds six digits, clamping"
            );
            self.id_space = FULL_ID_SPACE;
        }
        self
    }
}
