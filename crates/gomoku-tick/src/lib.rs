//! Fixed-interval tick scheduler for the lobby's background loops.
//!
//! The matchmaker and the room-id reclaimer both wake on a fixed period,
//! do a short pass, and go back to sleep. [`Ticker`] owns the "when" so
//! each loop only has to own the "what".
//!
//! # Event-driven mode
//!
//! A zero period puts the ticker in event-driven mode:
//! [`Ticker::wait_for_tick`] pends forever. This lets a loop be switched
//! off by configuration without changing its `select!`.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = cancel.cancelled() => break,
//!         _ = ticker.wait_for_tick() => { /* one pass */ }
//!     }
//! }
//! ```
//!
//! The future returned by `wait_for_tick` is cancel-safe: dropping it
//! leaves the next deadline untouched.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`Ticker`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. `Duration::ZERO` means event-driven (never fires).
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::ZERO,
        }
    }
}

impl TickConfig {
    /// A config for a specific period.
    pub fn with_period(period: Duration) -> Self {
        Self { period }
    }

    /// The period, or `None` in event-driven mode.
    pub fn tick_period(&self) -> Option<Duration> {
        if self.period.is_zero() {
            None
        } else {
            Some(self.period)
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a tick, returned by [`Ticker::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// Whole periods that were skipped because the previous pass ran long.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Fixed-interval scheduler. One per background loop.
///
/// When a tick fires late, the next deadline is scheduled from *now*
/// rather than from the missed deadline, so a slow pass never causes a
/// burst of back-to-back passes.
pub struct Ticker {
    period: Option<Duration>,
    tick_count: u64,
    next_tick: Option<Instant>,
}

impl Ticker {
    /// Creates a ticker. The first tick is one period away.
    pub fn new(config: TickConfig) -> Self {
        let period = config.tick_period();
        let next_tick = period.map(|p| Instant::now() + p);

        match period {
            None => debug!("ticker created in event-driven mode"),
            Some(p) => debug!(
                period_ms = p.as_secs_f64() * 1000.0,
                "ticker created"
            ),
        }

        Self {
            period,
            tick_count: 0,
            next_tick,
        }
    }

    /// Creates a ticker for a period with default settings.
    pub fn with_period(period: Duration) -> Self {
        Self::new(TickConfig::with_period(period))
    }

    /// Waits until the next tick is due.
    ///
    /// In event-driven mode this future never resolves.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, period) = match (self.next_tick, self.period) {
            (Some(next), Some(period)) => (next, period),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let ticks_skipped = if late_by > period / 10 {
            (late_by.as_nanos() / period.as_nanos()) as u64
        } else {
            0
        };
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }

        self.next_tick = Some(now + period);

        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            ticks_skipped,
        }
    }

    /// Whether this ticker never fires.
    pub fn is_event_driven(&self) -> bool {
        self.period.is_none()
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The period, or `None` in event-driven mode.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}
