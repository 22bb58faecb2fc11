//! Integration tests for the fixed-interval ticker.
//!
//! Uses paused Tokio time so `sleep_until` resolves as soon as the
//! runtime is idle and the clock can be pushed forward by hand.

use std::time::Duration;

use gomoku_tick::{TickConfig, Ticker};

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_event_driven() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.tick_period(), None);
}

#[test]
fn test_with_period_sets_period() {
    let cfg = TickConfig::with_period(Duration::from_millis(250));
    assert_eq!(cfg.tick_period(), Some(Duration::from_millis(250)));
}

#[test]
fn test_zero_period_is_event_driven() {
    let cfg = TickConfig::with_period(Duration::ZERO);
    assert_eq!(cfg.tick_period(), None);
    assert!(Ticker::with_period(Duration::ZERO).is_event_driven());
}

// =========================================================================
// Ticker
// =========================================================================

#[test]
fn test_ticker_initial_state() {
    let t = Ticker::with_period(Duration::from_millis(50));
    assert_eq!(t.tick_count(), 0);
    assert!(!t.is_event_driven());
    assert_eq!(t.period(), Some(Duration::from_millis(50)));
}

#[test]
fn test_ticker_event_driven() {
    let t = Ticker::new(TickConfig::default());
    assert!(t.is_event_driven());
    assert_eq!(t.period(), None);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_after_one_period() {
    let mut t = Ticker::with_period(Duration::from_millis(50));
    let start = tokio::time::Instant::now();

    let info = t.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(start.elapsed(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_ticks_increment_monotonically() {
    let mut t = Ticker::with_period(Duration::from_millis(10));
    for expected in 1..=5 {
        let info = t.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
    assert_eq!(t.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_skips_ahead_instead_of_bursting() {
    let mut t = Ticker::with_period(Duration::from_millis(100));
    t.wait_for_tick().await;

    // Simulate a slow pass: 350 ms of work before waiting again.
    tokio::time::advance(Duration::from_millis(350)).await;
    let info = t.wait_for_tick().await;
    assert_eq!(info.ticks_skipped, 2);

    // The next tick is a full period from the late one, not immediate.
    let before = tokio::time::Instant::now();
    t.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_event_driven_never_fires() {
    let mut t = Ticker::new(TickConfig::default());
    let result = tokio::time::timeout(
        Duration::from_secs(3600),
        t.wait_for_tick(),
    )
    .await;
    assert!(result.is_err(), "event-driven ticker must pend forever");
    assert_eq!(t.tick_count(), 0);
}
