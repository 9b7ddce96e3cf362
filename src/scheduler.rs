//! Timer Tasks
//!
//! Two independent periodic loops drive the engine: the passive XP drain
//! (1s cadence by default, alive only while a drain-type persona is active)
//! and the active-time accrual (60s cadence). Each loop is a spawned tokio
//! task stopped through its own `CancellationToken`; ticks call back into
//! the engine, which serializes all state access behind one lock, so no
//! tick handler ever interleaves with another mutation.

use crate::engine::CompanionEngine;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Spawn the passive drain loop.
///
/// The caller owns the token; cancelling it stops the loop. A fresh loop is
/// spawned on every switch to a drain-type persona, never two at once.
pub(crate) fn spawn_drain_loop(
    engine: CompanionEngine,
    token: CancellationToken,
    interval_secs: u64,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval yields immediately on the first tick; skip it
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => engine.drain_tick().await,
                _ = token.cancelled() => break,
            }
        }

        debug!("drain loop stopped");
    });
}

/// Spawn the active-time accrual loop.
pub(crate) fn spawn_active_time_loop(
    engine: CompanionEngine,
    token: CancellationToken,
    interval_secs: u64,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => engine.flush_active_time().await,
                _ = token.cancelled() => break,
            }
        }

        debug!("active-time loop stopped");
    });
}
