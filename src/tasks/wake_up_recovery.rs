//! Wake-up recovery background tasks
//!
//! A suspended host or process is the daemon's equivalent of an app being
//! backgrounded. Both are detected here and answered with a full timer load.

use std::{sync::Arc, time::Duration};
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use crate::{state::AppState, utils::resume_signals};

/// Wall-clock time that passed without the monotonic clock advancing.
///
/// The monotonic clock stops while the host sleeps, so the difference is
/// roughly how long the machine was suspended.
pub fn suspend_gap(last_wall: DateTime<Utc>, wall: DateTime<Utc>, monotonic_elapsed: Duration) -> Duration {
    let wall_elapsed = (wall - last_wall).to_std().unwrap_or_default();
    wall_elapsed.saturating_sub(monotonic_elapsed)
}

fn reload(state: &AppState, reason: &str) {
    info!("{}, reloading timer", reason);
    match state.refresh() {
        Ok(snapshot) => info!(
            "Timer reloaded: status={}, remaining={}s",
            snapshot.status, snapshot.seconds_remaining
        ),
        Err(e) => warn!("Failed to reload timer after {}: {}", reason, e),
    }
}

/// Background task that detects host sleep and day rollover
pub async fn wake_up_recovery_task(state: Arc<AppState>, check_every: Duration, threshold: Duration) {
    info!(
        "Starting wake-up recovery task (every {}s, threshold {}s)",
        check_every.as_secs(),
        threshold.as_secs()
    );

    let mut ticker = interval(check_every);
    let mut last_wall = Utc::now();
    let mut last_mono = Instant::now();

    loop {
        ticker.tick().await;

        let wall = Utc::now();
        let mono = Instant::now();
        let gap = suspend_gap(last_wall, wall, mono.duration_since(last_mono));
        last_wall = wall;
        last_mono = mono;

        if gap > threshold {
            reload(&state, &format!("System wake-up detected after ~{}s asleep", gap.as_secs()));
            continue;
        }

        match state.needs_reload() {
            Ok(true) => reload(&state, "Calendar day changed"),
            Ok(false) => {}
            Err(e) => warn!("Failed to check for day rollover: {}", e),
        }
    }
}

/// Background task that reloads the timer when the process is continued (SIGCONT)
pub async fn resume_signal_task(state: Arc<AppState>) {
    let mut signals = match resume_signals() {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Cannot watch for SIGCONT, process resume will not reload the timer: {}", e);
            return;
        }
    };

    while let Some(signal) = signals.next().await {
        debug!("Received signal: {}", signal);
        reload(&state, "Process resumed");
    }
}
