//! Timer tick background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Period of the UI refresh tick
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task that drives the timer's 1-second tick.
///
/// The interval only runs while the timer status needs ticking; otherwise the
/// task sleeps until the next state change. Tick failures are logged and the
/// loop carries on with the next period.
pub async fn tick_task(state: Arc<AppState>) {
    info!("Starting tick task");

    let mut snapshot_rx = state.subscribe();

    loop {
        let status = snapshot_rx.borrow_and_update().status;
        if !status.needs_tick() {
            debug!("Timer is {}, tick loop idle", status);
            if snapshot_rx.changed().await.is_err() {
                warn!("Snapshot channel closed, stopping tick task");
                return;
            }
            continue;
        }

        debug!("Tick loop armed for {}", status);
        let mut ticker = interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match state.tick() {
                        Ok(snapshot) if !snapshot.status.needs_tick() => {
                            debug!("Timer is {}, disarming tick loop", snapshot.status);
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => error!("Timer tick failed: {}", e),
                    }
                }

                changed = snapshot_rx.changed() => {
                    if changed.is_err() {
                        warn!("Snapshot channel closed, stopping tick task");
                        return;
                    }
                    if !snapshot_rx.borrow_and_update().status.needs_tick() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Shift, ShiftKind},
        services::{ManualClock, SilentAlarm, StaticShifts},
        state::TimerStatus,
        store::MemorySessionStore,
        timer::ShiftTimer,
    };
    use chrono::{DateTime, Local, TimeZone, Utc};
    use tokio::time::sleep;

    fn nine_am() -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2026, 6, 15, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    /// App state for a shift of `length_secs` starting at nine, loaded at `now`
    fn test_state(length_secs: i64, now: DateTime<Utc>) -> (Arc<AppState>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let shifts = Arc::new(StaticShifts::new(vec![Shift {
            id: "shift-1".to_string(),
            client_label: "client".to_string(),
            start_at: nine_am(),
            end_at: nine_am() + chrono::Duration::seconds(length_secs),
            kind: ShiftKind::Work,
        }]));
        let timer = ShiftTimer::new(
            shifts,
            Arc::new(MemorySessionStore::new()),
            Arc::new(SilentAlarm),
            clock.clone(),
        );
        let state = Arc::new(AppState::new(timer, 0, "127.0.0.1".to_string()));
        state.refresh().unwrap();
        (state, clock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_time_arrival_through_task() {
        let (state, clock) = test_state(3600, nine_am() - chrono::Duration::seconds(2));
        assert_eq!(state.get_snapshot().status, TimerStatus::Waiting);
        let task = tokio::spawn(tick_task(state.clone()));

        clock.advance(chrono::Duration::seconds(2));
        sleep(TICK_PERIOD * 2).await;
        assert_eq!(state.get_snapshot().status, TimerStatus::StartAlarm);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_reaches_end_alarm_through_task() {
        let (state, clock) = test_state(5, nine_am());
        state.start().unwrap();
        let task = tokio::spawn(tick_task(state.clone()));

        clock.advance(chrono::Duration::seconds(10));
        sleep(TICK_PERIOD * 2).await;
        let snapshot = state.get_snapshot();
        assert_eq!(snapshot.status, TimerStatus::EndAlarm);
        assert_eq!(snapshot.seconds_remaining, 0);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_rearms_after_pause_and_resume() {
        let (state, clock) = test_state(5, nine_am());
        state.start().unwrap();
        let task = tokio::spawn(tick_task(state.clone()));

        clock.advance(chrono::Duration::seconds(2));
        sleep(TICK_PERIOD * 2).await;
        assert_eq!(state.pause().unwrap().seconds_remaining, 3);

        // Frozen while paused, however long the wait
        clock.advance(chrono::Duration::seconds(60));
        sleep(TICK_PERIOD * 5).await;
        let snapshot = state.get_snapshot();
        assert_eq!(snapshot.status, TimerStatus::Paused);
        assert_eq!(snapshot.seconds_remaining, 3);

        state.resume().unwrap();
        clock.advance(chrono::Duration::seconds(10));
        sleep(TICK_PERIOD * 2).await;
        assert_eq!(state.get_snapshot().status, TimerStatus::EndAlarm);
        task.abort();
    }
}
