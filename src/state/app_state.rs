//! Main application state management

use std::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use super::TimerSnapshot;
use crate::{
    error::TimerError,
    models::Session,
    services::AlarmSettings,
    timer::ShiftTimer,
};

/// Main application state: sole owner of the shift timer
pub struct AppState {
    /// The timer state machine; every command and tick goes through this lock
    timer: Mutex<ShiftTimer>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Channel for timer snapshot updates
    snapshot_tx: watch::Sender<TimerSnapshot>,
}

impl AppState {
    /// Wrap a timer; call [`refresh`](Self::refresh) to perform the initial load
    pub fn new(timer: ShiftTimer, port: u16, host: String) -> Self {
        let (snapshot_tx, _) = watch::channel(timer.snapshot());

        Self {
            timer: Mutex::new(timer),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            snapshot_tx,
        }
    }

    fn lock_timer(&self) -> Result<MutexGuard<'_, ShiftTimer>, TimerError> {
        self.timer
            .lock()
            .map_err(|e| TimerError::StatePoisoned(e.to_string()))
    }

    /// Publish a snapshot to watchers if it differs from the last one
    fn publish(&self, snapshot: &TimerSnapshot) {
        self.snapshot_tx.send_if_modified(|current| {
            if current != snapshot {
                *current = snapshot.clone();
                true
            } else {
                false
            }
        });
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Run a user command against the timer and publish the resulting state.
    ///
    /// The snapshot is published even when the command fails, since a failed
    /// clock-in still starts the countdown.
    pub fn run_command<F>(&self, action: &str, command: F) -> Result<TimerSnapshot, (TimerError, TimerSnapshot)>
    where
        F: FnOnce(&mut ShiftTimer) -> Result<(), TimerError>,
    {
        let mut timer = match self.lock_timer() {
            Ok(timer) => timer,
            Err(e) => return Err((e, self.get_snapshot())),
        };

        info!("Command: {}", action);
        let result = command(&mut *timer);
        let snapshot = timer.snapshot();
        drop(timer); // Release the lock early

        self.record_action(action);
        self.publish(&snapshot);

        match result {
            Ok(()) => Ok(snapshot),
            Err(e) => Err((e, snapshot)),
        }
    }

    pub fn start(&self) -> Result<TimerSnapshot, (TimerError, TimerSnapshot)> {
        self.run_command("start", |t| t.start())
    }

    pub fn pause(&self) -> Result<TimerSnapshot, (TimerError, TimerSnapshot)> {
        self.run_command("pause", |t| t.pause())
    }

    pub fn resume(&self) -> Result<TimerSnapshot, (TimerError, TimerSnapshot)> {
        self.run_command("resume", |t| t.resume())
    }

    pub fn stop(&self) -> Result<TimerSnapshot, (TimerError, TimerSnapshot)> {
        self.run_command("stop", |t| t.stop())
    }

    pub fn reset(&self) -> Result<TimerSnapshot, (TimerError, TimerSnapshot)> {
        self.run_command("reset", |t| t.reset())
    }

    /// Reload shift and session state (mount, pull-to-refresh, wake-up)
    pub fn refresh(&self) -> Result<TimerSnapshot, TimerError> {
        let snapshot = self.lock_timer()?.refresh();
        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Periodic tick; samples the clock only
    pub fn tick(&self) -> Result<TimerSnapshot, TimerError> {
        let snapshot = {
            let mut timer = self.lock_timer()?;
            timer.tick();
            timer.snapshot()
        };
        debug!(
            "Tick: status={}, remaining={}s",
            snapshot.status, snapshot.seconds_remaining
        );
        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Check if the calendar day rolled over since the last load
    pub fn needs_reload(&self) -> Result<bool, TimerError> {
        Ok(self.lock_timer()?.needs_reload())
    }

    pub fn session_history(&self) -> Result<Vec<Session>, TimerError> {
        self.lock_timer()?.session_history()
    }

    pub fn alarm_settings(&self) -> Result<AlarmSettings, TimerError> {
        Ok(self.lock_timer()?.alarm_settings())
    }

    pub fn set_alarm_settings(&self, settings: AlarmSettings) -> Result<(), TimerError> {
        self.lock_timer()?.set_alarm_settings(settings);
        self.record_action("alarm-settings");
        Ok(())
    }

    /// Silence the alarm and drop timer state before exit
    pub fn teardown(&self) -> Result<(), TimerError> {
        let snapshot = {
            let mut timer = self.lock_timer()?;
            timer.teardown();
            timer.snapshot()
        };
        self.publish(&snapshot);
        Ok(())
    }

    /// Latest published snapshot
    pub fn get_snapshot(&self) -> TimerSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
