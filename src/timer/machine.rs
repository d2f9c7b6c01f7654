//! Shift timer state machine
//!
//! Turns the resolved shift, the session store and the wall clock into a
//! [`TimerStatus`], a remaining-seconds value and alarm edges. The machine is
//! the single owner of the countdown anchor; nothing else keeps timer state.
//!
//! ```text
//!  idle ── load ──► waiting ── start time ──► start_alarm ── start ──► active ◄──► paused
//!                                                                        │  pause/resume
//!                                                          remaining = 0 ▼
//!                              completed ◄────────── stop ─────────── end_alarm
//! ```
//!
//! Only [`ShiftTimer::refresh`], [`ShiftTimer::start`], [`ShiftTimer::stop`]
//! and [`ShiftTimer::reset`] touch the session store. [`ShiftTimer::tick`]
//! only samples the clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use super::{
    countdown::{self, CountdownAnchor},
    resolver,
};
use crate::{
    error::{StoreError, TimerError},
    models::{Session, Shift},
    services::{
        alarm::{AlarmSettings, AlarmTrigger, HapticTrigger, ALARM_HAPTIC_PATTERN, HAPTIC_REPEAT_SECS},
        clock::Clock,
        shifts::ShiftProvider,
    },
    state::{TimerSnapshot, TimerStatus},
    store::SessionStore,
};

/// The session the countdown belongs to
#[derive(Debug, Clone, PartialEq)]
enum SessionLink {
    None,
    /// Clock-in saved in the session store
    Stored(Session),
    /// Clock-in could not be saved; the countdown runs from memory only
    Unsaved { clock_in_at: DateTime<Utc> },
}

/// Timer state machine for the shift being worked today
pub struct ShiftTimer {
    status: TimerStatus,
    shift: Option<Shift>,
    session: SessionLink,
    /// Present only while counting down
    anchor: Option<CountdownAnchor>,
    /// Last sampled value; the frozen value while paused
    seconds_remaining: u64,
    total_shift_seconds: u64,
    loaded_day: Option<NaiveDate>,
    last_haptic_at: Option<DateTime<Utc>>,
    alarm_settings: AlarmSettings,

    shifts: Arc<dyn ShiftProvider>,
    store: Arc<dyn SessionStore>,
    alarm: Arc<dyn AlarmTrigger>,
    haptic: Option<Arc<dyn HapticTrigger>>,
    clock: Arc<dyn Clock>,
}

impl ShiftTimer {
    /// Create an idle timer. Call [`refresh`](Self::refresh) to load today's shift.
    pub fn new(
        shifts: Arc<dyn ShiftProvider>,
        store: Arc<dyn SessionStore>,
        alarm: Arc<dyn AlarmTrigger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status: TimerStatus::Idle,
            shift: None,
            session: SessionLink::None,
            anchor: None,
            seconds_remaining: 0,
            total_shift_seconds: 0,
            loaded_day: None,
            last_haptic_at: None,
            alarm_settings: AlarmSettings::default(),
            shifts,
            store,
            alarm,
            haptic: None,
            clock,
        }
    }

    pub fn with_haptic(mut self, haptic: Arc<dyn HapticTrigger>) -> Self {
        self.haptic = Some(haptic);
        self
    }

    pub fn with_alarm_settings(mut self, settings: AlarmSettings) -> Self {
        self.alarm_settings = settings;
        self
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn alarm_settings(&self) -> AlarmSettings {
        self.alarm_settings
    }

    /// Change the alarm sound; applies from the next alarm edge
    pub fn set_alarm_settings(&mut self, settings: AlarmSettings) {
        info!(
            "Alarm settings changed: sound={}, volume={}",
            settings.sound.as_str(),
            settings.volume
        );
        self.alarm_settings = settings;
    }

    /// Observable state for the presentation layer
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            status: self.status,
            shift: self.shift.clone(),
            session: match &self.session {
                SessionLink::Stored(session) => Some(session.clone()),
                _ => None,
            },
            seconds_remaining: self.seconds_remaining,
            total_shift_seconds: self.total_shift_seconds,
            alarm_active: self.status.alarm_active(),
        }
    }

    /// Check if the local calendar day changed since the last load
    pub fn needs_reload(&self) -> bool {
        let today = self.clock.now().with_timezone(&Local).date_naive();
        self.loaded_day != Some(today)
    }

    /// Sessions recorded for the current shift
    pub fn session_history(&self) -> Result<Vec<Session>, TimerError> {
        match &self.shift {
            Some(shift) => self
                .store
                .sessions_for_shift(&shift.id)
                .map_err(|e| TimerError::store("read", e)),
            None => Ok(Vec::new()),
        }
    }

    /// Reload today's shift and the open session, and recompute status.
    ///
    /// Never fails: session store read errors are logged and treated as
    /// "no open session".
    pub fn refresh(&mut self) -> TimerSnapshot {
        let now = self.clock.now();
        self.load(now);
        self.snapshot()
    }

    /// Clock in. Valid from `start_alarm`; from `paused` it resumes the open session.
    ///
    /// The session row is written before the status flips to `active`. If the
    /// write fails the countdown still starts from memory and
    /// [`TimerError::Unpersisted`] is returned so the caller can warn.
    pub fn start(&mut self) -> Result<(), TimerError> {
        let now = self.clock.now();
        let shift_id = match &self.shift {
            Some(shift) => shift.id.clone(),
            None => return Err(TimerError::NoShift),
        };

        match self.status {
            TimerStatus::StartAlarm => {}
            TimerStatus::Paused => {
                debug!("Start while paused resumes the open session");
                return self.resume();
            }
            status => {
                warn!("[FSM] Invalid transition: start from {}", status);
                return Err(TimerError::invalid("start", status));
            }
        }

        let remaining = self.total_shift_seconds;
        match self.store.open_session(&shift_id, now) {
            Ok(session) => {
                info!("Clocked in to shift {} (session {})", shift_id, session.id);
                self.session = SessionLink::Stored(session);
                self.begin_countdown(remaining, now);
                Ok(())
            }
            Err(e) => {
                error!("Failed to save clock-in for shift {}: {}", shift_id, e);
                self.session = SessionLink::Unsaved { clock_in_at: now };
                self.begin_countdown(remaining, now);
                Err(TimerError::Unpersisted { source: e })
            }
        }
    }

    /// Freeze the countdown. The session stays open.
    pub fn pause(&mut self) -> Result<(), TimerError> {
        let now = self.clock.now();
        self.advance_countdown(now);
        if self.status != TimerStatus::Active {
            warn!("[FSM] Invalid transition: pause from {}", self.status);
            return Err(TimerError::invalid("pause", self.status));
        }

        self.anchor = None;
        info!("Countdown paused with {}s remaining", self.seconds_remaining);
        self.set_status(TimerStatus::Paused, now);
        Ok(())
    }

    /// Continue a paused countdown from the frozen value
    pub fn resume(&mut self) -> Result<(), TimerError> {
        if self.status != TimerStatus::Paused {
            warn!("[FSM] Invalid transition: resume from {}", self.status);
            return Err(TimerError::invalid("resume", self.status));
        }

        let now = self.clock.now();
        info!("Countdown resumed with {}s remaining", self.seconds_remaining);
        self.begin_countdown(self.seconds_remaining, now);
        Ok(())
    }

    /// Clock out. Valid from `active`, `paused` and `end_alarm`.
    ///
    /// If the clock-out cannot be written the timer is left unchanged.
    pub fn stop(&mut self) -> Result<(), TimerError> {
        let now = self.clock.now();
        self.advance_countdown(now);
        if !matches!(
            self.status,
            TimerStatus::Active | TimerStatus::Paused | TimerStatus::EndAlarm
        ) {
            warn!("[FSM] Invalid transition: stop from {}", self.status);
            return Err(TimerError::invalid("stop", self.status));
        }

        self.close_open_session(now)?;
        self.session = SessionLink::None;
        self.anchor = None;
        self.set_status(TimerStatus::Completed, now);
        Ok(())
    }

    /// Close any open session, then re-evaluate status as a load would
    pub fn reset(&mut self) -> Result<(), TimerError> {
        let now = self.clock.now();
        self.close_open_session(now)?;
        self.session = SessionLink::None;
        self.anchor = None;
        info!("Timer reset");
        self.load(now);
        Ok(())
    }

    /// Periodic update: start-time arrival, countdown expiry, haptic repeat.
    ///
    /// Performs no storage I/O.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        match self.status {
            TimerStatus::Waiting => {
                let started = self.shift.as_ref().map(|s| now >= s.start_at).unwrap_or(false);
                if started {
                    info!("Shift start time reached");
                    self.set_status(TimerStatus::StartAlarm, now);
                }
            }
            TimerStatus::Active => self.advance_countdown(now),
            TimerStatus::StartAlarm | TimerStatus::EndAlarm => self.repeat_haptic(now),
            TimerStatus::Idle | TimerStatus::Paused | TimerStatus::Completed => {}
        }
    }

    /// Stop the alarm and drop all in-memory state, as on unmount.
    /// The next load starts from the session store alone.
    pub fn teardown(&mut self) {
        if self.status.alarm_active() {
            self.alarm.stop();
        }
        self.status = TimerStatus::Idle;
        self.shift = None;
        self.session = SessionLink::None;
        self.anchor = None;
        self.seconds_remaining = 0;
        self.total_shift_seconds = 0;
        self.loaded_day = None;
        self.last_haptic_at = None;
        debug!("Timer torn down");
    }

    fn load(&mut self, now: DateTime<Utc>) {
        let today = now.with_timezone(&Local).date_naive();
        self.loaded_day = Some(today);

        let shift = match self.select_shift(today, now) {
            Some(shift) => shift,
            None => {
                info!("No work shift today");
                self.shift = None;
                self.session = SessionLink::None;
                self.anchor = None;
                self.seconds_remaining = 0;
                self.total_shift_seconds = 0;
                self.set_status(TimerStatus::Idle, now);
                return;
            }
        };

        let same_shift = self.shift.as_ref().map(|s| s.id == shift.id).unwrap_or(false);
        let counting = same_shift
            && matches!(
                self.status,
                TimerStatus::Active | TimerStatus::Paused | TimerStatus::EndAlarm
            );
        self.total_shift_seconds = shift.duration_seconds();
        debug!(
            "Resolved shift {} for {} ({}s)",
            shift.id, shift.client_label, self.total_shift_seconds
        );

        let open = self.store.find_open_session(&shift.id);
        self.shift = Some(shift);

        match open {
            Ok(Some(session)) => {
                let tracked = counting
                    && matches!(&self.session, SessionLink::Stored(s) if s.id == session.id);
                if tracked {
                    // Keep the in-memory countdown, including pause credit
                    self.session = SessionLink::Stored(session);
                    self.advance_countdown(now);
                } else {
                    let elapsed = countdown::elapsed_seconds(session.clock_in_at, now);
                    let remaining = self.total_shift_seconds.saturating_sub(elapsed);
                    info!("Found open session {} with {}s remaining", session.id, remaining);
                    self.session = SessionLink::Stored(session);
                    self.begin_countdown(remaining, now);
                }
            }
            Ok(None) => {
                if counting && matches!(self.session, SessionLink::Unsaved { .. }) {
                    debug!("No stored session; keeping unsaved in-memory countdown");
                    self.advance_countdown(now);
                } else {
                    self.await_start(now);
                }
            }
            Err(e) => {
                error!("Failed to read open session, treating as none: {}", e);
                if counting && self.session != SessionLink::None {
                    self.advance_countdown(now);
                } else {
                    self.await_start(now);
                }
            }
        }
    }

    /// Pick the shift to load. A shift with an open session wins over the
    /// resolver's current-or-next pick, so a later shift or a day rollover
    /// never strands a running session.
    fn select_shift(&self, today: NaiveDate, now: DateTime<Utc>) -> Option<Shift> {
        if let Some(shift) = self.tracked_shift() {
            return Some(shift);
        }

        let candidates = self.shifts.today_work_shifts(today);
        // Overnight shifts from yesterday still running today
        let overnight: Vec<Shift> = today
            .pred_opt()
            .map(|yesterday| self.shifts.today_work_shifts(yesterday))
            .unwrap_or_default()
            .into_iter()
            .filter(|s| s.end_at.with_timezone(&Local).date_naive() >= today)
            .collect();

        for shift in overnight.iter().chain(candidates.iter()) {
            match self.store.find_open_session(&shift.id) {
                Ok(Some(session)) => {
                    debug!("Shift {} has open session {}", shift.id, session.id);
                    return Some(shift.clone());
                }
                Ok(None) => {}
                Err(e) => debug!("Open session lookup for shift {} failed: {}", shift.id, e),
            }
        }

        resolver::resolve(&candidates, now)
    }

    /// The shift the in-memory session belongs to, while it is still in the
    /// calendar and its session has not been closed elsewhere
    fn tracked_shift(&self) -> Option<Shift> {
        let current = self.shift.as_ref()?;
        if self.session == SessionLink::None {
            return None;
        }
        let shift = self.shifts.work_shift(&current.id)?;

        if let SessionLink::Stored(session) = &self.session {
            match self.store.find_open_session(&shift.id) {
                Ok(Some(open)) if open.id == session.id => {}
                Ok(_) => return None,
                // Reads are retried by the load itself
                Err(_) => {}
            }
        }
        Some(shift)
    }

    /// No open session: waiting for start time, or sounding the start alarm
    fn await_start(&mut self, now: DateTime<Utc>) {
        self.session = SessionLink::None;
        self.anchor = None;
        self.seconds_remaining = self.total_shift_seconds;
        let started = self.shift.as_ref().map(|s| now >= s.start_at).unwrap_or(false);
        let next = if started {
            TimerStatus::StartAlarm
        } else {
            TimerStatus::Waiting
        };
        self.set_status(next, now);
    }

    fn begin_countdown(&mut self, remaining: u64, now: DateTime<Utc>) {
        self.anchor = Some(countdown::anchor(remaining, now));
        self.seconds_remaining = remaining;
        let next = if remaining == 0 {
            TimerStatus::EndAlarm
        } else {
            TimerStatus::Active
        };
        self.set_status(next, now);
    }

    /// Sample the countdown while active; the displayed value never increases
    fn advance_countdown(&mut self, now: DateTime<Utc>) {
        if self.status != TimerStatus::Active {
            return;
        }
        let Some(anchor) = self.anchor else {
            return;
        };

        self.seconds_remaining = self.seconds_remaining.min(countdown::sample(&anchor, now));
        if self.seconds_remaining == 0 {
            info!("Shift countdown expired");
            self.set_status(TimerStatus::EndAlarm, now);
        }
    }

    fn close_open_session(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        match &self.session {
            SessionLink::Stored(session) => match self.store.close_session(&session.id, now) {
                Ok(()) => {
                    info!("Clocked out of session {}", session.id);
                    Ok(())
                }
                Err(StoreError::SessionNotFound(id)) => {
                    warn!("Session {} was removed externally, nothing to clock out", id);
                    Ok(())
                }
                Err(e) => {
                    error!("Failed to save clock-out for session {}: {}", session.id, e);
                    Err(TimerError::store("close", e))
                }
            },
            SessionLink::Unsaved { clock_in_at } => {
                warn!("Closing unsaved session clocked in at {}; no record kept", clock_in_at);
                Ok(())
            }
            SessionLink::None => Ok(()),
        }
    }

    /// Apply a status change and its alarm edge
    fn set_status(&mut self, next: TimerStatus, now: DateTime<Utc>) {
        let prev = self.status;
        if prev == next {
            return;
        }
        self.status = next;
        info!("Timer status: {} -> {}", prev, next);

        if next.alarm_active() {
            self.alarm
                .start(self.alarm_settings.sound, self.alarm_settings.gain());
            self.pulse_haptic(now);
        } else if prev.alarm_active() {
            self.alarm.stop();
            self.last_haptic_at = None;
        }
    }

    fn pulse_haptic(&mut self, now: DateTime<Utc>) {
        if let Some(haptic) = &self.haptic {
            haptic.pulse(&ALARM_HAPTIC_PATTERN);
        }
        self.last_haptic_at = Some(now);
    }

    fn repeat_haptic(&mut self, now: DateTime<Utc>) {
        let due = match self.last_haptic_at {
            Some(last) => now - last >= Duration::seconds(HAPTIC_REPEAT_SECS) || now < last,
            None => true,
        };
        if due {
            self.pulse_haptic(now);
        }
    }
}
