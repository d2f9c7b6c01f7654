//! Timer status and the observable timer snapshot

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Session, Shift};

/// Shift timer status. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// No shift found for today
    Idle,
    /// Shift exists, start time not reached
    Waiting,
    /// Start time reached, no open session, alarm sounding
    StartAlarm,
    /// Open session, counting down
    Active,
    /// Open session, countdown frozen
    Paused,
    /// Remaining time reached zero, alarm sounding
    EndAlarm,
    /// Session closed
    Completed,
}

impl TimerStatus {
    /// Check if the alarm should be sounding in this status
    pub fn alarm_active(&self) -> bool {
        matches!(self, TimerStatus::StartAlarm | TimerStatus::EndAlarm)
    }

    /// Check if the periodic tick has work to do in this status
    pub fn needs_tick(&self) -> bool {
        matches!(
            self,
            TimerStatus::Waiting | TimerStatus::StartAlarm | TimerStatus::Active | TimerStatus::EndAlarm
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Waiting => "waiting",
            TimerStatus::StartAlarm => "start_alarm",
            TimerStatus::Active => "active",
            TimerStatus::Paused => "paused",
            TimerStatus::EndAlarm => "end_alarm",
            TimerStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable timer state handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub shift: Option<Shift>,
    pub session: Option<Session>,
    pub seconds_remaining: u64,
    pub total_shift_seconds: u64,
    pub alarm_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_derived_from_status() {
        let all = [
            TimerStatus::Idle,
            TimerStatus::Waiting,
            TimerStatus::StartAlarm,
            TimerStatus::Active,
            TimerStatus::Paused,
            TimerStatus::EndAlarm,
            TimerStatus::Completed,
        ];
        let sounding: Vec<_> = all.iter().filter(|s| s.alarm_active()).collect();
        assert_eq!(sounding, vec![&TimerStatus::StartAlarm, &TimerStatus::EndAlarm]);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TimerStatus::StartAlarm).unwrap();
        assert_eq!(json, "\"start_alarm\"");
        assert_eq!(TimerStatus::EndAlarm.to_string(), "end_alarm");
    }

    #[test]
    fn test_idle_and_completed_need_no_tick() {
        assert!(!TimerStatus::Idle.needs_tick());
        assert!(!TimerStatus::Completed.needs_tick());
        assert!(!TimerStatus::Paused.needs_tick());
        assert!(TimerStatus::Waiting.needs_tick());
    }
}
