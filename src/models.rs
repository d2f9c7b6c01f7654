//! Shift and session records shared by the timer and its collaborators

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of calendar entry; only `Work` entries drive the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShiftKind {
    Work,
    Meds,
    Other,
}

/// A scheduled work interval for a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    #[serde(rename = "clientName")]
    pub client_label: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ShiftKind,
}

impl Shift {
    /// Whole seconds between start and end, zero when the range is inverted
    pub fn duration_seconds(&self) -> u64 {
        let millis = (self.end_at - self.start_at).num_milliseconds();
        u64::try_from(millis / 1000).unwrap_or(0)
    }

    /// Check if this is a work shift starting on the given local calendar day
    pub fn is_work_on(&self, day: NaiveDate) -> bool {
        self.kind == ShiftKind::Work && self.start_at.with_timezone(&Local).date_naive() == day
    }
}

/// A persisted clock-in/clock-out record tied to a shift
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub shift_id: String,
    pub clock_in_at: DateTime<Utc>,
    pub clock_out_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new open session
    pub fn open(shift_id: &str, clock_in_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            shift_id: shift_id.to_string(),
            clock_in_at,
            clock_out_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.clock_out_at.is_none()
    }
}
