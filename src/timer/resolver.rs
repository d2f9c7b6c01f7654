//! Picks the one shift the timer tracks

use chrono::{DateTime, Utc};

use crate::models::Shift;

/// Select the current-or-next shift from today's work shifts.
///
/// Candidates are expected in start order. The first shift that has not yet
/// ended wins; if all have ended, the last one is returned so a just-finished
/// shift stays visible.
pub fn resolve(candidates: &[Shift], now: DateTime<Utc>) -> Option<Shift> {
    candidates
        .iter()
        .find(|shift| shift.end_at > now)
        .or_else(|| candidates.last())
        .cloned()
}
