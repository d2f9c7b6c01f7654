//! Wall-clock countdown
//!
//! Remaining time is always recomputed from the elapsed wall-clock time since
//! the anchor, never by decrementing a counter per tick. A sample taken after
//! the process was suspended for any length of time is therefore exact.

use chrono::{DateTime, Utc};

/// Wall-clock timestamp paired with the remaining seconds at that moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownAnchor {
    pub wall_clock_start_ms: i64,
    pub remaining_seconds_at_anchor: u64,
}

/// Anchor a countdown of `remaining_seconds` at `now`
pub fn anchor(remaining_seconds: u64, now: DateTime<Utc>) -> CountdownAnchor {
    CountdownAnchor {
        wall_clock_start_ms: now.timestamp_millis(),
        remaining_seconds_at_anchor: remaining_seconds,
    }
}

/// Remaining seconds at `now`, clamped to zero.
///
/// A clock that moved behind the anchor counts as zero elapsed time.
pub fn sample(anchor: &CountdownAnchor, now: DateTime<Utc>) -> u64 {
    let elapsed_ms = now.timestamp_millis().saturating_sub(anchor.wall_clock_start_ms);
    let elapsed_secs = u64::try_from(elapsed_ms.max(0) / 1000).unwrap_or(u64::MAX);
    anchor.remaining_seconds_at_anchor.saturating_sub(elapsed_secs)
}

/// Whole seconds from `since` to `now`, zero if `now` is earlier
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let elapsed_ms = (now - since).num_milliseconds().max(0);
    u64::try_from(elapsed_ms / 1000).unwrap_or(u64::MAX)
}
