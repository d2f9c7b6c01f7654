//! Error types for the session store and the timer state machine

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::state::TimerStatus;

/// Failures reported by a session store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    /// The backing storage cannot be reached at all.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded.
    #[error("Corrupt session row: {0}")]
    Corrupt(String),
}

/// Failures reading the exported shift calendar.
#[derive(Error, Debug)]
pub enum ShiftSourceError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures returned by timer commands.
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("No shift scheduled for today")]
    NoShift,

    #[error("Cannot {action} while timer is {status}")]
    InvalidTransition {
        action: &'static str,
        status: TimerStatus,
    },

    /// A clock-in/out write failed; the timer state was left unchanged.
    #[error("Failed to {action} session: {source}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    /// The countdown started in memory but the clock-in was not saved.
    #[error("Shift started but clock-in was not saved: {source}")]
    Unpersisted {
        #[source]
        source: StoreError,
    },

    #[error("Timer state lock poisoned: {0}")]
    StatePoisoned(String),
}

impl TimerError {
    pub fn invalid(action: &'static str, status: TimerStatus) -> Self {
        Self::InvalidTransition { action, status }
    }

    pub fn store(action: &'static str, source: StoreError) -> Self {
        Self::Store { action, source }
    }
}
