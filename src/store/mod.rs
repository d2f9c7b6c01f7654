//! Session store module
//!
//! Durable clock-in/clock-out records keyed by shift id. Adapters hold no
//! timer policy; the state machine decides when to open and close sessions.

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::{error::StoreError, models::Session};

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

/// Persistence for shift sessions
pub trait SessionStore: Send + Sync {
    /// Most recent session for the shift that has no clock-out time
    fn find_open_session(&self, shift_id: &str) -> Result<Option<Session>, StoreError>;

    /// Record a clock-in and return the new open session
    fn open_session(&self, shift_id: &str, clock_in_at: DateTime<Utc>) -> Result<Session, StoreError>;

    /// Record a clock-out for an open session.
    ///
    /// A session that is missing or already closed is `SessionNotFound`.
    fn close_session(&self, session_id: &str, clock_out_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// All sessions recorded for a shift, oldest clock-in first
    fn sessions_for_shift(&self, shift_id: &str) -> Result<Vec<Session>, StoreError>;
}
