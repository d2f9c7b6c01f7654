//! In-memory session store

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::SessionStore;
use crate::{error::StoreError, models::Session};

/// Session store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Session>>, StoreError> {
        self.sessions
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("session list poisoned: {}", e)))
    }

    /// Remove a session, as an external calendar edit would
    pub fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.lock()?.retain(|s| s.id != session_id);
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn find_open_session(&self, shift_id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|s| s.shift_id == shift_id && s.is_open())
            .max_by_key(|s| s.clock_in_at)
            .cloned())
    }

    fn open_session(&self, shift_id: &str, clock_in_at: DateTime<Utc>) -> Result<Session, StoreError> {
        let session = Session::open(shift_id, clock_in_at);
        self.lock()?.push(session.clone());
        Ok(session)
    }

    fn close_session(&self, session_id: &str, clock_out_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut sessions = self.lock()?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.is_open())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        session.clock_out_at = Some(clock_out_at);
        Ok(())
    }

    fn sessions_for_shift(&self, shift_id: &str) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> = self
            .lock()?
            .iter()
            .filter(|s| s.shift_id == shift_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.clock_in_at);
        Ok(sessions)
    }
}
