//! SQLite-backed session store

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, error, info, warn};

use super::SessionStore;
use crate::{error::StoreError, models::Session};

/// Log storage-level failures that need operator attention.
fn log_io_error_if_any(context: &str, e: &rusqlite::Error) {
    use rusqlite::ffi::ErrorCode;
    if let rusqlite::Error::SqliteFailure(ffi_err, _) = e {
        match ffi_err.code {
            ErrorCode::DiskFull => {
                error!("[DB] {}: disk full, clock records cannot be saved", context);
            }
            ErrorCode::ReadOnly | ErrorCode::CannotOpen => {
                error!("[DB] {}: database is read-only or cannot be opened", context);
            }
            ErrorCode::SystemIoFailure => {
                error!("[DB] {}: I/O error", context);
            }
            _ => {}
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
}

/// Raw row before timestamp decoding
struct SessionRow {
    id: String,
    shift_id: String,
    clock_in_at: String,
    clock_out_at: Option<String>,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            shift_id: row.get(1)?,
            clock_in_at: row.get(2)?,
            clock_out_at: row.get(3)?,
        })
    }

    fn into_session(self) -> Result<Session, StoreError> {
        Ok(Session {
            clock_in_at: parse_timestamp(&self.clock_in_at)?,
            clock_out_at: self.clock_out_at.as_deref().map(parse_timestamp).transpose()?,
            id: self.id,
            shift_id: self.shift_id,
        })
    }
}

/// Session store backed by a single SQLite connection
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Current schema version (PRAGMA user_version)
    const SCHEMA_VERSION: i32 = 1;

    /// Open (or create) the database at `db_path` and run migrations
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path).map_err(|e| {
            log_io_error_if_any("open", &e);
            StoreError::Unavailable(format!("{}: {}", db_path, e))
        })?;
        Self::with_connection(conn)
    }

    /// In-memory database, for tests and throwaway runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        if let Err(e) = conn.pragma_update(None, "journal_mode", "WAL") {
            warn!("[DB] Failed to enable WAL mode: {}. Continuing.", e);
        }

        let store = Self { conn: Mutex::new(conn) };
        store.run_migrations()?;
        Ok(store)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("database mutex poisoned: {}", e)))
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        let current: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

        if current < 1 {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    shift_id TEXT NOT NULL,
                    clock_in_at TEXT NOT NULL,
                    clock_out_at TEXT,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_sessions_shift_open
                    ON sessions(shift_id, clock_out_at);",
            )?;
        }

        if current < Self::SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", Self::SCHEMA_VERSION)?;
            info!("[DB] Migrated session schema {} -> {}", current, Self::SCHEMA_VERSION);
        }
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn find_open_session(&self, shift_id: &str) -> Result<Option<Session>, StoreError> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT id, shift_id, clock_in_at, clock_out_at FROM sessions
                 WHERE shift_id = ?1 AND clock_out_at IS NULL
                 ORDER BY clock_in_at DESC LIMIT 1",
                params![shift_id],
                SessionRow::from_row,
            )
            .optional()
            .map_err(|e| {
                log_io_error_if_any("find_open_session", &e);
                e
            })?;
        row.map(SessionRow::into_session).transpose()
    }

    fn open_session(&self, shift_id: &str, clock_in_at: DateTime<Utc>) -> Result<Session, StoreError> {
        let session = Session::open(shift_id, clock_in_at);
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO sessions (id, shift_id, clock_in_at, clock_out_at, created_at)
             VALUES (?1, ?2, ?3, NULL, ?4)",
            params![
                session.id,
                session.shift_id,
                clock_in_at.to_rfc3339(),
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| {
            log_io_error_if_any("open_session", &e);
            e
        })?;
        debug!("[DB] Opened session {} for shift {}", session.id, shift_id);
        Ok(session)
    }

    fn close_session(&self, session_id: &str, clock_out_at: DateTime<Utc>) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        let updated = conn
            .execute(
                "UPDATE sessions SET clock_out_at = ?1
                 WHERE id = ?2 AND clock_out_at IS NULL",
                params![clock_out_at.to_rfc3339(), session_id],
            )
            .map_err(|e| {
                log_io_error_if_any("close_session", &e);
                e
            })?;

        if updated == 0 {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }
        debug!("[DB] Closed session {}", session_id);
        Ok(())
    }

    fn sessions_for_shift(&self, shift_id: &str) -> Result<Vec<Session>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, shift_id, clock_in_at, clock_out_at FROM sessions
             WHERE shift_id = ?1 ORDER BY clock_in_at ASC",
        )?;
        let rows = stmt
            .query_map(params![shift_id], SessionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }
}
