//! Today's work shifts, as supplied by the shift calendar

use std::{
    fs,
    path::PathBuf,
    sync::Mutex,
};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    error::ShiftSourceError,
    models::{Shift, ShiftKind},
};

/// Read access to the shift calendar
pub trait ShiftProvider: Send + Sync {
    /// Work shifts starting on `today`, ordered by start time
    fn today_work_shifts(&self, today: NaiveDate) -> Vec<Shift>;

    /// A work shift by id, whatever day it starts on
    fn work_shift(&self, shift_id: &str) -> Option<Shift>;
}

fn work_shift_by_id(shifts: &[Shift], shift_id: &str) -> Option<Shift> {
    shifts
        .iter()
        .find(|shift| shift.id == shift_id && shift.kind == ShiftKind::Work)
        .cloned()
}

fn work_shifts_on(shifts: &[Shift], today: NaiveDate) -> Vec<Shift> {
    let mut today_shifts: Vec<Shift> = shifts
        .iter()
        .filter(|shift| shift.is_work_on(today))
        .cloned()
        .collect();
    today_shifts.sort_by_key(|shift| shift.start_at);
    today_shifts
}

/// Shift calendar exported as a JSON array, re-read on every call
#[derive(Debug)]
pub struct JsonShiftFile {
    path: PathBuf,
    last_good: Mutex<Vec<Shift>>,
}

impl JsonShiftFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_good: Mutex::new(Vec::new()),
        }
    }

    fn read_all(&self) -> Result<Vec<Shift>, ShiftSourceError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| ShiftSourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ShiftSourceError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Current file contents, or the last list that could be read
    fn current(&self) -> Vec<Shift> {
        match self.read_all() {
            Ok(all) => {
                if let Ok(mut last_good) = self.last_good.lock() {
                    *last_good = all.clone();
                }
                all
            }
            Err(e) => {
                warn!("{}, using last known shifts", e);
                self.last_good.lock().map(|s| s.clone()).unwrap_or_default()
            }
        }
    }
}

impl ShiftProvider for JsonShiftFile {
    fn today_work_shifts(&self, today: NaiveDate) -> Vec<Shift> {
        let all = self.current();
        let today_shifts = work_shifts_on(&all, today);
        debug!("{} work shift(s) on {}", today_shifts.len(), today);
        today_shifts
    }

    fn work_shift(&self, shift_id: &str) -> Option<Shift> {
        work_shift_by_id(&self.current(), shift_id)
    }
}

/// Fixed in-memory shift list
#[derive(Debug, Default)]
pub struct StaticShifts {
    shifts: Mutex<Vec<Shift>>,
}

impl StaticShifts {
    pub fn new(shifts: Vec<Shift>) -> Self {
        Self { shifts: Mutex::new(shifts) }
    }

    /// Replace the list, as the calendar would after an edit or deletion
    pub fn replace(&self, shifts: Vec<Shift>) {
        if let Ok(mut current) = self.shifts.lock() {
            *current = shifts;
        }
    }
}

impl ShiftProvider for StaticShifts {
    fn today_work_shifts(&self, today: NaiveDate) -> Vec<Shift> {
        self.shifts
            .lock()
            .map(|shifts| work_shifts_on(&shifts, today))
            .unwrap_or_default()
    }

    fn work_shift(&self, shift_id: &str) -> Option<Shift> {
        self.shifts
            .lock()
            .ok()
            .and_then(|shifts| work_shift_by_id(&shifts, shift_id))
    }
}
