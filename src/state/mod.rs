//! State management module
//! 
//! This module contains the timer status, the observable snapshot and the
//! application state that owns the timer.

pub mod app_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use timer_state::{TimerSnapshot, TimerStatus};
