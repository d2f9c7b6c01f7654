//! Shift Clock - A state-managed HTTP server that tracks a caregiver's work shift
//! 
//! This library decides when a shift should prompt the user to start, counts
//! down the remaining shift time from the wall clock, detects shift-end
//! overrun and records clock-in/clock-out sessions durably.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{StoreError, TimerError};
pub use state::{AppState, TimerSnapshot, TimerStatus};
pub use timer::ShiftTimer;
pub use utils::signals::shutdown_signal;
