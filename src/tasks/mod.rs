//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod tick;
pub mod wake_up_recovery;

// Re-export main functions
pub use tick::tick_task;
pub use wake_up_recovery::{resume_signal_task, wake_up_recovery_task};
