//! External collaborator module
//!
//! This module contains the adapters the timer talks to: the shift calendar,
//! the alarm and haptic triggers, and the wall clock.

pub mod alarm;
pub mod clock;
pub mod shifts;

// Re-export main types
pub use alarm::{AlarmSettings, AlarmTrigger, CommandAlarm, HapticTrigger, LoggedHaptic, SilentAlarm, SoundProfile};
pub use clock::{Clock, ManualClock, SystemClock};
pub use shifts::{JsonShiftFile, ShiftProvider, StaticShifts};
