//! Shift timer module
//!
//! Countdown engine, shift resolver and the timer state machine.

pub mod countdown;
pub mod machine;
pub mod resolver;

pub use countdown::CountdownAnchor;
pub use machine::ShiftTimer;
