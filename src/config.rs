//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::services::{AlarmSettings, SoundProfile};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "shift-clock")]
#[command(about = "A state-managed HTTP server that tracks a caregiver's work shift")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// SQLite database holding clock-in/clock-out sessions
    #[arg(long, default_value = "sessions.db")]
    pub db: PathBuf,

    /// JSON file with the exported shift calendar
    #[arg(long, default_value = "shifts.json")]
    pub shifts: PathBuf,

    /// Alarm sound profile
    #[arg(long, value_enum, default_value = "chime")]
    pub alarm_sound: SoundProfile,

    /// Alarm volume in percent
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: u8,

    /// Command used to play alarm sound files
    #[arg(long, default_value = "paplay")]
    pub alarm_player: String,

    /// Directory containing <profile>.wav alarm sounds
    #[arg(long, default_value = "sounds")]
    pub sounds_dir: PathBuf,

    /// Log alarms instead of playing them
    #[arg(long)]
    pub mute: bool,

    /// Log haptic pulses (for hosts without a vibration motor)
    #[arg(long)]
    pub haptics: bool,

    /// Seconds between wake-up checks
    #[arg(long, default_value = "15")]
    pub wake_check: u64,

    /// Seconds of unexplained wall-clock gap treated as a system sleep
    #[arg(long, default_value = "5")]
    pub wake_threshold: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn alarm_settings(&self) -> AlarmSettings {
        AlarmSettings {
            sound: self.alarm_sound,
            volume: self.volume,
        }
    }

    pub fn wake_check_interval(&self) -> Duration {
        Duration::from_secs(self.wake_check.max(1))
    }

    pub fn wake_threshold(&self) -> Duration {
        Duration::from_secs(self.wake_threshold)
    }
}
