//! Alarm and haptic side effects
//!
//! The timer only ever calls these through the [`AlarmTrigger`] and
//! [`HapticTrigger`] traits. Both must tolerate redundant calls: stopping a
//! silent alarm is a no-op and starting a sounding alarm restarts it.

use std::{
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::{process::Command, runtime::Handle, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

/// Vibration pattern in milliseconds: wait, buzz, wait, buzz
pub const ALARM_HAPTIC_PATTERN: [u64; 4] = [0, 1000, 500, 1000];

/// Seconds between haptic pulses while an alarm is sounding
pub const HAPTIC_REPEAT_SECS: i64 = 4;

/// Pause between two plays of the alarm sound
const ALARM_REPEAT_GAP: Duration = Duration::from_millis(500);

/// Alarm sound profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SoundProfile {
    Chime,
    Beep,
    Buzz,
    Gentle,
    Bells,
    Fanfare,
    Xylophone,
    Upbeat,
}

impl SoundProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundProfile::Chime => "chime",
            SoundProfile::Beep => "beep",
            SoundProfile::Buzz => "buzz",
            SoundProfile::Gentle => "gentle",
            SoundProfile::Bells => "bells",
            SoundProfile::Fanfare => "fanfare",
            SoundProfile::Xylophone => "xylophone",
            SoundProfile::Upbeat => "upbeat",
        }
    }
}

/// User-selected alarm sound and volume percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSettings {
    pub sound: SoundProfile,
    pub volume: u8,
}

impl AlarmSettings {
    /// Volume as a 0.0..=1.0 gain
    pub fn gain(&self) -> f32 {
        f32::from(self.volume.min(100)) / 100.0
    }
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            sound: SoundProfile::Chime,
            volume: 100,
        }
    }
}

/// Audible alert
pub trait AlarmTrigger: Send + Sync {
    fn start(&self, sound: SoundProfile, volume: f32);
    fn stop(&self);
}

/// Best-effort vibration
pub trait HapticTrigger: Send + Sync {
    fn pulse(&self, pattern: &[u64]);
}

/// Plays the alarm sound file in a loop through an external player command
pub struct CommandAlarm {
    player: String,
    sounds_dir: PathBuf,
    playing: Mutex<Option<JoinHandle<()>>>,
}

impl CommandAlarm {
    pub fn new(player: impl Into<String>, sounds_dir: impl Into<PathBuf>) -> Self {
        Self {
            player: player.into(),
            sounds_dir: sounds_dir.into(),
            playing: Mutex::new(None),
        }
    }

    /// Path of the sound file for a profile
    pub fn sound_path(&self, sound: SoundProfile) -> PathBuf {
        self.sounds_dir.join(format!("{}.wav", sound.as_str()))
    }

    /// Arguments passed to the player for one play of the sound
    pub fn player_args(&self, sound: SoundProfile, volume: f32) -> Vec<String> {
        let mut args = Vec::new();
        if self.player.ends_with("paplay") {
            // paplay volume range is 0..=65536
            let scaled = (volume.clamp(0.0, 1.0) * 65536.0).round() as u32;
            args.push(format!("--volume={}", scaled));
        }
        args.push(self.sound_path(sound).to_string_lossy().into_owned());
        args
    }

    fn take_playing(&self) -> Option<JoinHandle<()>> {
        self.playing.lock().ok().and_then(|mut playing| playing.take())
    }
}

impl AlarmTrigger for CommandAlarm {
    fn start(&self, sound: SoundProfile, volume: f32) {
        if let Some(previous) = self.take_playing() {
            previous.abort();
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Cannot start alarm outside the runtime: {}", e);
                return;
            }
        };

        let player = self.player.clone();
        let args = self.player_args(sound, volume);
        info!("Starting alarm: sound={}, volume={:.2}", sound.as_str(), volume);

        let task = handle.spawn(async move {
            loop {
                // kill_on_drop stops the player when the task is aborted
                match Command::new(&player).args(&args).kill_on_drop(true).status().await {
                    Ok(status) if !status.success() => {
                        warn!("Alarm player {} exited with {}", player, status);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Failed to run alarm player {}: {}", player, e);
                        break;
                    }
                }
                sleep(ALARM_REPEAT_GAP).await;
            }
        });

        match self.playing.lock() {
            Ok(mut playing) => *playing = Some(task),
            Err(e) => {
                warn!("Alarm handle lock poisoned, stopping new alarm: {}", e);
                task.abort();
            }
        }
    }

    fn stop(&self) {
        if let Some(task) = self.take_playing() {
            info!("Stopping alarm");
            task.abort();
        }
    }
}

impl Drop for CommandAlarm {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Alarm that only logs, for muted or headless operation
#[derive(Debug, Default)]
pub struct SilentAlarm;

impl AlarmTrigger for SilentAlarm {
    fn start(&self, sound: SoundProfile, volume: f32) {
        info!("Alarm (muted): sound={}, volume={:.2}", sound.as_str(), volume);
    }

    fn stop(&self) {
        debug!("Alarm (muted) stopped");
    }
}

/// Haptic trigger for hosts without a vibration motor; records pulses in the log
#[derive(Debug, Default)]
pub struct LoggedHaptic;

impl HapticTrigger for LoggedHaptic {
    fn pulse(&self, pattern: &[u64]) {
        debug!("Haptic pulse: {:?}", pattern);
    }
}
