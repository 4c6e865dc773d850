//! Runtime settings that can be modified during application execution
//!
//! These are not persisted. The controller keeps the most recent
//! [`PlaybackSettings`] so the play hotkey replays with whatever the UI
//! last selected.

use crate::session::player::{PlaybackOptions, MAX_SPEED, MIN_SPEED};

/// Playback parameters chosen in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Speed multiplier, always within `MIN_SPEED..=MAX_SPEED`
    speed: u32,

    /// Whether playback repeats until stopped
    pub loop_playback: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            speed: MIN_SPEED,
            loop_playback: false,
        }
    }
}

impl PlaybackSettings {
    /// Out-of-range speeds are clamped
    pub fn new(speed: i64, loop_playback: bool) -> Self {
        Self {
            speed: speed.clamp(MIN_SPEED as i64, MAX_SPEED as i64) as u32,
            loop_playback,
        }
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: i64) {
        self.speed = speed.clamp(MIN_SPEED as i64, MAX_SPEED as i64) as u32;
    }

    /// Options for a single playback run
    pub fn options(&self) -> PlaybackOptions {
        PlaybackOptions::new(self.speed as i64, self.loop_playback)
    }
}
