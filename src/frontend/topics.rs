//! Engine status as last seen by the UI.
//!
//! The app folds every drained [`StatusEvent`] into `Topics` once per frame
//! and renders from it. Nothing here talks back to the engine.

use crate::bridge::StatusEvent;
use crate::config::HotkeySettings;
use crate::error::ErrorKind;
use crate::session::{PlaybackReport, SessionState};

/// Status line shown before anything has happened
pub const READY_MESSAGE: &str = "Ready";

/// Everything the UI displays about the engine
#[derive(Debug, Clone)]
pub struct Topics {
    /// Controller state
    pub state: SessionState,
    /// Number of events in the current log
    pub event_count: usize,
    /// Pass number of the running playback
    pub loop_pass: Option<u32>,
    /// Report of the most recent playback run
    pub last_report: Option<PlaybackReport>,

    /// Latest status line
    pub status_line: String,
    /// Whether the latest status line reports a failure
    pub status_is_error: bool,

    /// Current bindings, for labels and the hotkey dialog
    pub hotkeys: HotkeySettings,
    /// Set when a hotkey capture ends, successfully or not
    pub capture_ended: bool,
}

impl Topics {
    pub fn new(hotkeys: HotkeySettings) -> Self {
        Self {
            state: SessionState::Idle,
            event_count: 0,
            loop_pass: None,
            last_report: None,
            status_line: READY_MESSAGE.to_string(),
            status_is_error: false,
            hotkeys,
            capture_ended: false,
        }
    }

    /// Fold one engine event into the published state
    pub fn apply(&mut self, event: StatusEvent) {
        match event {
            StatusEvent::StateChanged(state) => {
                self.state = state;
                if !state.is_playing() {
                    self.loop_pass = None;
                }
            }
            StatusEvent::Outcome(outcome) => {
                if outcome.error == Some(ErrorKind::InvalidHotkey) {
                    self.capture_ended = true;
                }
                self.status_is_error = outcome.is_error();
                self.status_line = outcome.message;
            }
            StatusEvent::LogReplaced { event_count } => {
                self.event_count = event_count;
            }
            StatusEvent::PlaybackPass(pass) => {
                self.loop_pass = Some(pass);
            }
            StatusEvent::PlaybackFinished(report) => {
                self.last_report = Some(report);
            }
            StatusEvent::HotkeyChanged { action, hotkey } => {
                self.hotkeys.set(action, hotkey);
            }
            StatusEvent::HotkeyCaptured { .. } => {
                self.capture_ended = true;
            }
        }
    }

    /// Info line listing the main bindings
    pub fn hotkey_summary(&self) -> String {
        format!(
            "Record Hotkey: {} | Play Hotkey: {} | Emergency Stop: {}",
            self.hotkeys.record.label(),
            self.hotkeys.play.label(),
            self.hotkeys.emergency_stop.label()
        )
    }

    pub fn can_record(&self) -> bool {
        self.state.is_idle()
    }

    pub fn can_play(&self) -> bool {
        self.state.is_idle() && self.event_count > 0
    }

    pub fn can_stop(&self) -> bool {
        !self.state.is_idle()
    }

    pub fn can_save(&self) -> bool {
        self.state.is_idle() && self.event_count > 0
    }

    pub fn can_load(&self) -> bool {
        self.state.is_idle()
    }
}
