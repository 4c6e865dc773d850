//! Session data types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{ErrorKind, InputRecError, Result};
use crate::types::{Event, TimedEvent};

/// State of the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No active session
    #[default]
    Idle,
    /// Capturing input into a fresh event log
    Recording,
    /// Replaying the event log
    Playing,
}

impl SessionState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording)
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self, SessionState::Playing)
    }

    /// Check if no session is running
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Playing => "Playing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ordered sequence of captured events
///
/// `elapsed` is non-decreasing across the sequence. Logs built by a capture
/// session satisfy this by construction; logs from elsewhere go through
/// [`EventLog::from_events`], which validates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<TimedEvent>,
}

impl EventLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from an existing sequence, rejecting bad timestamps
    pub fn from_events(events: Vec<TimedEvent>) -> Result<Self> {
        let mut previous = 0.0_f64;
        for (index, timed) in events.iter().enumerate() {
            if !timed.elapsed.is_finite() || timed.elapsed < 0.0 {
                return Err(InputRecError::Persistence(format!(
                    "event {} has an invalid timestamp ({})",
                    index, timed.elapsed
                )));
            }
            if timed.elapsed < previous {
                return Err(InputRecError::Persistence(format!(
                    "event {} goes back in time ({} < {})",
                    index, timed.elapsed, previous
                )));
            }
            previous = timed.elapsed;
        }
        Ok(Self { events })
    }

    /// Append a freshly captured event
    ///
    /// A timestamp older than the last one is raised to match it, so the
    /// log stays ordered when concurrent producers race between taking the
    /// timestamp and enqueuing.
    pub(crate) fn push_captured(&mut self, mut timed: TimedEvent) {
        if let Some(last) = self.events.last() {
            if timed.elapsed < last.elapsed {
                timed.elapsed = last.elapsed;
            }
        }
        self.events.push(timed);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter()
    }

    /// Offset of the last event
    pub fn duration(&self) -> Duration {
        self.events
            .last()
            .and_then(|e| Duration::try_from_secs_f64(e.elapsed).ok())
            .unwrap_or(Duration::ZERO)
    }

    /// Count events matching a predicate
    pub fn count_where(&self, mut predicate: impl FnMut(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(&e.event)).count()
    }

    /// Serialize to the recording file format
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| InputRecError::Persistence(format!("Failed to serialize recording: {}", e)))
    }

    /// Parse the recording file format
    pub fn from_json(json: &str) -> Result<Self> {
        let events: Vec<TimedEvent> = serde_json::from_str(json)
            .map_err(|e| InputRecError::Persistence(format!("Failed to parse recording: {}", e)))?;
        Self::from_events(events)
    }

    /// Save the log to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| {
            InputRecError::Persistence(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// Load a log from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            InputRecError::Persistence(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a TimedEvent;
    type IntoIter = std::slice::Iter<'a, TimedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Summary of a finished or cancelled playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Passes started, including the one in progress when cancelled
    pub passes: u32,
    /// Events fired during the last pass
    pub events_completed: usize,
    /// Number of events in the log
    pub total_events: usize,
    /// Whether the run ended through cancellation
    pub cancelled: bool,
    /// Wall time spent in the run
    pub elapsed: Duration,
}

impl PlaybackReport {
    /// Human readable status line
    pub fn summary(&self) -> String {
        if self.cancelled {
            format!(
                "Playback stopped at event {}/{} (loop {}).",
                self.events_completed, self.total_events, self.passes
            )
        } else {
            format!(
                "Playback finished. {} events executed over {} loop(s).",
                self.total_events, self.passes
            )
        }
    }
}

/// Result of a control-surface call: a status line plus an optional error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub message: String,
    pub error: Option<ErrorKind>,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    pub fn from_error(err: &InputRecError) -> Self {
        Self {
            message: err.to_string(),
            error: Some(err.kind()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl From<Result<String>> for Outcome {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(message) => Outcome::ok(message),
            Err(e) => Outcome::from_error(&e),
        }
    }
}
