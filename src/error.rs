//! Error handling for inputrec-rs
//!
//! This module defines the crate error type, a lightweight [`ErrorKind`]
//! discriminant reported across the control surface, and a Result alias.

use thiserror::Error;

use crate::session::SessionState;

/// Main error type for inputrec-rs operations
#[derive(Error, Debug)]
pub enum InputRecError {
    /// A start was requested while another session is running
    #[error("Cannot start: a session is already active ({0})")]
    AlreadyActive(SessionState),

    /// Playback or save was requested on an empty event log
    #[error("There are no recorded events. Record or load first.")]
    EmptyLog,

    /// Reading or writing a recording failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The settings file exists but could not be understood
    #[error("Settings file is corrupt: {0}")]
    SettingsCorrupt(String),

    /// Optional icon asset could not be loaded
    #[error("Icon resource missing: {0}")]
    IconResourceMissing(String),

    /// A hotkey descriptor could not be parsed
    #[error("Invalid hotkey: {0}")]
    InvalidHotkey(String),

    /// The OS input backend failed
    #[error("Input backend error: {0}")]
    Backend(String),

    /// Errors related to configuration paths
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InputRecError>,
    },
}

/// Coarse classification of an [`InputRecError`], cheap to copy into status reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyActive,
    EmptyLog,
    PersistenceFailure,
    SettingsCorrupt,
    IconResourceMissing,
    InvalidHotkey,
    Backend,
    Config,
}

impl InputRecError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InputRecError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify the error, looking through any added context
    pub fn kind(&self) -> ErrorKind {
        match self {
            InputRecError::AlreadyActive(_) => ErrorKind::AlreadyActive,
            InputRecError::EmptyLog => ErrorKind::EmptyLog,
            InputRecError::Persistence(_) => ErrorKind::PersistenceFailure,
            InputRecError::SettingsCorrupt(_) => ErrorKind::SettingsCorrupt,
            InputRecError::IconResourceMissing(_) => ErrorKind::IconResourceMissing,
            InputRecError::InvalidHotkey(_) => ErrorKind::InvalidHotkey,
            InputRecError::Backend(_) | InputRecError::Io(_) => ErrorKind::Backend,
            InputRecError::Config(_) => ErrorKind::Config,
            InputRecError::WithContext { source, .. } => source.kind(),
        }
    }
}

/// Result type alias for inputrec-rs operations
pub type Result<T> = std::result::Result<T, InputRecError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
