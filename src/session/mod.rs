//! Session recording and playback module
//!
//! This module holds the capture/playback engine and the controller that
//! arbitrates between them.
//!
//! # Features
//!
//! - Record pointer and keyboard input with per-event timestamps
//! - Save recordings to disk and load them back
//! - Play back at an integer speed multiplier, optionally looping
//! - Cancel playback promptly from any thread (emergency stop)

pub mod controller;
pub mod player;
pub mod recorder;
pub mod types;

pub use controller::{ControllerConfig, SessionController};
pub use player::{CancelToken, PlaybackOptions, PlaybackSession};
pub use recorder::CaptureSession;
pub use types::{EventLog, Outcome, PlaybackReport, SessionState};
