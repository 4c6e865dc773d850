//! # inputrec-rs: Mouse and Keyboard Macro Recorder
//!
//! Captures timestamped pointer and keyboard events system-wide and replays
//! them later with the original timing, optionally faster and looped.
//!
//! ## Architecture
//!
//! - **Backend**: A global `rdev` hook thread feeds an [`backend::InputHub`];
//!   playback emits synthetic input through an [`backend::InputSink`]
//! - **Session**: Capture and playback sessions behind a single
//!   [`session::SessionController`] state machine (Idle / Recording / Playing)
//! - **Hotkeys**: A listener on the hub's key stream, with a dispatcher
//!   thread that calls the controller
//! - **Frontend**: An eframe/egui window that only calls the controller's
//!   control surface
//! - **Communication**: Crossbeam channels for the capture queue, hotkey
//!   events, cancellation wakeups, and engine → UI status
//!
//! ## Configuration
//!
//! Hotkey bindings are stored in `recorder_settings.toml` in the
//! platform-appropriate data directory under `dev.inputrec.inputrec-rs`:
//!
//! - **Linux**: `~/.local/share/dev.inputrec.inputrec-rs/`
//! - **macOS**: `~/Library/Application Support/dev.inputrec.inputrec-rs/`
//! - **Windows**: `%APPDATA%\dev.inputrec.inputrec-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use inputrec_rs::{
//!     backend::{InputHub, RdevSink},
//!     config::HotkeySettings,
//!     session::{ControllerConfig, SessionController},
//! };
//! use std::sync::Arc;
//!
//! let hub = InputHub::new();
//! let (controller, status) = SessionController::new(ControllerConfig {
//!     hub: hub.clone(),
//!     sink: Arc::new(RdevSink::new()),
//!     hotkeys: HotkeySettings::load_or_default(),
//!     settings_path: None,
//!     listener: None,
//! });
//!
//! controller.start_recording();
//! // ... user input arrives through the hub ...
//! controller.stop_active();
//! controller.start_playback(2, false);
//! ```

pub mod app;
pub mod backend;
pub mod bridge;
pub mod config;
pub mod error;
pub mod frontend;
pub mod hotkey;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use app::RecorderApp;
pub use bridge::{StatusBridge, StatusEvent};
pub use config::HotkeySettings;
pub use error::{ErrorKind, InputRecError, Result};
pub use hotkey::{Hotkey, HotkeyAction};
pub use session::{EventLog, Outcome, SessionController, SessionState};
pub use types::{Event, KeySymbol, TimedEvent};
