//! Configuration module for inputrec-rs
//!
//! This module handles the persisted hotkey settings and the runtime
//! playback settings.
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.inputrec.inputrec-rs/`
//! - **macOS**: `~/Library/Application Support/dev.inputrec.inputrec-rs/`
//! - **Windows**: `%APPDATA%\dev.inputrec.inputrec-rs\`
//!
//! # Files
//!
//! - `recorder_settings.toml` - Hotkey bindings
//! - `logs/` - Daily rolling log files
//! - Recordings (`.rec`) - Saved wherever the user chooses
//!
//! # Example
//!
//! ```ignore
//! use inputrec_rs::config::{settings_path, HotkeySettings};
//!
//! let path = settings_path().unwrap();
//! let mut hotkeys = HotkeySettings::load_or_default_from(&path);
//! hotkeys.set(HotkeyAction::Record, "ctrl+r".parse()?);
//! hotkeys.save_to(&path)?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{InputRecError, Result};
use crate::hotkey::{Hotkey, HotkeyAction, Modifier};
use crate::types::{KeySymbol, NamedKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.inputrec.inputrec-rs";

/// Hotkey settings filename
pub const SETTINGS_FILE: &str = "recorder_settings.toml";

/// Log directory name inside the app data directory
pub const LOG_DIR: &str = "logs";

/// Recording file extension
pub const RECORDING_FILE_EXTENSION: &str = "rec";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        InputRecError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            InputRecError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the hotkey settings file
pub fn settings_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(SETTINGS_FILE))
}

/// Get the directory for log files
pub fn log_dir() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(LOG_DIR))
}

// ==================== Hotkey Settings ====================

/// Hotkey bindings, persisted as `recorder_settings.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotkeySettings {
    pub record: Hotkey,
    pub play: Hotkey,
    pub emergency_stop: Hotkey,
}

/// On-disk form; every key is optional so partial files can be repaired
#[derive(Debug, Default, Deserialize)]
struct RawHotkeySettings {
    record: Option<String>,
    play: Option<String>,
    emergency_stop: Option<String>,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            record: Self::default_for(HotkeyAction::Record),
            play: Self::default_for(HotkeyAction::Play),
            emergency_stop: Self::default_for(HotkeyAction::EmergencyStop),
        }
    }
}

impl HotkeySettings {
    /// Built-in binding for an action
    pub fn default_for(action: HotkeyAction) -> Hotkey {
        match action {
            HotkeyAction::Record => Hotkey::single(NamedKey::F9),
            HotkeyAction::Play => Hotkey::single(NamedKey::F10),
            HotkeyAction::EmergencyStop => emergency_default(),
        }
    }

    pub fn get(&self, action: HotkeyAction) -> &Hotkey {
        match action {
            HotkeyAction::Record => &self.record,
            HotkeyAction::Play => &self.play,
            HotkeyAction::EmergencyStop => &self.emergency_stop,
        }
    }

    pub fn set(&mut self, action: HotkeyAction, hotkey: Hotkey) {
        match action {
            HotkeyAction::Record => self.record = hotkey,
            HotkeyAction::Play => self.play = hotkey,
            HotkeyAction::EmergencyStop => self.emergency_stop = hotkey,
        }
    }

    /// All bindings, in a stable order
    pub fn bindings(&self) -> Vec<(HotkeyAction, Hotkey)> {
        HotkeyAction::ALL
            .iter()
            .map(|action| (*action, self.get(*action).clone()))
            .collect()
    }

    /// Parse the settings file format
    ///
    /// A file missing both `record` and `play` yields the defaults; a file
    /// missing only one fills that one in from the defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawHotkeySettings = toml::from_str(content)
            .map_err(|e| InputRecError::SettingsCorrupt(format!("{}", e)))?;

        if raw.record.is_none() && raw.play.is_none() {
            return Ok(Self::default());
        }

        let field = |value: Option<String>, action: HotkeyAction| -> Result<Hotkey> {
            match value {
                Some(descriptor) => descriptor.parse().map_err(|e: InputRecError| {
                    InputRecError::SettingsCorrupt(format!(
                        "{} = '{}': {}",
                        action.settings_key(),
                        descriptor,
                        e
                    ))
                }),
                None => Ok(Self::default_for(action)),
            }
        };

        Ok(Self {
            record: field(raw.record, HotkeyAction::Record)?,
            play: field(raw.play, HotkeyAction::Play)?,
            emergency_stop: field(raw.emergency_stop, HotkeyAction::EmergencyStop)?,
        })
    }

    /// Serialize to the settings file format
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| InputRecError::Config(format!("Failed to serialize settings: {}", e)))
    }

    /// Load settings from a file; an absent file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| InputRecError::SettingsCorrupt(format!("Failed to read settings: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Load settings, returning defaults on any error
    pub fn load_or_default_from(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load hotkey settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load settings from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        match settings_path() {
            Some(path) => Self::load_or_default_from(&path),
            None => {
                tracing::warn!("Could not determine settings path, using default hotkeys");
                Self::default()
            }
        }
    }

    /// Save settings to a file, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    InputRecError::Config(format!("Failed to create settings directory: {}", e))
                })?;
            }
        }

        let content = self.to_toml()?;
        std::fs::write(path, content)
            .map_err(|e| InputRecError::Config(format!("Failed to write settings: {}", e)))
    }
}

fn emergency_default() -> Hotkey {
    // ctrl+shift+x is always a valid combination
    Hotkey::new([Modifier::Ctrl, Modifier::Shift], KeySymbol::Char('x'))
        .unwrap_or_else(|_| Hotkey::single(NamedKey::Escape))
}

// ==================== Tests ====================
