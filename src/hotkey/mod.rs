//! Global hotkey descriptors
//!
//! A [`Hotkey`] is a set of modifiers plus exactly one base key. Its
//! canonical text form lists the modifiers in a fixed order (`alt`, `cmd`,
//! `ctrl`, `shift`) followed by the base key, joined with `+`:
//!
//! ```text
//! f9
//! ctrl+shift+x
//! alt+cmd+space
//! ```
//!
//! Parsing is lenient: case and surrounding whitespace are ignored,
//! modifiers may appear in any order, bracketed names (`<ctrl>+<f9>`) and
//! common aliases (`control`, `super`, `win`, ...) are accepted. Formatting
//! always produces the canonical form, so a descriptor survives a
//! save/load cycle unchanged.

pub mod listener;

pub use listener::{spawn_hotkey_dispatcher, HotkeyEvent, HotkeyListener};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{InputRecError, Result};
use crate::types::{ButtonAction, KeySymbol, NamedKey};

/// Modifier keys, ordered as they appear in a canonical descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Alt,
    Cmd,
    Ctrl,
    Shift,
}

impl Modifier {
    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Alt => "alt",
            Modifier::Cmd => "cmd",
            Modifier::Ctrl => "ctrl",
            Modifier::Shift => "shift",
        }
    }

    /// Parse a modifier name or alias (already lowercased)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "alt" | "alt_l" | "alt_r" | "alt_gr" | "option" => Some(Modifier::Alt),
            "cmd" | "cmd_l" | "cmd_r" | "super" | "win" | "meta" | "command" => {
                Some(Modifier::Cmd)
            }
            "ctrl" | "ctrl_l" | "ctrl_r" | "control" => Some(Modifier::Ctrl),
            "shift" | "shift_l" | "shift_r" => Some(Modifier::Shift),
            _ => None,
        }
    }

    /// The modifier a physical key acts as, folding left and right variants
    pub fn from_key(key: KeySymbol) -> Option<Self> {
        match key {
            KeySymbol::Named(NamedKey::Alt | NamedKey::AltGr) => Some(Modifier::Alt),
            KeySymbol::Named(NamedKey::MetaLeft | NamedKey::MetaRight) => Some(Modifier::Cmd),
            KeySymbol::Named(NamedKey::ControlLeft | NamedKey::ControlRight) => {
                Some(Modifier::Ctrl)
            }
            KeySymbol::Named(NamedKey::ShiftLeft | NamedKey::ShiftRight) => Some(Modifier::Shift),
            _ => None,
        }
    }
}

/// Actions that can be bound to a global hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    /// Toggle recording
    Record,
    /// Toggle playback
    Play,
    /// Force the controller back to idle from any state
    EmergencyStop,
}

impl HotkeyAction {
    pub const ALL: [HotkeyAction; 3] = [
        HotkeyAction::Record,
        HotkeyAction::Play,
        HotkeyAction::EmergencyStop,
    ];

    /// Key used in the settings file
    pub fn settings_key(&self) -> &'static str {
        match self {
            HotkeyAction::Record => "record",
            HotkeyAction::Play => "play",
            HotkeyAction::EmergencyStop => "emergency_stop",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            HotkeyAction::Record => "Record",
            HotkeyAction::Play => "Play",
            HotkeyAction::EmergencyStop => "Emergency stop",
        }
    }
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A key combination: zero or more modifiers plus one base key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hotkey {
    modifiers: BTreeSet<Modifier>,
    key: KeySymbol,
}

impl Hotkey {
    /// Build a hotkey; fails if the base key is itself a modifier
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>, key: KeySymbol) -> Result<Self> {
        if Modifier::from_key(key).is_some() {
            return Err(InputRecError::InvalidHotkey(format!(
                "'{}' is a modifier, not a base key",
                key
            )));
        }
        Ok(Self {
            modifiers: modifiers.into_iter().collect(),
            key,
        })
    }

    /// A hotkey with no modifiers
    pub fn single(key: NamedKey) -> Self {
        Self {
            modifiers: BTreeSet::new(),
            key: KeySymbol::Named(key),
        }
    }

    pub fn modifiers(&self) -> &BTreeSet<Modifier> {
        &self.modifiers
    }

    pub fn key(&self) -> KeySymbol {
        self.key
    }

    /// Canonical descriptor string
    pub fn descriptor(&self) -> String {
        self.to_string()
    }

    /// Human-friendly label for buttons and status lines, e.g. `Ctrl + Shift + X`
    pub fn label(&self) -> String {
        self.to_string()
            .split('+')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.name())?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for Hotkey {
    type Err = InputRecError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(InputRecError::InvalidHotkey("empty descriptor".into()));
        }

        let mut modifiers = BTreeSet::new();
        let mut key = None;

        // A trailing "+" means the base key is the plus sign itself
        let (body, plus_key) = match normalized.strip_suffix("++") {
            Some(rest) => (rest.to_string(), true),
            None => (normalized.clone(), normalized == "+"),
        };
        if plus_key {
            key = Some(KeySymbol::Char('+'));
        }

        if !(plus_key && body == "+") {
            for raw in body.split('+') {
                let token = raw.trim();
                let token = token
                    .strip_prefix('<')
                    .and_then(|t| t.strip_suffix('>'))
                    .unwrap_or(token)
                    .trim();
                if token.is_empty() {
                    return Err(InputRecError::InvalidHotkey(format!(
                        "empty key in '{}'",
                        s.trim()
                    )));
                }

                if let Some(modifier) = Modifier::from_name(token) {
                    modifiers.insert(modifier);
                    continue;
                }

                let symbol = KeySymbol::from_name(token).ok_or_else(|| {
                    InputRecError::InvalidHotkey(format!("unknown key '{}'", token))
                })?;
                if key.replace(symbol).is_some() {
                    return Err(InputRecError::InvalidHotkey(format!(
                        "more than one base key in '{}'",
                        s.trim()
                    )));
                }
            }
        }

        let key = key.ok_or_else(|| {
            InputRecError::InvalidHotkey(format!("no base key in '{}'", s.trim()))
        })?;
        Hotkey::new(modifiers, key)
    }
}

impl From<Hotkey> for String {
    fn from(hotkey: Hotkey) -> Self {
        hotkey.to_string()
    }
}

impl TryFrom<String> for Hotkey {
    type Error = InputRecError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Builds a [`Hotkey`] from a physical press sequence
///
/// Keys are collected while held; the combination is fixed on the first
/// release. Press order does not matter and left/right modifier variants
/// fold together.
#[derive(Debug, Default)]
pub struct HotkeyCapture {
    pressed: Vec<KeySymbol>,
}

impl HotkeyCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key notification
    ///
    /// Returns `Some` once the capture is complete: the first release ends
    /// it, successfully or not.
    pub fn feed(&mut self, key: KeySymbol, action: ButtonAction) -> Option<Result<Hotkey>> {
        match action {
            ButtonAction::Press => {
                if !self.pressed.contains(&key) {
                    self.pressed.push(key);
                }
                None
            }
            ButtonAction::Release => Some(self.finish()),
        }
    }

    fn finish(&mut self) -> Result<Hotkey> {
        let pressed = std::mem::take(&mut self.pressed);
        let mut modifiers = BTreeSet::new();
        let mut base = None;

        for key in pressed {
            if let Some(modifier) = Modifier::from_key(key) {
                modifiers.insert(modifier);
            } else if base.replace(key).is_some() {
                return Err(InputRecError::InvalidHotkey(
                    "press a single key, optionally with modifiers".into(),
                ));
            }
        }

        let key = base.ok_or_else(|| {
            InputRecError::InvalidHotkey("a hotkey needs a non-modifier key".into())
        })?;
        Hotkey::new(modifiers, key)
    }
}
