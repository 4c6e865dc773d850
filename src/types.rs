//! Core input event types
//!
//! Every captured notification becomes an [`Event`], paired with its offset
//! from the start of the recording in a [`TimedEvent`]. Keys are stored as
//! [`KeySymbol`] values with an explicit, layout-independent serialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mouse button identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Extra buttons reported by the platform by index
    Other(u8),
}

/// Whether a button or key went down or up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Press,
    Release,
}

impl ButtonAction {
    pub fn from_pressed(pressed: bool) -> Self {
        if pressed {
            ButtonAction::Press
        } else {
            ButtonAction::Release
        }
    }
}

/// Named control keys
///
/// Serialized through their canonical lowercase names (see [`NamedKey::name`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NamedKey {
    Alt,
    AltGr,
    Backspace,
    CapsLock,
    ControlLeft,
    ControlRight,
    Delete,
    Down,
    End,
    Escape,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Function,
    Home,
    Insert,
    IntlBackslash,
    Left,
    MetaLeft,
    MetaRight,
    NumLock,
    PageDown,
    PageUp,
    Pause,
    PrintScreen,
    Return,
    Right,
    ScrollLock,
    ShiftLeft,
    ShiftRight,
    Space,
    Tab,
    Up,
}

const NAMED_KEYS: &[(NamedKey, &str)] = &[
    (NamedKey::Alt, "alt_l"),
    (NamedKey::AltGr, "alt_gr"),
    (NamedKey::Backspace, "backspace"),
    (NamedKey::CapsLock, "caps_lock"),
    (NamedKey::ControlLeft, "ctrl_l"),
    (NamedKey::ControlRight, "ctrl_r"),
    (NamedKey::Delete, "delete"),
    (NamedKey::Down, "down"),
    (NamedKey::End, "end"),
    (NamedKey::Escape, "esc"),
    (NamedKey::F1, "f1"),
    (NamedKey::F2, "f2"),
    (NamedKey::F3, "f3"),
    (NamedKey::F4, "f4"),
    (NamedKey::F5, "f5"),
    (NamedKey::F6, "f6"),
    (NamedKey::F7, "f7"),
    (NamedKey::F8, "f8"),
    (NamedKey::F9, "f9"),
    (NamedKey::F10, "f10"),
    (NamedKey::F11, "f11"),
    (NamedKey::F12, "f12"),
    (NamedKey::Function, "fn"),
    (NamedKey::Home, "home"),
    (NamedKey::Insert, "insert"),
    (NamedKey::IntlBackslash, "intl_backslash"),
    (NamedKey::Left, "left"),
    (NamedKey::MetaLeft, "cmd_l"),
    (NamedKey::MetaRight, "cmd_r"),
    (NamedKey::NumLock, "num_lock"),
    (NamedKey::PageDown, "page_down"),
    (NamedKey::PageUp, "page_up"),
    (NamedKey::Pause, "pause"),
    (NamedKey::PrintScreen, "print_screen"),
    (NamedKey::Return, "enter"),
    (NamedKey::Right, "right"),
    (NamedKey::ScrollLock, "scroll_lock"),
    (NamedKey::ShiftLeft, "shift_l"),
    (NamedKey::ShiftRight, "shift_r"),
    (NamedKey::Space, "space"),
    (NamedKey::Tab, "tab"),
    (NamedKey::Up, "up"),
];

impl NamedKey {
    /// Canonical lowercase name used in files and hotkey descriptors
    pub fn name(&self) -> &'static str {
        NAMED_KEYS
            .iter()
            .find(|(key, _)| key == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }

    /// Look up a key by canonical name or a common alias
    pub fn from_name(name: &str) -> Option<Self> {
        let name = match name {
            "escape" => "esc",
            "return" => "enter",
            "alt" => "alt_l",
            "del" => "delete",
            other => other,
        };
        NAMED_KEYS
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(key, _)| *key)
    }
}

impl From<NamedKey> for String {
    fn from(key: NamedKey) -> Self {
        key.name().to_string()
    }
}

impl TryFrom<String> for NamedKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NamedKey::from_name(&value).ok_or_else(|| format!("unknown key name '{}'", value))
    }
}

/// Layout-independent identity of a single keyboard key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum KeySymbol {
    /// A control key (function keys, modifiers, navigation, ...)
    Named(NamedKey),
    /// A literal character, always the unshifted base character
    Char(char),
    /// Raw platform key code with no symbolic mapping
    Code(u32),
}

impl KeySymbol {
    /// Canonical name, as used in hotkey descriptors
    pub fn name(&self) -> String {
        match self {
            KeySymbol::Named(key) => key.name().to_string(),
            KeySymbol::Char(c) => c.to_string(),
            KeySymbol::Code(code) => format!("code:{}", code),
        }
    }

    /// Parse a canonical name back into a symbol
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.clone().next()) {
            return c.to_lowercase().next().map(KeySymbol::Char);
        }
        if let Some(code) = name.strip_prefix("code:") {
            return code.parse().ok().map(KeySymbol::Code);
        }
        NamedKey::from_name(name).map(KeySymbol::Named)
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// The notification channel an event arrives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputChannel {
    Pointer,
    Keyboard,
}

/// A single captured input event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Event {
    Move {
        x: i32,
        y: i32,
    },
    Click {
        x: i32,
        y: i32,
        button: MouseButton,
        action: ButtonAction,
    },
    Scroll {
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
    },
    KeyPress {
        key: KeySymbol,
    },
    KeyRelease {
        key: KeySymbol,
    },
}

impl Event {
    pub fn channel(&self) -> InputChannel {
        match self {
            Event::Move { .. } | Event::Click { .. } | Event::Scroll { .. } => InputChannel::Pointer,
            Event::KeyPress { .. } | Event::KeyRelease { .. } => InputChannel::Keyboard,
        }
    }

    /// Short kind name, matching the serialized tag
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::Move { .. } => "move",
            Event::Click { .. } => "click",
            Event::Scroll { .. } => "scroll",
            Event::KeyPress { .. } => "key_press",
            Event::KeyRelease { .. } => "key_release",
        }
    }

    /// The key and its direction, for keyboard events
    pub fn key_action(&self) -> Option<(KeySymbol, ButtonAction)> {
        match self {
            Event::KeyPress { key } => Some((*key, ButtonAction::Press)),
            Event::KeyRelease { key } => Some((*key, ButtonAction::Release)),
            _ => None,
        }
    }
}

/// An event paired with its offset from the start of recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Seconds since the recording started
    pub elapsed: f64,
    pub event: Event,
}

impl TimedEvent {
    pub fn new(elapsed: f64, event: Event) -> Self {
        Self { elapsed, event }
    }
}
