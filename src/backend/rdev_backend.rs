//! rdev-backed global input hook and synthetic input
//!
//! `rdev::listen` installs a process-wide hook and never returns while it
//! is healthy, so [`RdevSource`] runs it on a dedicated thread that lives
//! for the rest of the process. Recordings come and go by attaching and
//! detaching observers on the [`InputHub`], not by restarting the hook.
//!
//! Button and wheel notifications carry no position in rdev, so the hook
//! thread remembers the last pointer position and stamps it onto clicks
//! and scrolls.

use rdev::{Button, EventType, Key};
use std::thread;

use super::{InputHub, InputSink, InputSource};
use crate::error::{InputRecError, Result};
use crate::types::{ButtonAction, Event, KeySymbol, MouseButton, NamedKey};

/// Global hook input source
#[derive(Debug, Default)]
pub struct RdevSource;

impl RdevSource {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for RdevSource {
    fn name(&self) -> &'static str {
        "rdev"
    }

    fn start(self: Box<Self>, hub: InputHub) -> Result<()> {
        thread::Builder::new()
            .name("rdev-hook".into())
            .spawn(move || {
                let mut translator = Translator::default();
                tracing::info!("Global input hook started");
                if let Err(error) = rdev::listen(move |event: rdev::Event| {
                    hub.dispatch(&translator.translate(&event.event_type));
                }) {
                    tracing::error!("Global input hook failed: {:?}", error);
                }
            })?;
        Ok(())
    }
}

/// Turns raw rdev notifications into [`Event`]s
#[derive(Debug, Default)]
struct Translator {
    x: i32,
    y: i32,
}

impl Translator {
    fn translate(&mut self, event_type: &EventType) -> Event {
        match *event_type {
            EventType::MouseMove { x, y } => {
                self.x = x.round() as i32;
                self.y = y.round() as i32;
                Event::Move {
                    x: self.x,
                    y: self.y,
                }
            }
            EventType::ButtonPress(button) | EventType::ButtonRelease(button) => Event::Click {
                x: self.x,
                y: self.y,
                button: button_from_rdev(button),
                action: ButtonAction::from_pressed(matches!(
                    event_type,
                    EventType::ButtonPress(_)
                )),
            },
            EventType::Wheel { delta_x, delta_y } => Event::Scroll {
                x: self.x,
                y: self.y,
                dx: clamp_delta(delta_x),
                dy: clamp_delta(delta_y),
            },
            EventType::KeyPress(key) => Event::KeyPress {
                key: key_to_symbol(key),
            },
            EventType::KeyRelease(key) => Event::KeyRelease {
                key: key_to_symbol(key),
            },
        }
    }
}

fn clamp_delta(delta: i64) -> i32 {
    delta.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Synthetic input through `rdev::simulate`
#[derive(Debug, Default)]
pub struct RdevSink;

impl RdevSink {
    pub fn new() -> Self {
        Self
    }

    fn simulate(&self, event_type: &EventType) -> Result<()> {
        rdev::simulate(event_type).map_err(|e| {
            InputRecError::Backend(format!("Failed to simulate {:?}: {:?}", event_type, e))
        })
    }
}

impl InputSink for RdevSink {
    fn move_to(&self, x: i32, y: i32) -> Result<()> {
        self.simulate(&EventType::MouseMove {
            x: x as f64,
            y: y as f64,
        })
    }

    fn button(&self, button: MouseButton, action: ButtonAction) -> Result<()> {
        let button = button_to_rdev(button);
        match action {
            ButtonAction::Press => self.simulate(&EventType::ButtonPress(button)),
            ButtonAction::Release => self.simulate(&EventType::ButtonRelease(button)),
        }
    }

    fn scroll(&self, dx: i32, dy: i32) -> Result<()> {
        self.simulate(&EventType::Wheel {
            delta_x: dx as i64,
            delta_y: dy as i64,
        })
    }

    fn key(&self, key: KeySymbol, action: ButtonAction) -> Result<()> {
        let rdev_key = symbol_to_key(key)
            .ok_or_else(|| InputRecError::Backend(format!("No platform key for '{}'", key)))?;
        match action {
            ButtonAction::Press => self.simulate(&EventType::KeyPress(rdev_key)),
            ButtonAction::Release => self.simulate(&EventType::KeyRelease(rdev_key)),
        }
    }
}

fn button_from_rdev(button: Button) -> MouseButton {
    match button {
        Button::Left => MouseButton::Left,
        Button::Right => MouseButton::Right,
        Button::Middle => MouseButton::Middle,
        Button::Unknown(code) => MouseButton::Other(code),
    }
}

fn button_to_rdev(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
        MouseButton::Other(code) => Button::Unknown(code),
    }
}

/// Physical key to symbol, using the base (unshifted) US character
///
/// Keypad keys fold onto the character or control key they produce.
pub fn key_to_symbol(key: Key) -> KeySymbol {
    use KeySymbol::{Char, Code, Named};

    match key {
        Key::Alt => Named(NamedKey::Alt),
        Key::AltGr => Named(NamedKey::AltGr),
        Key::Backspace => Named(NamedKey::Backspace),
        Key::CapsLock => Named(NamedKey::CapsLock),
        Key::ControlLeft => Named(NamedKey::ControlLeft),
        Key::ControlRight => Named(NamedKey::ControlRight),
        Key::Delete | Key::KpDelete => Named(NamedKey::Delete),
        Key::DownArrow => Named(NamedKey::Down),
        Key::End => Named(NamedKey::End),
        Key::Escape => Named(NamedKey::Escape),
        Key::F1 => Named(NamedKey::F1),
        Key::F2 => Named(NamedKey::F2),
        Key::F3 => Named(NamedKey::F3),
        Key::F4 => Named(NamedKey::F4),
        Key::F5 => Named(NamedKey::F5),
        Key::F6 => Named(NamedKey::F6),
        Key::F7 => Named(NamedKey::F7),
        Key::F8 => Named(NamedKey::F8),
        Key::F9 => Named(NamedKey::F9),
        Key::F10 => Named(NamedKey::F10),
        Key::F11 => Named(NamedKey::F11),
        Key::F12 => Named(NamedKey::F12),
        Key::Function => Named(NamedKey::Function),
        Key::Home => Named(NamedKey::Home),
        Key::Insert => Named(NamedKey::Insert),
        Key::IntlBackslash => Named(NamedKey::IntlBackslash),
        Key::LeftArrow => Named(NamedKey::Left),
        Key::MetaLeft => Named(NamedKey::MetaLeft),
        Key::MetaRight => Named(NamedKey::MetaRight),
        Key::NumLock => Named(NamedKey::NumLock),
        Key::PageDown => Named(NamedKey::PageDown),
        Key::PageUp => Named(NamedKey::PageUp),
        Key::Pause => Named(NamedKey::Pause),
        Key::PrintScreen => Named(NamedKey::PrintScreen),
        Key::Return | Key::KpReturn => Named(NamedKey::Return),
        Key::RightArrow => Named(NamedKey::Right),
        Key::ScrollLock => Named(NamedKey::ScrollLock),
        Key::ShiftLeft => Named(NamedKey::ShiftLeft),
        Key::ShiftRight => Named(NamedKey::ShiftRight),
        Key::Space => Named(NamedKey::Space),
        Key::Tab => Named(NamedKey::Tab),
        Key::UpArrow => Named(NamedKey::Up),
        Key::BackQuote => Char('`'),
        Key::Num1 | Key::Kp1 => Char('1'),
        Key::Num2 | Key::Kp2 => Char('2'),
        Key::Num3 | Key::Kp3 => Char('3'),
        Key::Num4 | Key::Kp4 => Char('4'),
        Key::Num5 | Key::Kp5 => Char('5'),
        Key::Num6 | Key::Kp6 => Char('6'),
        Key::Num7 | Key::Kp7 => Char('7'),
        Key::Num8 | Key::Kp8 => Char('8'),
        Key::Num9 | Key::Kp9 => Char('9'),
        Key::Num0 | Key::Kp0 => Char('0'),
        Key::Minus | Key::KpMinus => Char('-'),
        Key::Equal => Char('='),
        Key::KpPlus => Char('+'),
        Key::KpMultiply => Char('*'),
        Key::KpDivide | Key::Slash => Char('/'),
        Key::KeyQ => Char('q'),
        Key::KeyW => Char('w'),
        Key::KeyE => Char('e'),
        Key::KeyR => Char('r'),
        Key::KeyT => Char('t'),
        Key::KeyY => Char('y'),
        Key::KeyU => Char('u'),
        Key::KeyI => Char('i'),
        Key::KeyO => Char('o'),
        Key::KeyP => Char('p'),
        Key::KeyA => Char('a'),
        Key::KeyS => Char('s'),
        Key::KeyD => Char('d'),
        Key::KeyF => Char('f'),
        Key::KeyG => Char('g'),
        Key::KeyH => Char('h'),
        Key::KeyJ => Char('j'),
        Key::KeyK => Char('k'),
        Key::KeyL => Char('l'),
        Key::KeyZ => Char('z'),
        Key::KeyX => Char('x'),
        Key::KeyC => Char('c'),
        Key::KeyV => Char('v'),
        Key::KeyB => Char('b'),
        Key::KeyN => Char('n'),
        Key::KeyM => Char('m'),
        Key::LeftBracket => Char('['),
        Key::RightBracket => Char(']'),
        Key::SemiColon => Char(';'),
        Key::Quote => Char('\''),
        Key::BackSlash => Char('\\'),
        Key::Comma => Char(','),
        Key::Dot => Char('.'),
        Key::Unknown(code) => Code(code),
    }
}

/// Symbol back to a physical key; `None` for characters with no key of their own
pub fn symbol_to_key(symbol: KeySymbol) -> Option<Key> {
    let key = match symbol {
        KeySymbol::Code(code) => Key::Unknown(code),
        KeySymbol::Named(named) => match named {
            NamedKey::Alt => Key::Alt,
            NamedKey::AltGr => Key::AltGr,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::CapsLock => Key::CapsLock,
            NamedKey::ControlLeft => Key::ControlLeft,
            NamedKey::ControlRight => Key::ControlRight,
            NamedKey::Delete => Key::Delete,
            NamedKey::Down => Key::DownArrow,
            NamedKey::End => Key::End,
            NamedKey::Escape => Key::Escape,
            NamedKey::F1 => Key::F1,
            NamedKey::F2 => Key::F2,
            NamedKey::F3 => Key::F3,
            NamedKey::F4 => Key::F4,
            NamedKey::F5 => Key::F5,
            NamedKey::F6 => Key::F6,
            NamedKey::F7 => Key::F7,
            NamedKey::F8 => Key::F8,
            NamedKey::F9 => Key::F9,
            NamedKey::F10 => Key::F10,
            NamedKey::F11 => Key::F11,
            NamedKey::F12 => Key::F12,
            NamedKey::Function => Key::Function,
            NamedKey::Home => Key::Home,
            NamedKey::Insert => Key::Insert,
            NamedKey::IntlBackslash => Key::IntlBackslash,
            NamedKey::Left => Key::LeftArrow,
            NamedKey::MetaLeft => Key::MetaLeft,
            NamedKey::MetaRight => Key::MetaRight,
            NamedKey::NumLock => Key::NumLock,
            NamedKey::PageDown => Key::PageDown,
            NamedKey::PageUp => Key::PageUp,
            NamedKey::Pause => Key::Pause,
            NamedKey::PrintScreen => Key::PrintScreen,
            NamedKey::Return => Key::Return,
            NamedKey::Right => Key::RightArrow,
            NamedKey::ScrollLock => Key::ScrollLock,
            NamedKey::ShiftLeft => Key::ShiftLeft,
            NamedKey::ShiftRight => Key::ShiftRight,
            NamedKey::Space => Key::Space,
            NamedKey::Tab => Key::Tab,
            NamedKey::Up => Key::UpArrow,
        },
        KeySymbol::Char(c) => match c.to_ascii_lowercase() {
            '`' => Key::BackQuote,
            '1' => Key::Num1,
            '2' => Key::Num2,
            '3' => Key::Num3,
            '4' => Key::Num4,
            '5' => Key::Num5,
            '6' => Key::Num6,
            '7' => Key::Num7,
            '8' => Key::Num8,
            '9' => Key::Num9,
            '0' => Key::Num0,
            '-' => Key::Minus,
            '=' => Key::Equal,
            '+' => Key::KpPlus,
            '*' => Key::KpMultiply,
            '/' => Key::Slash,
            'q' => Key::KeyQ,
            'w' => Key::KeyW,
            'e' => Key::KeyE,
            'r' => Key::KeyR,
            't' => Key::KeyT,
            'y' => Key::KeyY,
            'u' => Key::KeyU,
            'i' => Key::KeyI,
            'o' => Key::KeyO,
            'p' => Key::KeyP,
            'a' => Key::KeyA,
            's' => Key::KeyS,
            'd' => Key::KeyD,
            'f' => Key::KeyF,
            'g' => Key::KeyG,
            'h' => Key::KeyH,
            'j' => Key::KeyJ,
            'k' => Key::KeyK,
            'l' => Key::KeyL,
            'z' => Key::KeyZ,
            'x' => Key::KeyX,
            'c' => Key::KeyC,
            'v' => Key::KeyV,
            'b' => Key::KeyB,
            'n' => Key::KeyN,
            'm' => Key::KeyM,
            '[' => Key::LeftBracket,
            ']' => Key::RightBracket,
            ';' => Key::SemiColon,
            '\'' => Key::Quote,
            '\\' => Key::BackSlash,
            ',' => Key::Comma,
            '.' => Key::Dot,
            ' ' => Key::Space,
            _ => return None,
        },
    };
    Some(key)
}
