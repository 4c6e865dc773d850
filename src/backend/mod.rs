//! Backend module for system-wide input capture and synthetic input
//!
//! The OS side is reached through two traits so the engine can run against
//! real hardware or against test doubles:
//!
//! - [`InputSource`] - Delivers global pointer and keyboard notifications into an [`InputHub`]
//! - [`InputSink`] - Emits synthetic pointer and keyboard actions during playback
//!
//! # Notification fan-out
//!
//! An [`InputHub`] is shared between the source thread(s) and the engine.
//! Each notification is offered to two observer slots:
//!
//! - the **capture** slot, filled only while a recording is active
//! - the **keyboard** slot, holding the global hotkey listener
//!
//! The capture slot is read-locked for the duration of a delivery. Detaching
//! the capture observer takes the write lock, so once
//! [`InputHub::detach_capture`] returns no delivery is still in flight and
//! no later notification can reach the recording.

pub mod rdev_backend;

pub use rdev_backend::{RdevSink, RdevSource};

use crate::error::{InputRecError, Result};
use crate::session::SessionState;
use crate::types::{ButtonAction, Event, KeySymbol, MouseButton};
use std::sync::{Arc, RwLock};

/// Something that reacts to input notifications
///
/// Implementations are called from the notification thread and must return
/// quickly.
pub trait InputObserver: Send + Sync {
    fn observe(&self, event: &Event);
}

/// A provider of global input notifications
pub trait InputSource: Send {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Begin delivering notifications into the hub
    fn start(self: Box<Self>, hub: InputHub) -> Result<()>;
}

/// Synthetic input output used by playback
///
/// Actions are fire-and-forget: an `Ok` only means the request was handed to
/// the platform.
#[cfg_attr(test, mockall::automock)]
pub trait InputSink: Send + Sync {
    fn move_to(&self, x: i32, y: i32) -> Result<()>;
    fn button(&self, button: MouseButton, action: ButtonAction) -> Result<()>;
    fn scroll(&self, dx: i32, dy: i32) -> Result<()>;
    fn key(&self, key: KeySymbol, action: ButtonAction) -> Result<()>;
}

#[derive(Default)]
struct HubSlots {
    capture: RwLock<Option<Arc<dyn InputObserver>>>,
    keyboard: RwLock<Option<Arc<dyn InputObserver>>>,
}

/// Shared fan-out point between input sources and the engine
#[derive(Clone, Default)]
pub struct InputHub {
    slots: Arc<HubSlots>,
}

impl InputHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one notification to the attached observers
    ///
    /// Safe to call concurrently from any number of source threads.
    pub fn dispatch(&self, event: &Event) {
        {
            let capture = self
                .slots
                .capture
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(observer) = capture.as_ref() {
                observer.observe(event);
            }
        }

        if event.key_action().is_some() {
            let keyboard = self
                .slots
                .keyboard
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone();
            if let Some(observer) = keyboard {
                observer.observe(event);
            }
        }
    }

    /// Attach the recording observer; only one may be attached at a time
    pub fn attach_capture(&self, observer: Arc<dyn InputObserver>) -> Result<()> {
        let mut slot = self
            .slots
            .capture
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return Err(InputRecError::AlreadyActive(SessionState::Recording));
        }
        *slot = Some(observer);
        Ok(())
    }

    /// Detach the recording observer, waiting for in-flight deliveries
    pub fn detach_capture(&self) -> Option<Arc<dyn InputObserver>> {
        self.slots
            .capture
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    pub fn is_capturing(&self) -> bool {
        self.slots
            .capture
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Install the observer that receives every key notification
    pub fn set_key_observer(&self, observer: Option<Arc<dyn InputObserver>>) {
        *self
            .slots
            .keyboard
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = observer;
    }
}

impl std::fmt::Debug for InputHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHub")
            .field("capturing", &self.is_capturing())
            .finish()
    }
}
