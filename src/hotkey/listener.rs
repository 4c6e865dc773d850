//! Global hotkey matching on the shared key stream
//!
//! [`HotkeyListener`] sits in the hub's keyboard slot and runs on the OS
//! hook thread, so it never calls into the controller. Matches (and the
//! result of an interactive capture) are sent as [`HotkeyEvent`]s to the
//! dispatcher thread started by [`spawn_hotkey_dispatcher`].

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashSet;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use super::{Hotkey, HotkeyAction, HotkeyCapture, Modifier};
use crate::backend::InputObserver;
use crate::bridge::StatusEvent;
use crate::error::Result;
use crate::session::{Outcome, SessionController};
use crate::types::{ButtonAction, Event, KeySymbol};

/// Messages from the hook thread to the dispatcher
#[derive(Debug)]
pub enum HotkeyEvent {
    /// A bound combination was pressed
    Triggered(HotkeyAction),
    /// An interactive capture finished
    Captured {
        action: HotkeyAction,
        result: Result<Hotkey>,
    },
}

#[derive(Default)]
struct ListenerState {
    bindings: Vec<(HotkeyAction, Hotkey)>,
    held: HashSet<KeySymbol>,
    capture: Option<(HotkeyAction, HotkeyCapture)>,
}

impl ListenerState {
    fn held_modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.held.iter().filter_map(|key| Modifier::from_key(*key))
    }

    fn matching(&self, key: KeySymbol) -> Option<HotkeyAction> {
        let held: std::collections::BTreeSet<Modifier> = self.held_modifiers().collect();
        self.bindings
            .iter()
            .find(|(_, hotkey)| hotkey.key() == key && *hotkey.modifiers() == held)
            .map(|(action, _)| *action)
    }
}

/// Matches key notifications against the configured bindings
pub struct HotkeyListener {
    state: Mutex<ListenerState>,
    tx: Sender<HotkeyEvent>,
}

impl HotkeyListener {
    /// Create a listener and the receiving end for the dispatcher
    pub fn new() -> (Self, Receiver<HotkeyEvent>) {
        let (tx, rx) = unbounded();
        (
            Self {
                state: Mutex::new(ListenerState::default()),
                tx,
            },
            rx,
        )
    }

    /// Replace all bindings
    pub fn set_bindings(&self, bindings: impl IntoIterator<Item = (HotkeyAction, Hotkey)>) {
        let mut state = self.lock();
        state.bindings = bindings.into_iter().collect();
        tracing::debug!(
            "Hotkey bindings: {}",
            state
                .bindings
                .iter()
                .map(|(action, hotkey)| format!("{}={}", action.settings_key(), hotkey))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    /// Route the next combination to a capture instead of the bindings
    pub fn begin_capture(&self, action: HotkeyAction) {
        self.lock().capture = Some((action, HotkeyCapture::new()));
    }

    pub fn cancel_capture(&self) {
        self.lock().capture = None;
    }

    pub fn is_capturing(&self) -> bool {
        self.lock().capture.is_some()
    }

    /// Forget every key believed to be held down
    ///
    /// Synthetic presses replayed through the hook may never see their
    /// release, which would otherwise mask the next real press as repeat.
    pub fn clear_held_keys(&self) {
        self.lock().held.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListenerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle_key(&self, key: KeySymbol, action: ButtonAction) -> Option<HotkeyEvent> {
        let mut state = self.lock();

        if let Some((target, capture)) = state.capture.as_mut() {
            let target = *target;
            let done = capture.feed(key, action);
            match action {
                ButtonAction::Press => state.held.insert(key),
                ButtonAction::Release => state.held.remove(&key),
            };
            return done.map(|result| {
                state.capture = None;
                HotkeyEvent::Captured {
                    action: target,
                    result,
                }
            });
        }

        match action {
            ButtonAction::Press => {
                // Auto-repeat delivers presses for a key that is already down
                if !state.held.insert(key) {
                    return None;
                }
                state.matching(key).map(HotkeyEvent::Triggered)
            }
            ButtonAction::Release => {
                state.held.remove(&key);
                None
            }
        }
    }
}

impl InputObserver for HotkeyListener {
    fn observe(&self, event: &Event) {
        let Some((key, action)) = event.key_action() else {
            return;
        };
        if let Some(hotkey_event) = self.handle_key(key, action) {
            tracing::debug!("Hotkey event: {:?}", hotkey_event);
            let _ = self.tx.send(hotkey_event);
        }
    }
}

impl std::fmt::Debug for HotkeyListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotkeyListener")
            .field("capturing", &self.is_capturing())
            .finish()
    }
}

/// Run controller actions for hotkey events on a dedicated thread
///
/// The thread ends when every [`HotkeyListener`] sender is gone.
pub fn spawn_hotkey_dispatcher(
    rx: Receiver<HotkeyEvent>,
    controller: SessionController,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("hotkey-dispatch".into())
        .spawn(move || {
            for event in rx.iter() {
                dispatch(&controller, event);
            }
            tracing::debug!("Hotkey dispatcher exiting");
        })?;
    Ok(handle)
}

fn dispatch(controller: &SessionController, event: HotkeyEvent) {
    match event {
        HotkeyEvent::Triggered(HotkeyAction::Record) => {
            controller.toggle_record();
        }
        HotkeyEvent::Triggered(HotkeyAction::Play) => {
            controller.toggle_play();
        }
        HotkeyEvent::Triggered(HotkeyAction::EmergencyStop) => {
            controller.emergency_stop();
        }
        HotkeyEvent::Captured {
            action,
            result: Ok(hotkey),
        } => {
            controller.publish(StatusEvent::HotkeyCaptured {
                action,
                hotkey: hotkey.clone(),
            });
            controller.set_hotkey(action, hotkey);
        }
        HotkeyEvent::Captured {
            action,
            result: Err(e),
        } => {
            tracing::info!("Hotkey capture for {} failed: {}", action, e);
            controller.publish(StatusEvent::Outcome(Outcome::from_error(&e)));
        }
    }
}
