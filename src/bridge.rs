//! Thread boundary between the session engine and the UI.
//!
//! Engine threads (controller callers, the playback worker, the hotkey
//! dispatcher) publish [`StatusEvent`]s through a bounded channel with
//! `try_send`; the UI drains it once per frame. A full channel drops the
//! event rather than stalling the engine.

use crate::hotkey::{Hotkey, HotkeyAction};
use crate::session::types::{Outcome, PlaybackReport, SessionState};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Messages sent from the engine to the UI thread.
#[derive(Debug, Clone)]
pub enum StatusEvent {
    /// Controller state changed.
    StateChanged(SessionState),

    /// Result of a control-surface call (status line plus optional error).
    Outcome(Outcome),

    /// The event log was replaced (recording stopped or file loaded).
    LogReplaced { event_count: usize },

    /// A playback pass started (1-based).
    PlaybackPass(u32),

    /// A playback run ended on its own or through cancellation.
    PlaybackFinished(PlaybackReport),

    /// A hotkey binding changed.
    HotkeyChanged { action: HotkeyAction, hotkey: Hotkey },

    /// The hotkey dialog finished capturing a combination.
    HotkeyCaptured { action: HotkeyAction, hotkey: Hotkey },
}

/// Channel capacity for engine → UI status messages.
const STATUS_CHANNEL_CAPACITY: usize = 1_024;

/// Engine-side publishing handle.
#[derive(Debug, Clone)]
pub struct StatusSender {
    tx: Sender<StatusEvent>,
}

impl StatusSender {
    /// Publish without blocking. Returns `false` if the event was dropped.
    pub fn publish(&self, event: StatusEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::debug!("Status channel full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// UI-side handle for receiving engine status.
#[derive(Debug)]
pub struct StatusBridge {
    rx: Receiver<StatusEvent>,
}

impl StatusBridge {
    /// Create a new bridge pair: `(bridge_for_ui, sender_for_engine)`.
    pub fn new() -> (Self, StatusSender) {
        let (tx, rx) = bounded(STATUS_CHANNEL_CAPACITY);
        (Self { rx }, StatusSender { tx })
    }

    /// Drain all pending messages.
    pub fn drain(&self) -> Vec<StatusEvent> {
        let mut msgs = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    /// Try to receive a single message without blocking.
    pub fn try_recv(&self) -> Option<StatusEvent> {
        self.rx.try_recv().ok()
    }

    /// Block until a message arrives or the timeout elapses.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<StatusEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}
