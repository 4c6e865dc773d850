//! Session controller: the Idle / Recording / Playing state machine
//!
//! [`SessionController`] is a cheap, cloneable handle. The UI, the hotkey
//! dispatcher and the playback worker all hold clones and call the same
//! control surface. Every call returns an [`Outcome`] and also publishes it
//! on the status bridge, so the UI sees hotkey-triggered changes too.
//!
//! Only one session runs at a time. Stopping flips the state to `Idle`
//! immediately; a cancelled playback worker finishes in the background and
//! its late completion is ignored through a generation counter.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use super::player::{CancelToken, PlaybackSession};
use super::recorder::CaptureSession;
use super::types::{EventLog, Outcome, PlaybackReport, SessionState};
use crate::backend::{InputHub, InputSink};
use crate::bridge::{StatusBridge, StatusEvent, StatusSender};
use crate::config::{HotkeySettings, PlaybackSettings};
use crate::error::{InputRecError, Result, ResultExt};
use crate::hotkey::{Hotkey, HotkeyAction, HotkeyListener};

/// Everything a controller needs from the outside world
pub struct ControllerConfig {
    /// Hub the OS input source dispatches into
    pub hub: InputHub,
    /// Synthetic input output for playback
    pub sink: Arc<dyn InputSink>,
    /// Initial hotkey bindings
    pub hotkeys: HotkeySettings,
    /// Where hotkey changes are persisted; `None` disables persistence
    pub settings_path: Option<PathBuf>,
    /// Global hotkey matcher to keep in sync with the bindings
    pub listener: Option<Arc<HotkeyListener>>,
}

struct ActivePlayback {
    cancel: Arc<CancelToken>,
    generation: u64,
}

struct Core {
    state: SessionState,
    log: Arc<EventLog>,
    capture: Option<CaptureSession>,
    playback: Option<ActivePlayback>,
    generation: u64,
    hotkeys: HotkeySettings,
    playback_settings: PlaybackSettings,
}

struct Shared {
    core: Mutex<Core>,
    hub: InputHub,
    sink: Arc<dyn InputSink>,
    status: StatusSender,
    listener: Option<Arc<HotkeyListener>>,
    settings_path: Option<PathBuf>,
}

/// Handle to the single session state machine
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    /// Create a controller and the UI end of its status bridge
    pub fn new(config: ControllerConfig) -> (Self, StatusBridge) {
        let (bridge, status) = StatusBridge::new();

        if let Some(listener) = &config.listener {
            listener.set_bindings(config.hotkeys.bindings());
        }

        let core = Core {
            state: SessionState::Idle,
            log: Arc::new(EventLog::new()),
            capture: None,
            playback: None,
            generation: 0,
            hotkeys: config.hotkeys,
            playback_settings: PlaybackSettings::default(),
        };

        let controller = Self {
            shared: Arc::new(Shared {
                core: Mutex::new(core),
                hub: config.hub,
                sink: config.sink,
                status,
                listener: config.listener,
                settings_path: config.settings_path,
            }),
        };
        (controller, bridge)
    }

    fn core(&self) -> MutexGuard<'_, Core> {
        self.shared
            .core
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send a status event to the UI without blocking
    pub fn publish(&self, event: StatusEvent) {
        self.shared.status.publish(event);
    }

    fn report(&self, result: Result<String>) -> Outcome {
        let outcome = Outcome::from(result);
        match &outcome.error {
            Some(kind) => tracing::info!("Rejected ({:?}): {}", kind, outcome.message),
            None => tracing::debug!("{}", outcome.message),
        }
        self.publish(StatusEvent::Outcome(outcome.clone()));
        outcome
    }

    fn set_state(&self, core: &mut Core, state: SessionState) {
        if core.state != state {
            tracing::info!("Session state {} -> {}", core.state, state);
            core.state = state;
            self.publish(StatusEvent::StateChanged(state));
        }
    }

    // ==================== Queries ====================

    pub fn state(&self) -> SessionState {
        self.core().state
    }

    pub fn event_count(&self) -> usize {
        self.core().log.len()
    }

    /// Snapshot of the current log
    pub fn log(&self) -> Arc<EventLog> {
        self.core().log.clone()
    }

    pub fn hotkeys(&self) -> HotkeySettings {
        self.core().hotkeys.clone()
    }

    pub fn playback_settings(&self) -> PlaybackSettings {
        self.core().playback_settings
    }

    /// Remember speed and loop for the play hotkey
    pub fn set_playback_settings(&self, settings: PlaybackSettings) {
        self.core().playback_settings = settings;
    }

    // ==================== Control surface ====================

    /// `Idle -> Recording`, starting from an empty log
    pub fn start_recording(&self) -> Outcome {
        let result = self.try_start_recording();
        self.report(result)
    }

    fn try_start_recording(&self) -> Result<String> {
        let mut core = self.core();
        if !core.state.is_idle() {
            return Err(InputRecError::AlreadyActive(core.state));
        }

        let capture = CaptureSession::start(&self.shared.hub)?;
        core.capture = Some(capture);
        core.log = Arc::new(EventLog::new());
        self.set_state(&mut core, SessionState::Recording);
        self.publish(StatusEvent::LogReplaced { event_count: 0 });

        Ok(format!(
            "Recording... Press 'Stop' or {} to finish.",
            core.hotkeys.record.label()
        ))
    }

    /// Stop whichever session is active; a no-op when idle
    pub fn stop_active(&self) -> Outcome {
        let mut core = self.core();
        let message = match core.state {
            SessionState::Idle => "Nothing to stop.".to_string(),
            SessionState::Recording => self.finish_recording(&mut core),
            SessionState::Playing => {
                self.cancel_playback(&mut core);
                "Playback stopped.".to_string()
            }
        };
        drop(core);
        self.report(Ok(message))
    }

    /// Start playing the current log
    ///
    /// Speed is clamped to `1..=10`. The settings become the ones the play
    /// hotkey uses.
    pub fn start_playback(&self, speed: i64, loop_playback: bool) -> Outcome {
        let settings = PlaybackSettings::new(speed, loop_playback);
        let result = self.try_start_playback(settings);
        self.report(result)
    }

    fn try_start_playback(&self, settings: PlaybackSettings) -> Result<String> {
        let mut core = self.core();
        if !core.state.is_idle() {
            return Err(InputRecError::AlreadyActive(core.state));
        }
        if core.log.is_empty() {
            return Err(InputRecError::EmptyLog);
        }
        core.playback_settings = settings;

        let cancel = Arc::new(CancelToken::new());
        core.generation += 1;
        let generation = core.generation;

        let worker = {
            let controller = self.clone();
            let log = core.log.clone();
            let cancel = cancel.clone();
            let options = settings.options();
            move || {
                let sink = controller.shared.sink.clone();
                let started = Instant::now();
                let run = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    PlaybackSession::new(&log, options, sink.as_ref(), &cancel)
                        .run(|pass| controller.on_pass(pass))
                }));
                let report = run.unwrap_or_else(|_| {
                    tracing::error!("Playback worker panicked; returning to idle");
                    PlaybackReport {
                        passes: 0,
                        events_completed: 0,
                        total_events: log.len(),
                        cancelled: true,
                        elapsed: started.elapsed(),
                    }
                });
                controller.finish_playback(generation, report);
            }
        };
        thread::Builder::new()
            .name("playback".into())
            .spawn(worker)
            .map_err(InputRecError::from)
            .context("Failed to start playback worker")?;

        core.playback = Some(ActivePlayback { cancel, generation });
        self.set_state(&mut core, SessionState::Playing);

        Ok(format!(
            "Playing back at {}x speed... Press {} to stop.",
            settings.speed(),
            core.hotkeys.play.label()
        ))
    }

    /// Write the current log to a recording file
    pub fn save(&self, path: &Path) -> Outcome {
        let result = self.try_save(path);
        self.report(result)
    }

    fn try_save(&self, path: &Path) -> Result<String> {
        let log = {
            let core = self.core();
            if core.state.is_recording() {
                return Err(InputRecError::AlreadyActive(core.state));
            }
            if core.log.is_empty() {
                return Err(InputRecError::EmptyLog);
            }
            core.log.clone()
        };

        log.save_to_file(path)?;
        tracing::info!("Saved {} events to {:?}", log.len(), path);
        Ok(format!("Recording saved to {}", path.display()))
    }

    /// Replace the log with a recording file; the log is untouched on failure
    pub fn load(&self, path: &Path) -> Outcome {
        let result = self.try_load(path);
        self.report(result)
    }

    fn try_load(&self, path: &Path) -> Result<String> {
        if !self.state().is_idle() {
            return Err(InputRecError::AlreadyActive(self.state()));
        }

        let log = EventLog::load_from_file(path)?;

        let mut core = self.core();
        // The state may have moved while the file was read
        if !core.state.is_idle() {
            return Err(InputRecError::AlreadyActive(core.state));
        }
        let count = log.len();
        core.log = Arc::new(log);
        self.publish(StatusEvent::LogReplaced { event_count: count });

        tracing::info!("Loaded {} events from {:?}", count, path);
        Ok(format!("Loaded {} events from {}", count, path.display()))
    }

    /// Rebind an action and persist the bindings
    ///
    /// A failure to write the settings file is logged; the new binding stays
    /// active for this run.
    pub fn set_hotkey(&self, action: HotkeyAction, hotkey: Hotkey) -> Outcome {
        let settings = {
            let mut core = self.core();
            core.hotkeys.set(action, hotkey.clone());
            core.hotkeys.clone()
        };

        if let Some(listener) = &self.shared.listener {
            listener.set_bindings(settings.bindings());
        }
        if let Some(path) = &self.shared.settings_path {
            if let Err(e) = settings.save_to(path) {
                tracing::warn!("Failed to persist hotkey settings: {}", e);
            }
        }

        self.publish(StatusEvent::HotkeyChanged {
            action,
            hotkey: hotkey.clone(),
        });
        self.report(Ok(format!("{} hotkey set to {}", action, hotkey.label())))
    }

    /// Route the next key combination to `action` instead of the bindings
    pub fn begin_hotkey_capture(&self, action: HotkeyAction) -> Outcome {
        match &self.shared.listener {
            Some(listener) => {
                listener.begin_capture(action);
                self.report(Ok(format!("Press the new {} hotkey...", action)))
            }
            None => self.report(Err(InputRecError::Backend(
                "No global hotkey listener is running".into(),
            ))),
        }
    }

    pub fn cancel_hotkey_capture(&self) {
        if let Some(listener) = &self.shared.listener {
            listener.cancel_capture();
        }
    }

    /// Force `Idle` from any state, cancelling the active session
    ///
    /// Safe to call from any thread, including while another thread is
    /// blocked in a controller call that is about to release the lock.
    pub fn emergency_stop(&self) -> Outcome {
        let mut core = self.core();
        let message = match core.state {
            SessionState::Idle => "Emergency stop: nothing was running.".to_string(),
            SessionState::Recording => {
                let summary = self.finish_recording(&mut core);
                format!("EMERGENCY STOPPED! {}", summary)
            }
            SessionState::Playing => {
                self.cancel_playback(&mut core);
                "EMERGENCY STOPPED!".to_string()
            }
        };
        drop(core);
        tracing::warn!("Emergency stop requested");
        self.report(Ok(message))
    }

    /// Record hotkey: start recording when idle, stop it when recording
    pub fn toggle_record(&self) -> Outcome {
        match self.state() {
            SessionState::Recording => self.stop_active(),
            _ => self.start_recording(),
        }
    }

    /// Play hotkey: start with the last playback settings, stop when playing
    pub fn toggle_play(&self) -> Outcome {
        match self.state() {
            SessionState::Playing => self.stop_active(),
            _ => {
                let settings = self.playback_settings();
                self.start_playback(settings.speed() as i64, settings.loop_playback)
            }
        }
    }

    // ==================== Internals ====================

    fn finish_recording(&self, core: &mut Core) -> String {
        let log = core
            .capture
            .take()
            .and_then(|mut capture| capture.stop())
            .unwrap_or_default();
        let count = log.len();
        core.log = Arc::new(log);
        self.set_state(core, SessionState::Idle);
        self.publish(StatusEvent::LogReplaced { event_count: count });
        format!("Recording stopped. {} events captured.", count)
    }

    fn cancel_playback(&self, core: &mut Core) {
        if let Some(playback) = core.playback.take() {
            playback.cancel.cancel();
        }
        self.set_state(core, SessionState::Idle);
    }

    fn on_pass(&self, pass: u32) {
        self.publish(StatusEvent::PlaybackPass(pass));
        if pass > 1 {
            self.publish(StatusEvent::Outcome(Outcome::ok(format!(
                "Looping playback... Loop #{}",
                pass
            ))));
        }
    }

    fn finish_playback(&self, generation: u64, report: PlaybackReport) {
        // Replayed keys echo through the global hook; forget any left held
        if let Some(listener) = &self.shared.listener {
            listener.clear_held_keys();
        }

        let mut core = self.core();
        let current = core
            .playback
            .as_ref()
            .is_some_and(|playback| playback.generation == generation);
        if current {
            core.playback = None;
            self.set_state(&mut core, SessionState::Idle);
        }
        drop(core);

        tracing::info!(
            "Playback run {} ended after {:.2?}: {}",
            generation,
            report.elapsed,
            report.summary()
        );
        self.publish(StatusEvent::PlaybackFinished(report));
        self.publish(StatusEvent::Outcome(Outcome::ok(report.summary())));
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core();
        f.debug_struct("SessionController")
            .field("state", &core.state)
            .field("events", &core.log.len())
            .field("generation", &core.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockInputSink;
    use crate::error::ErrorKind;
    use crate::types::{Event, TimedEvent};
    use std::time::{Duration, Instant};

    fn quiet_sink() -> Arc<dyn InputSink> {
        let mut sink = MockInputSink::new();
        sink.expect_move_to().returning(|_, _| Ok(()));
        sink.expect_button().returning(|_, _| Ok(()));
        sink.expect_scroll().returning(|_, _| Ok(()));
        sink.expect_key().returning(|_, _| Ok(()));
        Arc::new(sink)
    }

    fn controller() -> (SessionController, InputHub, StatusBridge) {
        let hub = InputHub::new();
        let (controller, bridge) = SessionController::new(ControllerConfig {
            hub: hub.clone(),
            sink: quiet_sink(),
            hotkeys: HotkeySettings::default(),
            settings_path: None,
            listener: None,
        });
        (controller, hub, bridge)
    }

    fn wait_for_idle(controller: &SessionController) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !controller.state().is_idle() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn record_moves(controller: &SessionController, hub: &InputHub, n: i32) {
        assert!(!controller.start_recording().is_error());
        for i in 0..n {
            hub.dispatch(&Event::Move { x: i, y: i });
        }
        assert!(!controller.stop_active().is_error());
    }

    #[test]
    fn test_record_stop_cycle() {
        let (controller, hub, bridge) = controller();
        record_moves(&controller, &hub, 3);

        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(controller.event_count(), 3);

        let events = bridge.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, StatusEvent::StateChanged(SessionState::Recording))));
        assert!(events
            .iter()
            .any(|e| matches!(e, StatusEvent::LogReplaced { event_count: 3 })));
    }

    #[test]
    fn test_second_recording_resets_log() {
        let (controller, hub, _bridge) = controller();
        record_moves(&controller, &hub, 3);
        record_moves(&controller, &hub, 1);
        assert_eq!(controller.event_count(), 1);
    }

    #[test]
    fn test_start_recording_twice_is_rejected() {
        let (controller, _hub, _bridge) = controller();
        controller.start_recording();
        let outcome = controller.start_recording();
        assert_eq!(outcome.error, Some(ErrorKind::AlreadyActive));
        assert_eq!(controller.state(), SessionState::Recording);
    }

    #[test]
    fn test_playback_on_empty_log() {
        let (controller, _hub, _bridge) = controller();
        let outcome = controller.start_playback(1, false);
        assert_eq!(outcome.error, Some(ErrorKind::EmptyLog));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_playback_runs_and_returns_to_idle() {
        let (controller, hub, bridge) = controller();
        record_moves(&controller, &hub, 2);
        bridge.drain();

        let outcome = controller.start_playback(10, false);
        assert!(!outcome.is_error(), "{}", outcome.message);
        wait_for_idle(&controller);
        assert_eq!(controller.state(), SessionState::Idle);

        let report = std::iter::from_fn(|| bridge.recv_timeout(Duration::from_secs(2)))
            .find_map(|e| match e {
                StatusEvent::PlaybackFinished(report) => Some(report),
                _ => None,
            })
            .expect("playback finished event");
        assert!(!report.cancelled);
        assert_eq!(report.events_completed, 2);
    }

    #[test]
    fn test_panicking_worker_returns_to_idle() {
        use crate::types::{ButtonAction, KeySymbol, MouseButton};

        struct PanickingSink;
        impl InputSink for PanickingSink {
            fn move_to(&self, _: i32, _: i32) -> Result<()> {
                panic!("sink exploded")
            }
            fn button(&self, _: MouseButton, _: ButtonAction) -> Result<()> {
                Ok(())
            }
            fn scroll(&self, _: i32, _: i32) -> Result<()> {
                Ok(())
            }
            fn key(&self, _: KeySymbol, _: ButtonAction) -> Result<()> {
                Ok(())
            }
        }

        let (controller, bridge) = SessionController::new(ControllerConfig {
            hub: InputHub::new(),
            sink: Arc::new(PanickingSink),
            hotkeys: HotkeySettings::default(),
            settings_path: None,
            listener: None,
        });
        controller.core().log = Arc::new(
            EventLog::from_events(vec![TimedEvent::new(0.0, Event::Move { x: 0, y: 0 })]).unwrap(),
        );

        assert!(!controller.start_playback(1, false).is_error());
        wait_for_idle(&controller);
        assert_eq!(controller.state(), SessionState::Idle);

        let report = std::iter::from_fn(|| bridge.recv_timeout(Duration::from_secs(2)))
            .find_map(|e| match e {
                StatusEvent::PlaybackFinished(report) => Some(report),
                _ => None,
            })
            .expect("playback finished event");
        assert!(report.cancelled);
        assert_eq!(report.total_events, 1);

        // The controller is usable again
        assert!(!controller.start_recording().is_error());
    }

    #[test]
    fn test_recording_rejected_while_playing() {
        let (controller, _hub, _bridge) = controller();
        let log = EventLog::from_events(vec![
            TimedEvent::new(0.0, Event::Move { x: 0, y: 0 }),
            TimedEvent::new(30.0, Event::Move { x: 1, y: 1 }),
        ])
        .unwrap();
        controller.core().log = Arc::new(log);

        controller.start_playback(1, true);
        assert_eq!(controller.state(), SessionState::Playing);

        let outcome = controller.start_recording();
        assert_eq!(outcome.error, Some(ErrorKind::AlreadyActive));
        assert_eq!(controller.state(), SessionState::Playing);

        controller.stop_active();
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_stale_worker_does_not_reset_new_run() {
        let (controller, _hub, _bridge) = controller();
        let log = EventLog::from_events(vec![
            TimedEvent::new(0.0, Event::Move { x: 0, y: 0 }),
            TimedEvent::new(30.0, Event::Move { x: 1, y: 1 }),
        ])
        .unwrap();
        controller.core().log = Arc::new(log);

        controller.start_playback(1, false);
        controller.stop_active();
        controller.start_playback(1, false);
        let generation = controller.core().generation;

        // Completion of the first run arrives late
        controller.finish_playback(
            generation - 1,
            PlaybackReport {
                passes: 1,
                events_completed: 1,
                total_events: 2,
                cancelled: true,
                elapsed: Duration::ZERO,
            },
        );
        assert_eq!(controller.state(), SessionState::Playing);
        controller.emergency_stop();
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_emergency_stop_from_idle() {
        let (controller, _hub, _bridge) = controller();
        let outcome = controller.emergency_stop();
        assert!(!outcome.is_error());
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_toggle_record() {
        let (controller, _hub, _bridge) = controller();
        controller.toggle_record();
        assert_eq!(controller.state(), SessionState::Recording);
        controller.toggle_record();
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_save_rules() {
        let (controller, _hub, _bridge) = controller();
        let path = std::env::temp_dir().join("inputrec-controller-unused.rec");

        assert_eq!(controller.save(&path).error, Some(ErrorKind::EmptyLog));

        controller.start_recording();
        assert_eq!(controller.save(&path).error, Some(ErrorKind::AlreadyActive));
        controller.stop_active();
    }

    #[test]
    fn test_set_hotkey_updates_map() {
        let (controller, _hub, _bridge) = controller();
        let hotkey: Hotkey = "ctrl+r".parse().unwrap();
        let outcome = controller.set_hotkey(HotkeyAction::Record, hotkey.clone());
        assert!(!outcome.is_error());
        assert_eq!(controller.hotkeys().record, hotkey);
    }

    #[test]
    fn test_hotkey_capture_needs_listener() {
        let (controller, _hub, _bridge) = controller();
        let outcome = controller.begin_hotkey_capture(HotkeyAction::Play);
        assert_eq!(outcome.error, Some(ErrorKind::Backend));
    }
}
