//! Integration tests for the session controller lifecycle
//!
//! These drive the controller the way the UI and hotkey layer do: input
//! arrives through the hub, playback goes to a collecting sink.

mod common;

use common::builders::EventLogBuilder;
use common::mock_helpers::{create_test_rig, SinkCall, TestRig};
use common::wait_for_state;
use inputrec_rs::backend::{InputHub, InputSink};
use inputrec_rs::bridge::StatusEvent;
use inputrec_rs::hotkey::{spawn_hotkey_dispatcher, HotkeyListener};
use inputrec_rs::session::{ControllerConfig, PlaybackReport};
use inputrec_rs::types::{ButtonAction, MouseButton, NamedKey};
use inputrec_rs::{ErrorKind, Event, HotkeySettings, KeySymbol, SessionController, SessionState};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Load a log into the controller through a file, as the UI would
fn load_log(rig: &TestRig, log: &inputrec_rs::EventLog) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.rec");
    log.save_to_file(&path).unwrap();
    let outcome = rig.controller.load(&path);
    assert!(!outcome.is_error(), "{}", outcome.message);
}

fn wait_for_report(rig: &TestRig) -> PlaybackReport {
    std::iter::from_fn(|| rig.status.recv_timeout(common::test_timeout()))
        .find_map(|event| match event {
            StatusEvent::PlaybackFinished(report) => Some(report),
            _ => None,
        })
        .expect("playback finished")
}

#[test]
fn test_record_then_replay_reproduces_actions() {
    let rig = create_test_rig();

    assert!(!rig.controller.start_recording().is_error());
    rig.hub.dispatch(&Event::Move { x: 10, y: 20 });
    rig.hub.dispatch(&Event::Click {
        x: 10,
        y: 20,
        button: MouseButton::Left,
        action: ButtonAction::Press,
    });
    rig.hub.dispatch(&Event::KeyPress {
        key: KeySymbol::Char('h'),
    });
    rig.hub.dispatch(&Event::Scroll {
        x: 10,
        y: 20,
        dx: 0,
        dy: 3,
    });
    let outcome = rig.controller.stop_active();
    assert_eq!(outcome.message, "Recording stopped. 4 events captured.");
    assert_eq!(rig.controller.event_count(), 4);

    let outcome = rig.controller.start_playback(10, false);
    assert!(!outcome.is_error(), "{}", outcome.message);
    wait_for_state(&rig.controller, SessionState::Idle);
    let report = wait_for_report(&rig);
    assert!(!report.cancelled);
    assert_eq!(report.passes, 1);

    assert_eq!(
        rig.sink.calls(),
        vec![
            SinkCall::Move(10, 20),
            SinkCall::Move(10, 20),
            SinkCall::Button(MouseButton::Left, ButtonAction::Press),
            SinkCall::Key(KeySymbol::Char('h'), ButtonAction::Press),
            SinkCall::Move(10, 20),
            SinkCall::Scroll(0, 3),
        ]
    );
}

#[test]
fn test_recording_rejected_while_playing() {
    let rig = create_test_rig();
    load_log(&rig, &EventLogBuilder::new().moves(1).at(30.0).moves(1).build());

    rig.controller.start_playback(1, false);
    assert_eq!(rig.controller.state(), SessionState::Playing);

    let outcome = rig.controller.start_recording();
    assert_eq!(outcome.error, Some(ErrorKind::AlreadyActive));
    assert_eq!(rig.controller.state(), SessionState::Playing);
    assert!(!rig.hub.is_capturing());

    let outcome = rig.controller.start_playback(1, false);
    assert_eq!(outcome.error, Some(ErrorKind::AlreadyActive));

    rig.controller.stop_active();
    assert_eq!(rig.controller.state(), SessionState::Idle);
}

#[test]
fn test_playback_rejected_while_recording() {
    let rig = create_test_rig();
    rig.controller.start_recording();

    let outcome = rig.controller.start_playback(1, false);
    assert_eq!(outcome.error, Some(ErrorKind::AlreadyActive));
    assert_eq!(rig.controller.state(), SessionState::Recording);
}

#[test]
fn test_empty_log_playback_is_rejected() {
    let rig = create_test_rig();
    let outcome = rig.controller.start_playback(3, true);
    assert_eq!(outcome.error, Some(ErrorKind::EmptyLog));
    assert_eq!(rig.controller.state(), SessionState::Idle);
    assert!(rig.sink.calls().is_empty());
}

#[test]
fn test_cancel_looping_playback_mid_pass() {
    let rig = create_test_rig();
    // Three quick events, then one far in the future
    load_log(
        &rig,
        &EventLogBuilder::new()
            .step(0.001)
            .moves(3)
            .at(60.0)
            .moves(1)
            .build(),
    );

    rig.controller.start_playback(1, true);
    let deadline = std::time::Instant::now() + common::test_timeout();
    while rig.sink.len() < 3 && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(2));
    }

    let outcome = rig.controller.stop_active();
    assert!(!outcome.is_error());
    assert_eq!(rig.controller.state(), SessionState::Idle);

    let report = wait_for_report(&rig);
    assert!(report.cancelled);
    assert_eq!(report.passes, 1);
    assert!(report.events_completed < report.total_events);
    assert_eq!(report.events_completed, 3);
}

#[test]
fn test_emergency_stop_during_recording_keeps_prior_events() {
    let rig = create_test_rig();
    rig.controller.start_recording();
    for i in 0..5 {
        rig.hub.dispatch(&Event::Move { x: i, y: i });
    }

    let outcome = rig.controller.emergency_stop();
    assert!(outcome.message.starts_with("EMERGENCY STOPPED!"));
    assert_eq!(rig.controller.state(), SessionState::Idle);

    for i in 0..5 {
        rig.hub.dispatch(&Event::Move { x: 100 + i, y: 0 });
    }
    let log = rig.controller.log();
    assert_eq!(log.len(), 5);
    assert!(log
        .iter()
        .all(|timed| matches!(timed.event, Event::Move { x, .. } if x < 100)));
}

#[test]
fn test_emergency_stop_races_with_producers() {
    let rig = create_test_rig();
    rig.controller.start_recording();

    let running = Arc::new(AtomicBool::new(true));
    let delivered = Arc::new(AtomicUsize::new(0));
    let producers: Vec<_> = (0..3)
        .map(|id| {
            let hub = rig.hub.clone();
            let running = running.clone();
            let delivered = delivered.clone();
            thread::spawn(move || {
                let mut n = 0;
                while running.load(Ordering::SeqCst) {
                    hub.dispatch(&Event::Move { x: id, y: n });
                    delivered.fetch_add(1, Ordering::SeqCst);
                    n += 1;
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(30));
    let stopper = {
        let controller = rig.controller.clone();
        thread::spawn(move || controller.emergency_stop())
    };
    let outcome = stopper.join().unwrap();
    let delivered_at_stop = delivered.load(Ordering::SeqCst);

    thread::sleep(Duration::from_millis(10));
    running.store(false, Ordering::SeqCst);
    for producer in producers {
        producer.join().unwrap();
    }

    assert!(!outcome.is_error());
    assert_eq!(rig.controller.state(), SessionState::Idle);
    let log = rig.controller.log();
    assert!(!log.is_empty());
    // At most the dispatches in flight at the stop can be counted after it
    assert!(log.len() <= delivered_at_stop + 3);
    assert!(log
        .events()
        .windows(2)
        .all(|pair| pair[0].elapsed <= pair[1].elapsed));
}

#[test]
fn test_emergency_stop_during_playback() {
    let rig = create_test_rig();
    load_log(&rig, &EventLogBuilder::new().moves(1).at(60.0).moves(1).build());

    rig.controller.start_playback(1, false);
    let stopper = {
        let controller = rig.controller.clone();
        thread::spawn(move || controller.emergency_stop())
    };
    let outcome = stopper.join().unwrap();
    assert_eq!(outcome.message, "EMERGENCY STOPPED!");
    assert_eq!(rig.controller.state(), SessionState::Idle);

    let report = wait_for_report(&rig);
    assert!(report.cancelled);
}

#[test]
fn test_save_and_load_rejections() {
    let rig = create_test_rig();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.rec");

    assert_eq!(rig.controller.save(&path).error, Some(ErrorKind::EmptyLog));
    assert!(!path.exists());

    rig.controller.start_recording();
    assert_eq!(rig.controller.load(&path).error, Some(ErrorKind::AlreadyActive));
    rig.controller.stop_active();
}

#[test]
fn test_status_bridge_reports_transitions() {
    let rig = create_test_rig();
    rig.controller.start_recording();
    rig.controller.stop_active();
    rig.controller.stop_active();

    let events = rig.status.drain();
    let states: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StatusEvent::StateChanged(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(states, vec![SessionState::Recording, SessionState::Idle]);

    let messages: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StatusEvent::Outcome(o) => Some(o.message.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(messages.last().map(String::as_str), Some("Nothing to stop."));
}

#[test]
fn test_hotkeys_drive_controller_through_dispatcher() {
    let hub = InputHub::new();
    let (listener, hotkey_rx) = HotkeyListener::new();
    let listener = Arc::new(listener);
    hub.set_key_observer(Some(listener.clone()));

    let sink = common::mock_helpers::CollectingSink::new();
    let (controller, _status) = SessionController::new(ControllerConfig {
        hub: hub.clone(),
        sink,
        hotkeys: HotkeySettings::default(),
        settings_path: None,
        listener: Some(listener),
    });
    spawn_hotkey_dispatcher(hotkey_rx, controller.clone()).unwrap();

    let f9 = KeySymbol::Named(NamedKey::F9);
    hub.dispatch(&Event::KeyPress { key: f9 });
    wait_for_state(&controller, SessionState::Recording);
    hub.dispatch(&Event::KeyRelease { key: f9 });

    hub.dispatch(&Event::Move { x: 1, y: 1 });

    hub.dispatch(&Event::KeyPress { key: f9 });
    wait_for_state(&controller, SessionState::Idle);

    // Hotkey presses are recorded like any other key
    let log = controller.log();
    assert_eq!(log.count_where(|e| matches!(e, Event::Move { .. })), 1);

    // Emergency stop combination from idle keeps the controller idle
    let ctrl = KeySymbol::Named(NamedKey::ControlLeft);
    let shift = KeySymbol::Named(NamedKey::ShiftLeft);
    hub.dispatch(&Event::KeyPress { key: shift });
    hub.dispatch(&Event::KeyPress { key: ctrl });
    hub.dispatch(&Event::KeyPress {
        key: KeySymbol::Char('x'),
    });
    thread::sleep(Duration::from_millis(20));
    assert_eq!(controller.state(), SessionState::Idle);
}

#[test]
fn test_unreachable_timestamp_waits_until_stopped() {
    let rig = create_test_rig();
    load_log(&rig, &EventLogBuilder::new().moves(1).at(1e19).moves(1).build());

    assert!(!rig.controller.start_playback(1, false).is_error());
    thread::sleep(Duration::from_millis(150));
    assert_eq!(rig.controller.state(), SessionState::Playing);
    assert_eq!(rig.sink.len(), 1);

    rig.controller.stop_active();
    assert_eq!(rig.controller.state(), SessionState::Idle);

    let report = wait_for_report(&rig);
    assert!(report.cancelled);
    assert_eq!(report.events_completed, 1);
    assert_eq!(rig.sink.len(), 1);

    assert!(!rig.controller.start_recording().is_error());
    rig.controller.stop_active();
}

/// Replays key events back into the hub, like the OS hook sees them
struct EchoSink {
    hub: InputHub,
}

impl InputSink for EchoSink {
    fn move_to(&self, _x: i32, _y: i32) -> inputrec_rs::Result<()> {
        Ok(())
    }

    fn button(&self, _button: MouseButton, _action: ButtonAction) -> inputrec_rs::Result<()> {
        Ok(())
    }

    fn scroll(&self, _dx: i32, _dy: i32) -> inputrec_rs::Result<()> {
        Ok(())
    }

    fn key(&self, key: KeySymbol, action: ButtonAction) -> inputrec_rs::Result<()> {
        let event = match action {
            ButtonAction::Press => Event::KeyPress { key },
            ButtonAction::Release => Event::KeyRelease { key },
        };
        self.hub.dispatch(&event);
        Ok(())
    }
}

#[test]
fn test_replayed_press_does_not_mask_next_hotkey() {
    let hub = InputHub::new();
    let (listener, hotkey_rx) = HotkeyListener::new();
    let listener = Arc::new(listener);
    hub.set_key_observer(Some(listener.clone()));

    let (controller, status) = SessionController::new(ControllerConfig {
        hub: hub.clone(),
        sink: Arc::new(EchoSink { hub: hub.clone() }),
        hotkeys: HotkeySettings::default(),
        settings_path: None,
        listener: Some(listener),
    });

    let f9 = KeySymbol::Named(NamedKey::F9);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ends_with_f9.rec");
    EventLogBuilder::new()
        .moves(1)
        .event(Event::KeyPress { key: f9 })
        .build()
        .save_to_file(&path)
        .unwrap();
    assert!(!controller.load(&path).is_error());

    controller.start_playback(1, false);
    let finished = std::iter::from_fn(|| status.recv_timeout(common::test_timeout()))
        .any(|event| matches!(event, StatusEvent::PlaybackFinished(_)));
    assert!(finished);
    wait_for_state(&controller, SessionState::Idle);
    while hotkey_rx.try_recv().is_ok() {}

    // The replayed press never saw a release; a real press must still fire
    hub.dispatch(&Event::KeyPress { key: f9 });
    let triggered = hotkey_rx
        .recv_timeout(common::test_timeout())
        .expect("hotkey fired");
    assert!(matches!(
        triggered,
        inputrec_rs::hotkey::HotkeyEvent::Triggered(inputrec_rs::HotkeyAction::Record)
    ));
}
