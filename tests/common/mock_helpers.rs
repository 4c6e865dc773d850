//! Mock construction helpers

use inputrec_rs::backend::{InputHub, InputSink};
use inputrec_rs::config::HotkeySettings;
use inputrec_rs::session::ControllerConfig;
use inputrec_rs::types::{ButtonAction, MouseButton};
use inputrec_rs::{KeySymbol, Result, SessionController, StatusBridge};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// One synthetic action seen by [`CollectingSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Move(i32, i32),
    Button(MouseButton, ButtonAction),
    Scroll(i32, i32),
    Key(KeySymbol, ButtonAction),
}

/// Sink that records every call with the instant it arrived
#[derive(Debug, Default)]
pub struct CollectingSink {
    calls: Mutex<Vec<(Instant, SinkCall)>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, call: SinkCall) -> Result<()> {
        self.calls.lock().unwrap().push((Instant::now(), call));
        Ok(())
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, SinkCall)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl InputSink for CollectingSink {
    fn move_to(&self, x: i32, y: i32) -> Result<()> {
        self.push(SinkCall::Move(x, y))
    }

    fn button(&self, button: MouseButton, action: ButtonAction) -> Result<()> {
        self.push(SinkCall::Button(button, action))
    }

    fn scroll(&self, dx: i32, dy: i32) -> Result<()> {
        self.push(SinkCall::Scroll(dx, dy))
    }

    fn key(&self, key: KeySymbol, action: ButtonAction) -> Result<()> {
        self.push(SinkCall::Key(key, action))
    }
}

/// Everything a controller test needs
pub struct TestRig {
    pub controller: SessionController,
    pub status: StatusBridge,
    pub hub: InputHub,
    pub sink: Arc<CollectingSink>,
}

/// Controller over a fresh hub and a collecting sink, without persistence
pub fn create_test_rig() -> TestRig {
    create_test_rig_with(HotkeySettings::default(), None)
}

pub fn create_test_rig_with(hotkeys: HotkeySettings, settings_path: Option<PathBuf>) -> TestRig {
    let hub = InputHub::new();
    let sink = CollectingSink::new();
    let (controller, status) = SessionController::new(ControllerConfig {
        hub: hub.clone(),
        sink: sink.clone(),
        hotkeys,
        settings_path,
        listener: None,
    });
    TestRig {
        controller,
        status,
        hub,
        sink,
    }
}
