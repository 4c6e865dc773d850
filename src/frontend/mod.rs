//! Frontend module for the recorder window
//!
//! A small eframe/egui window over the [`SessionController`] control
//! surface:
//!
//! - Record / Play / Stop buttons, enabled according to the session state
//! - Speed (1x-10x) and loop controls, read when playback starts
//! - Save / Load through native file dialogs
//! - A hotkey dialog for rebinding the global hotkeys
//! - A status bar fed by the engine's status bridge
//!
//! The UI never mutates engine state directly. Every button maps to one
//! controller call, and engine-side changes (including hotkey-triggered
//! ones) arrive through [`StatusBridge::drain`].

pub mod dialogs;
pub mod status_bar;
pub mod topics;

pub use topics::Topics;

use std::path::Path;
use std::time::Duration;

use egui::{Color32, RichText};

use crate::bridge::StatusBridge;
use crate::config::{HotkeySettings, PlaybackSettings, RECORDING_FILE_EXTENSION};
use crate::error::{InputRecError, Result};
use crate::session::player::{MAX_SPEED, MIN_SPEED};
use crate::session::SessionController;
use dialogs::{show_dialog, HotkeyDialog, HotkeyDialogAction, HotkeyDialogState};
use status_bar::{render_status_bar, StatusBarContext};

/// How often the window refreshes while idle, to pick up hotkey-driven changes
const IDLE_REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Decode the window icon
///
/// Any failure is reported as `IconResourceMissing`; the caller runs without
/// an icon.
pub fn load_icon(path: &Path) -> Result<egui::IconData> {
    let missing = |e: &dyn std::fmt::Display| {
        InputRecError::IconResourceMissing(format!("{}: {}", path.display(), e))
    };
    let bytes = std::fs::read(path).map_err(|e| missing(&e))?;
    let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .map_err(|e| missing(&e))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok(egui::IconData {
        rgba: image.into_raw(),
        width,
        height,
    })
}

/// Main application window
pub struct RecorderApp {
    controller: SessionController,
    bridge: StatusBridge,
    topics: Topics,

    /// Speed slider value
    speed: u32,
    /// Loop checkbox value
    loop_playback: bool,

    hotkey_dialog_open: bool,
    hotkey_dialog_state: HotkeyDialogState,
}

impl RecorderApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        controller: SessionController,
        bridge: StatusBridge,
    ) -> Self {
        let topics = Topics::new(controller.hotkeys());
        let settings = controller.playback_settings();
        Self {
            controller,
            bridge,
            topics,
            speed: settings.speed(),
            loop_playback: settings.loop_playback,
            hotkey_dialog_open: false,
            hotkey_dialog_state: HotkeyDialogState::default(),
        }
    }

    /// Fold pending engine status into `topics`
    fn process_status_messages(&mut self) -> bool {
        let messages = self.bridge.drain();
        let had_messages = !messages.is_empty();
        for msg in messages {
            self.topics.apply(msg);
        }

        // The channel may drop under load; the controller is authoritative
        self.topics.state = self.controller.state();
        self.topics.event_count = self.controller.event_count();

        if std::mem::take(&mut self.topics.capture_ended) {
            self.hotkey_dialog_state.capturing = None;
        }
        had_messages
    }

    fn sync_playback_settings(&self) {
        self.controller
            .set_playback_settings(PlaybackSettings::new(self.speed as i64, self.loop_playback));
    }

    fn save_recording(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Save Recording")
            .add_filter("Recording Files", &[RECORDING_FILE_EXTENSION])
            .set_file_name(format!("recording.{}", RECORDING_FILE_EXTENSION))
            .save_file()
        {
            self.controller.save(&path);
        }
    }

    fn load_recording(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Load Recording")
            .add_filter("Recording Files", &[RECORDING_FILE_EXTENSION])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.controller.load(&path);
        }
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.topics.can_record(), egui::Button::new("⏺ Record"))
                .clicked()
            {
                self.controller.start_recording();
            }
            if ui
                .add_enabled(self.topics.can_play(), egui::Button::new("▶ Play"))
                .clicked()
            {
                self.controller
                    .start_playback(self.speed as i64, self.loop_playback);
            }
            if ui
                .add_enabled(self.topics.can_stop(), egui::Button::new("⏹ Stop"))
                .clicked()
            {
                self.controller.stop_active();
            }
        });

        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label("Speed:");
            let speed_changed = ui
                .add(egui::Slider::new(&mut self.speed, MIN_SPEED..=MAX_SPEED).suffix("x"))
                .changed();
            let loop_changed = ui.checkbox(&mut self.loop_playback, "Loop").changed();
            if speed_changed || loop_changed {
                self.sync_playback_settings();
            }
        });

        ui.add_space(6.0);

        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.topics.can_save(), egui::Button::new("Save"))
                .clicked()
            {
                self.save_recording();
            }
            if ui
                .add_enabled(self.topics.can_load(), egui::Button::new("Load"))
                .clicked()
            {
                self.load_recording();
            }
            if ui.button("Hotkeys").clicked() {
                self.hotkey_dialog_open = true;
            }
        });

        ui.add_space(6.0);
        ui.label(
            RichText::new(self.topics.hotkey_summary())
                .small()
                .color(Color32::GRAY),
        );
    }

    fn render_hotkey_dialog(&mut self, ctx: &egui::Context) {
        let was_open = self.hotkey_dialog_open;
        let hotkeys = self.topics.hotkeys.clone();

        if let Some(action) = show_dialog::<HotkeyDialog>(
            ctx,
            &mut self.hotkey_dialog_open,
            &mut self.hotkey_dialog_state,
            &hotkeys,
        ) {
            match action {
                HotkeyDialogAction::BeginCapture(target) => {
                    if self.controller.begin_hotkey_capture(target).is_error() {
                        self.hotkey_dialog_state.capturing = None;
                    }
                }
                HotkeyDialogAction::CancelCapture => {
                    self.controller.cancel_hotkey_capture();
                }
                HotkeyDialogAction::ResetToDefault(target) => {
                    self.controller
                        .set_hotkey(target, HotkeySettings::default_for(target));
                }
            }
        }

        // Closing mid-capture must not leave the listener swallowing keys
        if was_open && !self.hotkey_dialog_open {
            self.controller.cancel_hotkey_capture();
        }
    }
}

impl eframe::App for RecorderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.process_status_messages() || !self.topics.state.is_idle() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(IDLE_REPAINT_INTERVAL);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            render_status_bar(
                ui,
                &StatusBarContext {
                    state: self.topics.state,
                    event_count: self.topics.event_count,
                    loop_pass: self.topics.loop_pass,
                    status_line: &self.topics.status_line,
                    status_is_error: self.topics.status_is_error,
                },
            );
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_controls(ui);
        });

        self.render_hotkey_dialog(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.cancel_hotkey_capture();
        if !self.controller.state().is_idle() {
            self.controller.emergency_stop();
        }
    }
}
