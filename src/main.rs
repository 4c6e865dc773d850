//! inputrec-rs - Main Entry Point
//!
//! Starts the global input hook, the hotkey dispatcher, and the recorder
//! window.

use inputrec_rs::{
    backend::{InputHub, InputSource, RdevSink, RdevSource},
    config::{self, HotkeySettings},
    frontend::{load_icon, RecorderApp},
    hotkey::{spawn_hotkey_dispatcher, HotkeyListener},
    session::{ControllerConfig, SessionController},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Window icon, looked up next to the crate manifest
const ICON_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/app_icon.png");

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "inputrec.log";

/// Console plus a daily rolling file in the app data directory
///
/// The returned guard flushes the file writer when dropped.
fn init_logging() -> Option<WorkerGuard> {
    let (file_layer, guard) = match config::log_dir() {
        Some(dir) => match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Failed to create log directory {:?}: {}", dir, e);
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,inputrec_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn main() -> eframe::Result<()> {
    let _log_guard = init_logging();

    tracing::info!("Starting inputrec-rs");

    // Load hotkey bindings; a corrupt file falls back to defaults
    let settings_path: Option<PathBuf> = config::settings_path();
    let hotkeys = match &settings_path {
        Some(path) => HotkeySettings::load_or_default_from(path),
        None => HotkeySettings::default(),
    };
    tracing::info!(
        "Hotkeys: record={} play={} emergency_stop={}",
        hotkeys.record,
        hotkeys.play,
        hotkeys.emergency_stop
    );

    // Wire the hub, hotkey listener and controller
    let hub = InputHub::new();
    let (listener, hotkey_rx) = HotkeyListener::new();
    let listener = Arc::new(listener);
    hub.set_key_observer(Some(listener.clone()));

    let (controller, status) = SessionController::new(ControllerConfig {
        hub: hub.clone(),
        sink: Arc::new(RdevSink::new()),
        hotkeys,
        settings_path,
        listener: Some(listener),
    });

    if let Err(e) = spawn_hotkey_dispatcher(hotkey_rx, controller.clone()) {
        tracing::error!("Failed to start hotkey dispatcher: {}", e);
    }

    // Start the global input hook
    let source: Box<dyn InputSource> = Box::new(RdevSource::new());
    let source_name = source.name();
    if let Err(e) = source.start(hub) {
        tracing::error!("Failed to start {} input source: {}", source_name, e);
    }

    // Configure eframe options
    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size([440.0, 220.0])
        .with_min_inner_size([360.0, 200.0])
        .with_title("Macro Recorder");

    match load_icon(Path::new(ICON_PATH)) {
        Ok(icon) => viewport = viewport.with_icon(Arc::new(icon)),
        Err(e) => tracing::warn!("{}; continuing without a window icon", e),
    }

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let result = eframe::run_native(
        "inputrec-rs",
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(RecorderApp::new(cc, controller, status)))
        }),
    );

    tracing::info!("Shutting down...");
    result
}
