//! Hotkey settings dialog
//!
//! One row per bindable action. Clicking a binding asks the controller to
//! capture the next global key combination for it; the result arrives on
//! the status bridge.

use egui::{RichText, Ui};

use crate::config::HotkeySettings;
use crate::frontend::dialogs::{Dialog, DialogAction, DialogState};
use crate::hotkey::HotkeyAction;

/// State for the hotkey dialog
#[derive(Debug, Clone, Default)]
pub struct HotkeyDialogState {
    /// Action whose new combination is being captured
    pub capturing: Option<HotkeyAction>,
}

impl DialogState for HotkeyDialogState {}

/// Actions produced by the hotkey dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyDialogAction {
    /// Start capturing a new combination for an action
    BeginCapture(HotkeyAction),
    /// Abandon the capture in progress
    CancelCapture,
    /// Restore the built-in binding for an action
    ResetToDefault(HotkeyAction),
}

/// The hotkey dialog
pub struct HotkeyDialog;

impl Dialog for HotkeyDialog {
    type State = HotkeyDialogState;
    type Action = HotkeyDialogAction;
    type Context<'a> = &'a HotkeySettings;

    fn title(_state: &Self::State) -> &'static str {
        "Hotkey Settings"
    }

    fn render(
        state: &mut Self::State,
        hotkeys: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action> {
        let mut action = DialogAction::None;

        egui::Grid::new("hotkey_grid")
            .num_columns(3)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                for target in HotkeyAction::ALL {
                    ui.label(format!("{}:", target));

                    let text = if state.capturing == Some(target) {
                        RichText::new("Press a key...").italics()
                    } else {
                        RichText::new(hotkeys.get(target).label())
                    };
                    let enabled = state.capturing.is_none();
                    if ui
                        .add_enabled(enabled, egui::Button::new(text).min_size([140.0, 0.0].into()))
                        .clicked()
                    {
                        state.capturing = Some(target);
                        action = DialogAction::Action(HotkeyDialogAction::BeginCapture(target));
                    }

                    let is_default = *hotkeys.get(target) == HotkeySettings::default_for(target);
                    if ui
                        .add_enabled(enabled && !is_default, egui::Button::new("Default"))
                        .clicked()
                    {
                        action = DialogAction::Action(HotkeyDialogAction::ResetToDefault(target));
                    }
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        ui.separator();

        ui.horizontal(|ui| {
            if state.capturing.is_some() {
                if ui.button("Cancel").clicked() {
                    state.capturing = None;
                    action = DialogAction::Action(HotkeyDialogAction::CancelCapture);
                }
            } else if ui.button("Close").clicked() {
                action = DialogAction::Close;
            }
        });

        action
    }
}
