//! Dialog trait for the recorder's modal windows
//!
//! A dialog owns a state struct, renders into an `egui::Window`, and hands
//! back a [`DialogAction`] for the app to act on. The app never mutates the
//! engine from inside a dialog.

pub mod hotkeys;

pub use hotkeys::{HotkeyDialog, HotkeyDialogAction, HotkeyDialogState};

use egui::{Align2, Context, Ui};

/// What the app should do after a dialog rendered
#[derive(Debug, Clone, Default)]
pub enum DialogAction<A> {
    /// Keep the dialog open, no action needed
    #[default]
    None,
    /// Close the dialog without performing any action
    Close,
    /// Keep the dialog open but perform the specified action
    Action(A),
}

/// Per-dialog state, reset whenever the dialog closes
pub trait DialogState: Default {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A modal window with typed state, action, and render context
pub trait Dialog {
    type State: DialogState;
    type Action;
    type Context<'a>;

    fn title(state: &Self::State) -> &'static str;

    /// Fixed width of the dialog window
    fn width() -> f32 {
        320.0
    }

    fn render(
        state: &mut Self::State,
        ctx: Self::Context<'_>,
        ui: &mut Ui,
    ) -> DialogAction<Self::Action>;
}

/// Show a dialog centered over the main window
///
/// Returns `Some(action)` if the dialog produced one. Closing (through the
/// dialog or the window's close button) resets the state.
pub fn show_dialog<D: Dialog>(
    ctx: &Context,
    is_open: &mut bool,
    state: &mut D::State,
    dialog_ctx: D::Context<'_>,
) -> Option<D::Action> {
    if !*is_open {
        return None;
    }

    let mut action_result = None;
    let mut should_close = false;
    let mut window_open = true;

    egui::Window::new(D::title(state))
        .open(&mut window_open)
        .collapsible(false)
        .resizable(false)
        .default_width(D::width())
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| match D::render(state, dialog_ctx, ui) {
            DialogAction::None => {}
            DialogAction::Close => should_close = true,
            DialogAction::Action(a) => action_result = Some(a),
        });

    if should_close || !window_open {
        *is_open = false;
        state.reset();
    }

    action_result
}
