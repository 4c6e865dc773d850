//! Status bar panel: bottom bar showing session state, log size, and the
//! latest status line.

use egui::{Color32, RichText, Ui};

use crate::session::SessionState;

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub state: SessionState,
    pub event_count: usize,
    pub loop_pass: Option<u32>,
    pub status_line: &'a str,
    pub status_is_error: bool,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === State dot ===
        let state_color = match ctx.state {
            SessionState::Idle => Color32::GRAY,
            SessionState::Recording => Color32::RED,
            SessionState::Playing => Color32::GREEN,
        };
        ui.colored_label(state_color, "●");
        ui.label(RichText::new(ctx.state.display_name()).small());

        if let (SessionState::Playing, Some(pass)) = (ctx.state, ctx.loop_pass) {
            ui.label(RichText::new(format!("Loop #{}", pass)).small());
        }

        ui.separator();

        ui.label(RichText::new(format!("Events: {}", ctx.event_count)).small());

        ui.separator();

        let color = if ctx.status_is_error {
            Color32::LIGHT_RED
        } else {
            ui.visuals().text_color()
        };
        ui.colored_label(color, RichText::new(ctx.status_line).small());
    });
}
