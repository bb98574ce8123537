use crate::viewer::camera::UiInteractionState;
use crate::viewer::model::start_viewing;
use crate::viewer::session::ViewerSession;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

pub fn ui_system(
    mut contexts: EguiContexts,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut session: ResMut<ViewerSession>,
    mut ui_state: ResMut<UiInteractionState>,
    mut status_error: Local<Option<String>>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    egui::TopBottomPanel::top("roomview_top_bar").show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            ui.heading("roomview");
            ui.separator();
            match status_error.as_deref() {
                Some(err) => ui.colored_label(egui::Color32::LIGHT_RED, err),
                None => ui.label(session.model.status_line()),
            };
            ui.separator();
            ui.small("LMB rotate, RMB pan, wheel zoom.");
        });
    });

    if session.model.is_idle() {
        let mut submit = false;
        egui::Window::new("Model")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("glTF url or asset path:");
                let response = ui.text_edit_singleline(&mut session.url_input);
                let entered =
                    response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
                submit = ui.button("Use model").clicked() || entered;
            });

        if submit {
            let url = session.url_input.clone();
            *status_error = match start_viewing(&url, &mut commands, &asset_server, &mut session) {
                Ok(_) => None,
                Err(err) => Some(err.to_string()),
            };
        }
    }

    ui_state.wants_pointer_input = ctx.wants_pointer_input();
}
