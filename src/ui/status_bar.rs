use eframe::egui;

use crate::app::AnnotatorApp;

pub fn status_bar(app: &mut AnnotatorApp, ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let oracle = if app.editor.document().is_none() {
                "no image"
            } else if app.editor.oracle_ready() {
                "oracle ready"
            } else if app.editor.oracle().last_error().is_some() {
                "oracle failed"
            } else {
                "oracle loading…"
            };
            ui.label(oracle);
            ui.separator();

            ui.label(format!("Tool: {}", app.editor.tool().label()));
            ui.label(format!("Zoom: {:.0}%", app.editor.viewport().zoom() * 100.0));

            if let (Some(cursor), Some(raster)) = (app.editor.cursor(), app.editor.raster()) {
                let (ix, iy) = app.editor.viewport().screen_to_image(cursor);
                if let Some(id) = raster.get_signed(ix, iy) {
                    ui.separator();
                    ui.label(format!("({ix}, {iy}) label {id}"));
                }
            }

            let message = app.status.clone().or_else(|| app.editor.last_error().map(str::to_string));
            if let Some(message) = message {
                ui.separator();
                ui.colored_label(egui::Color32::LIGHT_RED, message);
            }
        });
    });
}
