use eframe::egui::{self, Color32};

use crate::app::AnnotatorApp;
use crate::canvas::labels::MAX_LABELS;

/// Sidebar that manages the label list.
pub fn labels_panel(app: &mut AnnotatorApp, ctx: &egui::Context) {
    egui::SidePanel::right("labels").default_width(200.0).show(ctx, |ui| {
        ui.heading("Labels");
        let has_image = app.editor.document().is_some();
        let full = app.editor.registry().is_full();
        ui.horizontal(|ui| {
            let edit = ui.add(
                egui::TextEdit::singleline(&mut app.label_name_input)
                    .hint_text("Label name")
                    .desired_width(110.0),
            );
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let can_add = has_image && !full && !app.label_name_input.trim().is_empty();
            if ui.add_enabled(can_add, egui::Button::new("Add")).clicked() || (submitted && can_add) {
                if app.editor.add_label(app.label_name_input.as_str()).is_some() {
                    app.label_name_input.clear();
                }
            }
        });
        ui.label(format!("{}/{} labels", app.editor.registry().len(), MAX_LABELS));
        ui.separator();

        let active = app.editor.registry().active();
        let mut select = None;
        let mut clear = None;
        for (id, meta) in app.editor.registry().iter() {
            ui.horizontal(|ui| {
                let [r, g, b] = meta.color;
                let (swatch, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                ui.painter().rect_filled(swatch, 2.0, Color32::from_rgb(r, g, b));

                let text = format!("{id}: {}", meta.name);
                if ui.selectable_label(active == Some(id), text).clicked() {
                    select = Some(id);
                }
                if ui.small_button("X").on_hover_text("Clear this label").clicked() {
                    clear = Some(id);
                }
            });
        }

        if let Some(id) = select {
            app.editor.set_active_label(Some(id));
        }
        if let Some(id) = clear {
            app.editor.clear_label(id);
        }

        ui.separator();
        let has_labels = !app.editor.registry().is_empty();
        if ui.add_enabled(active.is_some(), egui::Button::new("Clear active")).clicked() {
            app.editor.clear_active_label();
        }
        if ui.add_enabled(has_labels, egui::Button::new("Clear all")).clicked() {
            app.editor.clear_all_labels();
        }
    });
}
