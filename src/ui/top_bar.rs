use eframe::egui;

use crate::app::AnnotatorApp;
use crate::brush_engine::brush::{MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::editor::state::Tool;

const TOOLS: [(Tool, &str); 4] = [
    (Tool::Brush, "🖌 Brush (B)"),
    (Tool::MagicWand, "✨ Magic wand (M)"),
    (Tool::ConnectedComponent, "🧩 Component (C)"),
    (Tool::Smoothing, "◌ Smoothing (S)"),
];

pub fn top_bar(app: &mut AnnotatorApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("file_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label("Image");
            let edit = ui.add(egui::TextEdit::singleline(&mut app.image_path_input).desired_width(260.0));
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Open").clicked() || submitted {
                app.open_image_from_input();
            }

            ui.separator();
            ui.label("Mask");
            ui.add(egui::TextEdit::singleline(&mut app.mask_path_input).desired_width(200.0));
            let has_image = app.editor.document().is_some();
            if ui.add_enabled(has_image, egui::Button::new("Load")).clicked() {
                app.load_mask_from_input();
            }
            if ui.add_enabled(has_image, egui::Button::new("Save")).clicked() {
                app.save_mask();
            }

            ui.separator();
            if ui.button("Settings").clicked() {
                app.show_settings = true;
                ctx.request_repaint();
            }
        });
    });

    egui::TopBottomPanel::top("quick_settings").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let has_image = app.editor.document().is_some();
            let active = app.editor.tool();
            for (tool, label) in TOOLS {
                let enabled = has_image && (tool != Tool::MagicWand || app.editor.oracle_ready());
                let button = egui::SelectableLabel::new(active == tool, label);
                if ui.add_enabled(enabled, button).clicked() {
                    app.editor.select_tool(tool);
                }
            }

            ui.separator();
            let mut size = app.editor.brush().size;
            let changed = ui
                .add(egui::Slider::new(&mut size, MIN_BRUSH_SIZE..=MAX_BRUSH_SIZE).text("Brush size"))
                .changed();
            if changed {
                app.editor.set_brush_size(size);
            }

            let mut only_on_empty = app.editor.only_on_empty();
            if ui.checkbox(&mut only_on_empty, "Only on empty").changed() {
                app.editor.set_only_on_empty(only_on_empty);
            }

            ui.separator();
            if ui.button("−").clicked() {
                app.editor.zoom_out();
            }
            if ui.button("+").clicked() {
                app.editor.zoom_in();
            }
            if ui.button("Fit").clicked() {
                app.editor.reset_view();
            }
            let can_undo = app.editor.undo_len() > 0;
            if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                app.editor.undo();
            }
        });
    });
}
