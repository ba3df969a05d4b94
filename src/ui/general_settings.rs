use eframe::egui;

use crate::app::AnnotatorApp;

/// Panel with session tunables and the control reference.
pub fn general_settings_panel(app: &mut AnnotatorApp, ui: &mut egui::Ui) {
    let config = &mut app.editor.config;
    let alpha_changed = ui
        .add(egui::Slider::new(&mut config.overlay_alpha, 0..=255).text("Overlay opacity"))
        .changed();
    ui.add(egui::Slider::new(&mut config.smoothing_kernel, 1..=15).text("Smoothing kernel"));
    ui.add(egui::Slider::new(&mut config.pan_step, 5.0..=200.0).text("Arrow pan step"));
    if alpha_changed {
        app.compositor.invalidate();
    }

    ui.separator();
    ui.label("Controls:");
    ui.label("B / M / C / S: brush, magic wand, component, smoothing");
    ui.label("Left click: add, dilate or remove component");
    ui.label("Shift+click or right click: erase, erode or trim");
    ui.label("Ctrl+click: collect magic wand points, release Ctrl to apply");
    ui.label("1-9: select label");
    ui.label("Wheel, + / -, 0: zoom and fit; arrows: pan");
    ui.label("Ctrl+Z: undo, Ctrl+S: save mask");
}

/// Modal window that captures focus for general settings.
pub fn general_settings_modal(app: &mut AnnotatorApp, ctx: &egui::Context) {
    if !app.show_settings {
        return;
    }

    let mut open = app.show_settings;
    egui::Window::new("Settings")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            general_settings_panel(app, ui);
        });
    app.show_settings = open;
}
