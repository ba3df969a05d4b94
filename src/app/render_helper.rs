use eframe::egui::{self, Color32, TextureHandle, TextureOptions};
use image::RgbaImage;

use crate::app::AnnotatorApp;
use crate::editor::state::Tool;
use crate::render::compositor::RenderUpdate;
use crate::utils::profiler::ScopeTimer;
use crate::utils::vector::Vec2;

const PROMPT_MARKER_RADIUS: f32 = 4.0;

pub struct CanvasView {
    pub rect: egui::Rect,
    pub response: egui::Response,
}

impl CanvasView {
    /// Screen position to canvas-local coordinates.
    pub fn to_canvas(&self, pos: egui::Pos2) -> Vec2 {
        Vec2::new((pos.x - self.rect.min.x) as f64, (pos.y - self.rect.min.y) as f64)
    }

    pub fn to_screen(&self, pos: Vec2) -> egui::Pos2 {
        self.rect.min + egui::vec2(pos.x as f32, pos.y as f32)
    }
}

/// Claim the remaining space for the canvas and keep the viewport sized to it.
pub fn allocate_canvas(app: &mut AnnotatorApp, ui: &mut egui::Ui) -> CanvasView {
    let (rect, response) = ui.allocate_at_least(ui.available_size(), egui::Sense::click_and_drag());
    app.editor.resize_canvas(rect.width() as f64, rect.height() as f64);
    CanvasView { rect, response }
}

fn to_color_image(image: &RgbaImage) -> egui::ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

fn upload(slot: &mut Option<TextureHandle>, ctx: &egui::Context, name: &str, image: &RgbaImage) {
    let _timer = ScopeTimer::new("texture_set");
    let color_image = to_color_image(image);
    match slot {
        Some(texture) => texture.set(color_image, TextureOptions::NEAREST),
        None => *slot = Some(ctx.load_texture(name, color_image, TextureOptions::NEAREST)),
    }
}

/// Recomposite what changed and push it to the GPU.
pub fn update_textures(app: &mut AnnotatorApp, ctx: &egui::Context) {
    let dirty = app.editor.take_dirty();
    let stale = app.editor.take_overlay_stale();
    let Some(doc) = app.editor.document() else {
        app.background_tex = None;
        app.overlay_tex = None;
        return;
    };

    let update = app.compositor.update(
        &doc.image,
        &doc.raster,
        app.editor.registry(),
        app.editor.viewport(),
        app.editor.config.overlay_alpha,
        dirty,
        stale,
    );
    if update == RenderUpdate::Unchanged && app.background_tex.is_some() {
        return;
    }
    log::trace!("render update: {update:?}");

    if update == RenderUpdate::Full || app.background_tex.is_none() {
        if let Some(background) = app.compositor.background() {
            upload(&mut app.background_tex, ctx, "canvas_background", background);
        }
    }
    if let Some(overlay) = app.compositor.overlay() {
        upload(&mut app.overlay_tex, ctx, "canvas_overlay", overlay);
    }
}

/// Paint the image, the label overlay, the brush outline and pending prompts.
pub fn draw_canvas(app: &AnnotatorApp, ui: &mut egui::Ui, view: &CanvasView) {
    let painter = ui.painter_at(view.rect);
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

    let (Some(background), Some(overlay)) = (&app.background_tex, &app.overlay_tex) else {
        painter.rect_filled(view.rect, 0.0, Color32::from_gray(60));
        painter.text(
            view.rect.center(),
            egui::Align2::CENTER_CENTER,
            "Open an image to start annotating",
            egui::FontId::proportional(18.0),
            Color32::from_gray(200),
        );
        return;
    };
    painter.image(background.id(), view.rect, uv, Color32::WHITE);
    painter.image(overlay.id(), view.rect, uv, Color32::WHITE);

    let viewport = app.editor.viewport();
    let zoom = viewport.zoom() as f32;

    if app.editor.tool() == Tool::Brush {
        if let Some(cursor) = app.editor.cursor() {
            let radius = app.editor.brush().radius() as f32 * zoom;
            painter.circle_stroke(
                view.to_screen(cursor),
                radius.max(1.0),
                egui::Stroke::new(1.0, Color32::WHITE),
            );
        }
    }

    for prompt in app.editor.prompts().iter() {
        let center = viewport.image_to_screen(prompt.x as f64 + 0.5, prompt.y as f64 + 0.5);
        let color = if prompt.foreground {
            Color32::from_rgb(0, 220, 0)
        } else {
            Color32::from_rgb(230, 0, 0)
        };
        painter.circle_filled(view.to_screen(center), PROMPT_MARKER_RADIUS, color);
    }
}
