use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;
use eframe::egui::TextureHandle;

use crate::app::{input_handler, render_helper};
use crate::config::CliArgs;
use crate::editor::state::EditorState;
use crate::error::{AnnotatorError, Result};
use crate::io::mask_file::default_mask_path;
use crate::render::compositor::Compositor;
use crate::ui;

/// Main egui application: owns the editing session and the canvas textures.
pub struct AnnotatorApp {
    pub(crate) editor: EditorState,
    pub(crate) compositor: Compositor,
    pub(crate) background_tex: Option<TextureHandle>,
    pub(crate) overlay_tex: Option<TextureHandle>,
    pub(crate) mask_output: Option<PathBuf>,
    pub(crate) image_path_input: String,
    pub(crate) mask_path_input: String,
    pub(crate) label_name_input: String,
    pub(crate) status: Option<String>,
    pub(crate) append_held: bool,
    pub(crate) show_settings: bool,
}

impl AnnotatorApp {
    /// Build the session from the command line and open the requested files.
    pub fn new(cc: &eframe::CreationContext<'_>, args: CliArgs) -> Self {
        let mut editor = EditorState::new(args.to_config());
        let ctx = cc.egui_ctx.clone();
        editor.oracle().set_waker(move || ctx.request_repaint());

        let mut app = Self {
            editor,
            compositor: Compositor::new(),
            background_tex: None,
            overlay_tex: None,
            mask_output: args.output.clone(),
            image_path_input: String::new(),
            mask_path_input: String::new(),
            label_name_input: String::new(),
            status: None,
            append_held: false,
            show_settings: false,
        };

        if let Some(image) = &args.image {
            app.image_path_input = image.display().to_string();
            let opened = app.editor.open_image(image);
            if app.report(opened) {
                if let Some(mask) = &args.mask {
                    app.mask_path_input = mask.display().to_string();
                    let loaded = app.editor.load_mask(mask);
                    app.report(loaded);
                }
            }
        }
        app
    }

    /// Log and surface an IO result. Returns `true` on success.
    pub(crate) fn report(&mut self, result: Result<()>) -> bool {
        match result {
            Ok(()) => {
                self.status = None;
                true
            }
            Err(err) => {
                log::error!("{err}");
                self.status = Some(err.to_string());
                false
            }
        }
    }

    pub(crate) fn open_image_from_input(&mut self) {
        let path = PathBuf::from(self.image_path_input.trim());
        let opened = self.editor.open_image(&path);
        if self.report(opened) {
            self.compositor.invalidate();
        }
    }

    pub(crate) fn load_mask_from_input(&mut self) {
        let path = PathBuf::from(self.mask_path_input.trim());
        let loaded = self.editor.load_mask(&path);
        self.report(loaded);
    }

    /// Where Save writes: `--output`, else `<image>_mask.png`.
    pub(crate) fn mask_save_path(&self) -> Option<PathBuf> {
        if let Some(out) = &self.mask_output {
            return Some(out.clone());
        }
        self.editor
            .document()
            .and_then(|doc| doc.path.as_deref())
            .map(default_mask_path)
    }

    pub(crate) fn save_mask(&mut self) {
        let result = match self.mask_save_path() {
            Some(path) => self.editor.save_mask(&path).map(|()| path),
            None => Err(AnnotatorError::NoImage),
        };
        match result {
            Ok(path) => self.status = Some(format!("Saved {}", path.display())),
            Err(err) => {
                self.report(Err(err));
            }
        }
    }
}

impl eframe::App for AnnotatorApp {
    /// Poll the oracle, draw panels, route input and refresh the canvas each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.editor.poll_oracle();

        ui::top_bar::top_bar(self, ctx);
        ui::status_bar::status_bar(self, ctx);
        ui::labels::labels_panel(self, ctx);
        ui::general_settings::general_settings_modal(self, ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let view = render_helper::allocate_canvas(self, ui);
                input_handler::handle_input(self, ctx, &view);
                if self.editor.should_redraw(Instant::now()) {
                    render_helper::update_textures(self, ctx);
                } else {
                    ctx.request_repaint_after(self.editor.config.refresh_interval);
                }
                render_helper::draw_canvas(self, ui, &view);
            });

        if matches!(
            self.editor.interaction(),
            crate::editor::Interaction::Stroking { .. } | crate::editor::Interaction::Panning { .. }
        ) {
            ctx.request_repaint_after(Duration::from_millis(10));
        }
    }
}
