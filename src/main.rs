use clap::Parser;

use rusty_annotator::{AnnotatorApp, CliArgs};

/// Launch the native egui application.
fn main() -> eframe::Result<()> {
    env_logger::init();
    let args = CliArgs::parse();
    log::debug!("{args:?}");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Rusty Annotator",
        options,
        Box::new(|cc| Ok(Box::new(AnnotatorApp::new(cc, args)))),
    )
}
