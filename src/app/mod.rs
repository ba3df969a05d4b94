pub mod input_handler;
pub mod painter;
pub mod render_helper;

pub use painter::AnnotatorApp;
