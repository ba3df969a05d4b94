pub mod app;
pub mod brush_engine;
pub mod canvas;
pub mod config;
pub mod editor;
pub mod error;
pub mod io;
pub mod regions;
pub mod render;
pub mod segmentation;
pub mod ui;
pub mod utils;

pub use app::AnnotatorApp;
pub use config::{CliArgs, EditorConfig};
pub use editor::{EditorEvent, EditorState, Tool};
pub use error::{AnnotatorError, Result};
