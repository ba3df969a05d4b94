//! egui panels around the annotation canvas.
pub mod general_settings;
pub mod labels;
pub mod status_bar;
pub mod top_bar;
