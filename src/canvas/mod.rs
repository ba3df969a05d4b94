pub mod history;
pub mod labels;
pub mod raster;
pub mod viewport;
