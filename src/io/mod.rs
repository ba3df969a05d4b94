pub mod image_loader;
pub mod mask_file;
