use std::path::Path;

use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::error::Result;

/// Default cap on the longer axis of the working image.
pub const MAX_RESOLUTION: u32 = 1024;

/// An image prepared for editing, plus the size it had on disk.
pub struct WorkingImage {
    pub image: RgbImage,
    pub original_size: (u32, u32),
}

impl WorkingImage {
    /// Wrap an in-memory image, downscaling it like a loaded file.
    pub fn from_rgb(image: RgbImage, max_resolution: Option<u32>) -> Self {
        let original_size = image.dimensions();
        Self {
            image: downscale(image, max_resolution),
            original_size,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn was_downscaled(&self) -> bool {
        self.image.dimensions() != self.original_size
    }
}

/// Shrink so the longer axis is at most `max_resolution`. Never upscales.
pub fn downscale(image: RgbImage, max_resolution: Option<u32>) -> RgbImage {
    let Some(max_res) = max_resolution else {
        return image;
    };
    let (w, h) = image.dimensions();
    let max_axis = w.max(h);
    if max_axis == 0 || max_axis <= max_res {
        return image;
    }
    let scale = max_res as f64 / max_axis as f64;
    let new_w = ((w as f64 * scale) as u32).max(1);
    let new_h = ((h as f64 * scale) as u32).max(1);
    log::debug!("downscaling {w}x{h} -> {new_w}x{new_h}");
    imageops::resize(&image, new_w, new_h, FilterType::Lanczos3)
}

/// Open any image format the `image` crate understands as RGB and downscale it.
pub fn load_working_image(path: &Path, max_resolution: Option<u32>) -> Result<WorkingImage> {
    let image = image::open(path)?.to_rgb8();
    let working = WorkingImage::from_rgb(image, max_resolution);
    let (w, h) = working.size();
    log::info!(
        "loaded {} ({}x{}, working {}x{})",
        path.display(),
        working.original_size.0,
        working.original_size.1,
        w,
        h
    );
    Ok(working)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_axis_is_capped() {
        let img = downscale(RgbImage::new(2048, 1000), Some(1024));
        assert_eq!(img.dimensions(), (1024, 500));
    }

    #[test]
    fn small_images_and_no_cap_are_untouched() {
        assert_eq!(downscale(RgbImage::new(300, 200), Some(1024)).dimensions(), (300, 200));
        assert_eq!(downscale(RgbImage::new(3000, 200), None).dimensions(), (3000, 200));
    }

    #[test]
    fn working_image_remembers_original_size() {
        let working = WorkingImage::from_rgb(RgbImage::new(400, 100), Some(200));
        assert_eq!(working.size(), (200, 50));
        assert_eq!(working.original_size, (400, 100));
        assert!(working.was_downscaled());
    }
}
