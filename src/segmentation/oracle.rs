use image::RgbImage;

use crate::canvas::raster::BoolMask;
use crate::error::{AnnotatorError, Result};

/// A point-prompted segmentation model.
///
/// `set_image` may be slow and is run off the UI thread; `predict` is called
/// synchronously once per prompt flush and must return a mask with the
/// dimensions of the image passed to `set_image`.
pub trait SegmentationOracle: Send {
    fn set_image(&mut self, image: &RgbImage) -> Result<()>;

    /// `points` are image coordinates, `labels` holds `1` for foreground and `0` for background.
    fn predict(&mut self, points: &[(i32, i32)], labels: &[u8]) -> Result<BoolMask>;
}

/// Default tolerance of [`ColorRegionOracle`], per channel.
pub const DEFAULT_TOLERANCE: u8 = 32;

/// Model-free oracle: grows 4-connected regions of similar color from each prompt.
///
/// The result is the union of regions grown from foreground points minus the
/// union of regions grown from background points.
pub struct ColorRegionOracle {
    image: Option<RgbImage>,
    tolerance: u8,
}

impl ColorRegionOracle {
    pub fn new(tolerance: u8) -> Self {
        Self {
            image: None,
            tolerance,
        }
    }

    fn grow(image: &RgbImage, x: i32, y: i32, tolerance: u8) -> BoolMask {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let mut mask = BoolMask::new(w, h);
        if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
            return mask;
        }

        let raw = image.as_raw();
        let seed_idx = y as usize * w + x as usize;
        let seed = [raw[seed_idx * 3], raw[seed_idx * 3 + 1], raw[seed_idx * 3 + 2]];

        #[inline(always)]
        fn matches(raw: &[u8], idx: usize, seed: [u8; 3], tol: u8) -> bool {
            let o = idx * 3;
            (0..3).all(|c| raw[o + c].abs_diff(seed[c]) <= tol)
        }

        let bits = mask.as_mut_slice();
        let mut stack = vec![seed_idx];
        bits[seed_idx] = true;
        while let Some(idx) = stack.pop() {
            let (px, py) = (idx % w, idx / w);
            let mut visit = |n: usize| {
                if !bits[n] && matches(raw, n, seed, tolerance) {
                    bits[n] = true;
                    stack.push(n);
                }
            };
            if px > 0 {
                visit(idx - 1);
            }
            if px + 1 < w {
                visit(idx + 1);
            }
            if py > 0 {
                visit(idx - w);
            }
            if py + 1 < h {
                visit(idx + w);
            }
        }
        mask
    }
}

impl Default for ColorRegionOracle {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl SegmentationOracle for ColorRegionOracle {
    fn set_image(&mut self, image: &RgbImage) -> Result<()> {
        self.image = Some(image.clone());
        Ok(())
    }

    fn predict(&mut self, points: &[(i32, i32)], labels: &[u8]) -> Result<BoolMask> {
        let image = self.image.as_ref().ok_or(AnnotatorError::OracleNotReady)?;
        if points.len() != labels.len() {
            return Err(AnnotatorError::Oracle(format!(
                "{} points but {} labels",
                points.len(),
                labels.len()
            )));
        }

        let (w, h) = (image.width() as usize, image.height() as usize);
        let mut foreground = BoolMask::new(w, h);
        let mut background = BoolMask::new(w, h);
        for (&(x, y), &label) in points.iter().zip(labels) {
            let region = Self::grow(image, x, y, self.tolerance);
            if label == 0 {
                background.union_with(&region);
            } else {
                foreground.union_with(&region);
            }
        }
        foreground.subtract(&background);
        Ok(foreground)
    }
}
