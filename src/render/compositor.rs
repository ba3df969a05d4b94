use image::{RgbImage, RgbaImage};
use rayon::prelude::*;

use crate::canvas::labels::LabelRegistry;
use crate::canvas::raster::{BACKGROUND, LabelRaster, PixelRect};
use crate::canvas::viewport::Viewport;
use crate::utils::color::{OUTSIDE_IMAGE, with_alpha};
use crate::utils::profiler::ScopeTimer;

/// Default overlay opacity out of 255.
pub const OVERLAY_ALPHA: u8 = 150;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// RGBA color for every possible label id. Background and unregistered ids are transparent.
pub fn overlay_lut(registry: &LabelRegistry, alpha: u8) -> [[u8; 4]; 256] {
    let mut lut = [TRANSPARENT; 256];
    for (id, meta) in registry.iter() {
        if id != BACKGROUND {
            lut[id as usize] = with_alpha(meta.color, alpha);
        }
    }
    lut
}

/// Canvas size in whole pixels.
fn canvas_pixels(viewport: &Viewport) -> (u32, u32) {
    let (w, h) = viewport.canvas_size();
    (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
}

/// Image column (or row) shown by each canvas column (or row), nearest neighbor.
/// Uses the same floor mapping as pointer input so a pixel shows the cell a click there edits.
fn sample_axis(canvas_px: u32, view_extent: f64, canvas_extent: f64, origin: i32) -> Vec<i64> {
    let scale = view_extent / canvas_extent;
    (0..canvas_px)
        .map(|s| (s as f64 * scale).floor() as i64 + origin as i64)
        .collect()
}

struct Sampling {
    cols: Vec<i64>,
    rows: Vec<i64>,
}

impl Sampling {
    fn new(viewport: &Viewport) -> Self {
        let (cw, ch) = canvas_pixels(viewport);
        let (canvas_w, canvas_h) = viewport.canvas_size();
        let (view_w, view_h) = viewport.view_size();
        let (ox, oy) = viewport.origin();
        Self {
            cols: sample_axis(cw, view_w, canvas_w, ox),
            rows: sample_axis(ch, view_h, canvas_h, oy),
        }
    }

    /// Canvas index range whose samples fall in `[lo, hi]`. Samples are non-decreasing.
    fn span(samples: &[i64], lo: usize, hi: usize) -> std::ops::Range<usize> {
        let start = samples.partition_point(|s| *s < lo as i64);
        let end = samples.partition_point(|s| *s <= hi as i64);
        start..end.max(start)
    }
}

fn write_overlay_rows(
    out: &mut RgbaImage,
    raster: &LabelRaster,
    lut: &[[u8; 4]; 256],
    sampling: &Sampling,
    cols: std::ops::Range<usize>,
    rows: std::ops::Range<usize>,
) {
    let stride = out.width() as usize * 4;
    let (w, h) = (raster.width() as i64, raster.height() as i64);
    let cells = raster.cells();
    out.par_chunks_mut(stride)
        .enumerate()
        .filter(|(sy, _)| rows.contains(sy))
        .for_each(|(sy, line)| {
            let iy = sampling.rows[sy];
            for sx in cols.clone() {
                let ix = sampling.cols[sx];
                let rgba = if ix < 0 || iy < 0 || ix >= w || iy >= h {
                    TRANSPARENT
                } else {
                    lut[cells[(iy * w + ix) as usize] as usize]
                };
                line[sx * 4..sx * 4 + 4].copy_from_slice(&rgba);
            }
        });
}

/// Color overlay of the visible part of the raster, sized to the canvas.
/// Cells outside the image are transparent.
pub fn composite(raster: &LabelRaster, registry: &LabelRegistry, viewport: &Viewport, alpha: u8) -> RgbaImage {
    let _timer = ScopeTimer::new("composite");
    let (cw, ch) = canvas_pixels(viewport);
    let mut out = RgbaImage::new(cw, ch);
    let sampling = Sampling::new(viewport);
    let lut = overlay_lut(registry, alpha);
    write_overlay_rows(&mut out, raster, &lut, &sampling, 0..cw as usize, 0..ch as usize);
    out
}

/// Recomposite only the canvas pixels showing image cells inside `rect`.
/// `out` must come from [`composite`] with the same viewport.
pub fn composite_region(
    out: &mut RgbaImage,
    raster: &LabelRaster,
    registry: &LabelRegistry,
    viewport: &Viewport,
    alpha: u8,
    rect: PixelRect,
) {
    let sampling = Sampling::new(viewport);
    let cols = Sampling::span(&sampling.cols, rect.x0, rect.x1);
    let rows = Sampling::span(&sampling.rows, rect.y0, rect.y1);
    if cols.is_empty() || rows.is_empty() {
        return;
    }
    let lut = overlay_lut(registry, alpha);
    write_overlay_rows(out, raster, &lut, &sampling, cols, rows);
}

/// Visible crop of the working image resampled to the canvas; gray outside the image.
pub fn compose_background(image: &RgbImage, viewport: &Viewport) -> RgbaImage {
    let _timer = ScopeTimer::new("compose_background");
    let (cw, ch) = canvas_pixels(viewport);
    let mut out = RgbaImage::new(cw, ch);
    let sampling = Sampling::new(viewport);
    let (w, h) = (image.width() as i64, image.height() as i64);
    let src = image.as_raw();
    let stride = cw as usize * 4;

    out.par_chunks_mut(stride).enumerate().for_each(|(sy, line)| {
        let iy = sampling.rows[sy];
        for (sx, px) in line.chunks_exact_mut(4).enumerate() {
            let ix = sampling.cols[sx];
            if ix < 0 || iy < 0 || ix >= w || iy >= h {
                px.copy_from_slice(&OUTSIDE_IMAGE);
            } else {
                let o = ((iy * w + ix) * 3) as usize;
                px.copy_from_slice(&[src[o], src[o + 1], src[o + 2], 255]);
            }
        }
    });
    out
}

/// What [`Compositor::update`] had to redo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderUpdate {
    Unchanged,
    /// Only overlay pixels inside the dirty rectangle changed.
    Partial,
    /// Overlay recomposited completely; background unchanged.
    Overlay,
    /// View changed: background and overlay were both rebuilt.
    Full,
}

/// Cached background and overlay layers for one view.
#[derive(Default)]
pub struct Compositor {
    background: Option<RgbaImage>,
    overlay: Option<RgbaImage>,
    view_key: Option<Viewport>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&RgbaImage> {
        self.background.as_ref()
    }

    pub fn overlay(&self) -> Option<&RgbaImage> {
        self.overlay.as_ref()
    }

    /// Force a full rebuild on the next update.
    pub fn invalidate(&mut self) {
        self.view_key = None;
    }

    /// Bring both layers up to date.
    ///
    /// `dirty` is the image rectangle mutated since the last update, `overlay_stale`
    /// requests a complete overlay pass (e.g. after undo or a label color change).
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        image: &RgbImage,
        raster: &LabelRaster,
        registry: &LabelRegistry,
        viewport: &Viewport,
        alpha: u8,
        dirty: Option<PixelRect>,
        overlay_stale: bool,
    ) -> RenderUpdate {
        let view_changed = self.view_key.as_ref() != Some(viewport);
        if view_changed || self.background.is_none() || self.overlay.is_none() {
            self.background = Some(compose_background(image, viewport));
            self.overlay = Some(composite(raster, registry, viewport, alpha));
            self.view_key = Some(viewport.clone());
            return RenderUpdate::Full;
        }
        if overlay_stale {
            self.overlay = Some(composite(raster, registry, viewport, alpha));
            return RenderUpdate::Overlay;
        }
        match (dirty, self.overlay.as_mut()) {
            (Some(rect), Some(overlay)) => {
                composite_region(overlay, raster, registry, viewport, alpha, rect);
                RenderUpdate::Partial
            }
            _ => RenderUpdate::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::raster::FillPolicy;

    fn setup() -> (LabelRaster, LabelRegistry, Viewport) {
        let mut raster = LabelRaster::new(32, 32);
        let mut registry = LabelRegistry::new();
        let id = registry.create("a").unwrap();
        raster.set(1, 1, id);
        let mut viewport = Viewport::new(64.0, 64.0, 32, 32);
        viewport.set_origin(0, 0);
        (raster, registry, viewport)
    }

    #[test]
    fn overlay_maps_labels_with_fixed_alpha() {
        let (raster, registry, viewport) = setup();
        let out = composite(&raster, &registry, &viewport, OVERLAY_ALPHA);
        assert_eq!(out.dimensions(), (64, 64));
        // zoom 2: cell (1,1) covers canvas pixels 2..4
        assert_eq!(out.get_pixel(2, 3).0, [255, 0, 0, OVERLAY_ALPHA]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn outside_cells_are_transparent_and_background_gray() {
        let (raster, registry, mut viewport) = setup();
        viewport.set_origin(-2, 0);
        let overlay = composite(&raster, &registry, &viewport, OVERLAY_ALPHA);
        assert_eq!(overlay.get_pixel(0, 0).0[3], 0);
        let bg = compose_background(&RgbImage::new(32, 32), &viewport);
        assert_eq!(bg.get_pixel(0, 0).0, OUTSIDE_IMAGE);
        assert_eq!(bg.get_pixel(63, 63).0, [0, 0, 0, 255]);
    }

    #[test]
    fn partial_update_matches_full_composite() {
        let (mut raster, registry, viewport) = setup();
        let image = RgbImage::new(32, 32);
        let mut compositor = Compositor::new();
        assert_eq!(
            compositor.update(&image, &raster, &registry, &viewport, OVERLAY_ALPHA, None, false),
            RenderUpdate::Full
        );

        let mask = crate::canvas::raster::BoolMask::from_fn(32, 32, |x, y| (2..4).contains(&x) && (2..4).contains(&y));
        raster.fill_mask(&mask, 1, FillPolicy::Overwrite);
        let rect = PixelRect::new(2, 2, 3, 3);
        assert_eq!(
            compositor.update(&image, &raster, &registry, &viewport, OVERLAY_ALPHA, Some(rect), false),
            RenderUpdate::Partial
        );
        let full = composite(&raster, &registry, &viewport, OVERLAY_ALPHA);
        assert_eq!(compositor.overlay(), Some(&full));
    }

    #[test]
    fn view_change_rebuilds_everything() {
        let (raster, registry, mut viewport) = setup();
        let image = RgbImage::new(32, 32);
        let mut compositor = Compositor::new();
        compositor.update(&image, &raster, &registry, &viewport, OVERLAY_ALPHA, None, false);
        assert_eq!(
            compositor.update(&image, &raster, &registry, &viewport, OVERLAY_ALPHA, None, false),
            RenderUpdate::Unchanged
        );
        viewport.pan(4.0, 0.0);
        assert_eq!(
            compositor.update(&image, &raster, &registry, &viewport, OVERLAY_ALPHA, None, false),
            RenderUpdate::Full
        );
    }
}
