use rayon::prelude::*;

use crate::canvas::raster::{BACKGROUND, BoolMask, FillPolicy, LabelId, LabelRaster, PixelRect};
use crate::regions::flood::flood;
use crate::utils::profiler::ScopeTimer;

/// Default side length of the square structuring element.
pub const DEFAULT_KERNEL: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MorphOp {
    Dilate,
    Erode,
}

impl MorphOp {
    pub fn apply(self, mask: &BoolMask, kernel: usize) -> BoolMask {
        match self {
            MorphOp::Dilate => dilate(mask, kernel),
            MorphOp::Erode => erode(mask, kernel),
        }
    }
}

/// Offsets covered by a `kernel`-wide window centered on `kernel / 2`.
fn window(kernel: usize) -> (isize, isize) {
    let k = kernel.max(1) as isize;
    let lo = -(k / 2);
    (lo, lo + k - 1)
}

/// One separable pass along rows (`horizontal`) or columns.
/// `dilate` picks any-of, otherwise all-of; cells outside the grid count as false.
fn pass(src: &[bool], width: usize, height: usize, kernel: usize, horizontal: bool, dilate: bool) -> Vec<bool> {
    let (lo, hi) = window(kernel);
    let mut out = vec![false; src.len()];
    if width == 0 {
        return out;
    }
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, cell) in row.iter_mut().enumerate() {
            let mut any = false;
            let mut all = true;
            for d in lo..=hi {
                let (sx, sy) = if horizontal {
                    (x as isize + d, y as isize)
                } else {
                    (x as isize, y as isize + d)
                };
                let v = sx >= 0
                    && sy >= 0
                    && (sx as usize) < width
                    && (sy as usize) < height
                    && src[sy as usize * width + sx as usize];
                any |= v;
                all &= v;
                if (dilate && any) || (!dilate && !all) {
                    break;
                }
            }
            *cell = if dilate { any } else { all };
        }
    });
    out
}

fn separable(mask: &BoolMask, kernel: usize, dilate: bool) -> BoolMask {
    let (w, h) = (mask.width(), mask.height());
    let rows = pass(mask.as_slice(), w, h, kernel, true, dilate);
    let both = pass(&rows, w, h, kernel, false, dilate);
    BoolMask::from_vec(w, h, both).unwrap_or_else(|| BoolMask::new(w, h))
}

/// Binary dilation with a full `kernel x kernel` square, one iteration.
pub fn dilate(mask: &BoolMask, kernel: usize) -> BoolMask {
    separable(mask, kernel, true)
}

/// Binary erosion with a full `kernel x kernel` square, one iteration.
/// The border is treated as false, so regions touching it shrink there too.
pub fn erode(mask: &BoolMask, kernel: usize) -> BoolMask {
    separable(mask, kernel, false)
}

/// Grow or shrink the component of the active label under `(x, y)`.
///
/// The old component is zeroed first and the smoothed shape written back, so
/// erosion leaves no residue. Returns the union of old and new extents.
pub fn smooth(
    raster: &mut LabelRaster,
    active: Option<LabelId>,
    x: i32,
    y: i32,
    op: MorphOp,
    kernel: usize,
    policy: FillPolicy,
) -> Option<PixelRect> {
    let id = active.filter(|id| *id != BACKGROUND)?;
    let comp = flood(raster, x, y, id);
    let old = comp.bounds()?;

    let _timer = ScopeTimer::new("smooth");
    let smoothed = op.apply(&comp, kernel);

    raster.erase_mask(&comp, id);
    raster.fill_mask(&smoothed, id, policy);

    Some(match smoothed.bounds() {
        Some(new) => old.union(new),
        None => old,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: usize, x0: usize, y0: usize, side: usize) -> BoolMask {
        BoolMask::from_fn(size, size, |x, y| {
            x >= x0 && x < x0 + side && y >= y0 && y < y0 + side
        })
    }

    #[test]
    fn dilation_grows_by_half_kernel() {
        let m = square(9, 3, 3, 3);
        let d = dilate(&m, 3);
        assert!(m.is_subset_of(&d));
        assert_eq!(d, square(9, 2, 2, 5));
    }

    #[test]
    fn erosion_shrinks_and_respects_border() {
        let m = square(7, 1, 1, 5);
        let e = erode(&m, 3);
        assert!(e.is_subset_of(&m));
        assert_eq!(e, square(7, 2, 2, 3));

        // a full grid still loses its outer ring
        let full = BoolMask::from_fn(4, 4, |_, _| true);
        assert_eq!(erode(&full, 3).count(), 4);
    }

    #[test]
    fn closing_never_shrinks_a_square() {
        let m = square(11, 3, 3, 5);
        let closed = erode(&dilate(&m, 3), 3);
        assert!(m.is_subset_of(&closed));
    }

    #[test]
    fn kernel_one_is_identity() {
        let m = square(6, 1, 2, 3);
        assert_eq!(dilate(&m, 1), m);
        assert_eq!(erode(&m, 1), m);
    }

    #[test]
    fn smooth_erode_leaves_no_residue() {
        let mut r = LabelRaster::new(7, 7);
        r.fill_mask(&square(7, 1, 1, 5), 1, FillPolicy::Overwrite);
        smooth(&mut r, Some(1), 3, 3, MorphOp::Erode, 3, FillPolicy::Overwrite);
        assert_eq!(r.mask_of(1), square(7, 2, 2, 3));
    }

    #[test]
    fn smooth_dilate_respects_only_empty() {
        let mut r = LabelRaster::new(7, 7);
        r.fill_mask(&square(7, 2, 2, 3), 1, FillPolicy::Overwrite);
        r.set(1, 1, 2);
        smooth(&mut r, Some(1), 3, 3, MorphOp::Dilate, 3, FillPolicy::OnlyEmpty);
        assert_eq!(r.get(1, 1), Some(2));
        assert_eq!(r.count(1), 24);
    }

    #[test]
    fn smooth_on_other_label_is_noop() {
        let mut r = LabelRaster::new(5, 5);
        r.set(2, 2, 3);
        let before = r.clone();
        assert!(smooth(&mut r, Some(1), 2, 2, MorphOp::Dilate, 3, FillPolicy::Overwrite).is_none());
        assert_eq!(r, before);
    }
}
