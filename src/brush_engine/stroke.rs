use crate::brush_engine::brush::{BrushMode, paint_circle};
use crate::canvas::raster::{FillPolicy, LabelId, LabelRaster, PixelRect, union_dirty};
use crate::utils::profiler::ScopeTimer;

/// Sample positions along `p0 -> p1` every `step` pixels, always including both endpoints.
pub fn sample_segment(p0: (i32, i32), p1: (i32, i32), step: i32) -> Vec<(i32, i32)> {
    let dx = (p1.0 - p0.0) as f64;
    let dy = (p1.1 - p0.1) as f64;
    let dist = (dx.hypot(dy) as i64).max(1);
    let step = step.max(1) as i64;

    let mut samples = Vec::with_capacity((dist / step + 2) as usize);
    let mut i = 0;
    while i <= dist {
        let t = i as f64 / dist as f64;
        samples.push(((p0.0 as f64 + dx * t) as i32, (p0.1 as f64 + dy * t) as i32));
        i += step;
    }
    if samples.last() != Some(&p1) {
        samples.push(p1);
    }
    samples
}

/// Sweep the brush disk from `p0` to `p1`, dabbing every `step` pixels.
#[allow(clippy::too_many_arguments)]
pub fn stroke_path(
    raster: &mut LabelRaster,
    active: Option<LabelId>,
    p0: (i32, i32),
    p1: (i32, i32),
    radius: i32,
    step: i32,
    mode: BrushMode,
    policy: FillPolicy,
) -> Option<PixelRect> {
    active?;
    let mut dirty = None;
    for (x, y) in sample_segment(p0, p1, step) {
        dirty = union_dirty(dirty, paint_circle(raster, active, x, y, radius, mode, policy));
    }
    dirty
}

/// Tracks the previous sample of an ongoing drag.
pub struct StrokeState {
    pub last_pos: Option<(i32, i32)>,
    pub mode: BrushMode,
    stroke_timer: Option<ScopeTimer>,
}

impl StrokeState {
    /// Start an empty stroke and the profiling timer.
    pub fn new(mode: BrushMode) -> Self {
        Self {
            last_pos: None,
            mode,
            stroke_timer: Some(ScopeTimer::new("stroke")),
        }
    }

    /// Add a sample: the first one dabs once, later ones sweep from the previous sample.
    pub fn add_point(
        &mut self,
        raster: &mut LabelRaster,
        active: Option<LabelId>,
        pos: (i32, i32),
        radius: i32,
        step: i32,
        policy: FillPolicy,
    ) -> Option<PixelRect> {
        let dirty = match self.last_pos {
            None => paint_circle(raster, active, pos.0, pos.1, radius, self.mode, policy),
            Some(prev) => stroke_path(raster, active, prev, pos, radius, step, self.mode, policy),
        };
        self.last_pos = Some(pos);
        dirty
    }

    /// Forget the previous sample so the next press starts a fresh path.
    pub fn end(&mut self) {
        self.last_pos = None;
        // Drop the timer so stroke-level duration is reported when the stroke ends.
        self.stroke_timer.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_include_both_endpoints() {
        let samples = sample_segment((0, 0), (10, 0), 3);
        assert_eq!(samples.first(), Some(&(0, 0)));
        assert_eq!(samples.last(), Some(&(10, 0)));
        assert_eq!(samples, vec![(0, 0), (3, 0), (6, 0), (9, 0), (10, 0)]);
    }

    #[test]
    fn degenerate_segment_is_one_dab() {
        assert_eq!(sample_segment((4, 4), (4, 4), 2), vec![(4, 4)]);
    }

    #[test]
    fn stroke_leaves_no_gaps() {
        let mut r = LabelRaster::new(60, 20);
        stroke_path(&mut r, Some(1), (5, 10), (55, 10), 2, 1, BrushMode::Add, FillPolicy::Overwrite);
        for x in 3..=57 {
            assert_eq!(r.get(x, 10), Some(1), "gap at x={x}");
        }
    }

    #[test]
    fn state_sweeps_from_previous_sample() {
        let mut r = LabelRaster::new(40, 10);
        let mut stroke = StrokeState::new(BrushMode::Add);
        stroke.add_point(&mut r, Some(2), (5, 5), 1, 1, FillPolicy::Overwrite);
        let after_first = r.count(2);
        let dirty = stroke.add_point(&mut r, Some(2), (30, 5), 1, 1, FillPolicy::Overwrite);
        assert!(r.count(2) > after_first);
        assert_eq!(dirty, Some(PixelRect::new(3, 3, 32, 7)));
        stroke.end();
        assert!(stroke.last_pos.is_none());
    }
}
