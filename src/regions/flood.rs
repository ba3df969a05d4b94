use crate::canvas::raster::{BACKGROUND, BoolMask, FillPolicy, LabelId, LabelRaster, PixelRect};

/// Maximal 4-connected set of cells equal to `target` that contains `(start_x, start_y)`.
///
/// Returns the empty mask when the start lies outside the raster or does not
/// carry `target`. Never mutates the raster.
pub fn flood(raster: &LabelRaster, start_x: i32, start_y: i32, target: LabelId) -> BoolMask {
    let w = raster.width();
    let h = raster.height();
    let mut mask = BoolMask::new(w, h);

    if raster.get_signed(start_x, start_y) != Some(target) {
        return mask;
    }

    let cells = raster.cells();
    let bits = mask.as_mut_slice();

    // explicit stack of flat indices, the mask doubles as the visited set
    let seed = start_y as usize * w + start_x as usize;
    let mut stack: Vec<usize> = Vec::with_capacity(4096);
    bits[seed] = true;
    stack.push(seed);

    while let Some(idx) = stack.pop() {
        let x = idx % w;
        let y = idx / w;

        if x > 0 {
            let n = idx - 1;
            if !bits[n] && cells[n] == target {
                bits[n] = true;
                stack.push(n);
            }
        }
        if x + 1 < w {
            let n = idx + 1;
            if !bits[n] && cells[n] == target {
                bits[n] = true;
                stack.push(n);
            }
        }
        if y > 0 {
            let n = idx - w;
            if !bits[n] && cells[n] == target {
                bits[n] = true;
                stack.push(n);
            }
        }
        if y + 1 < h {
            let n = idx + w;
            if !bits[n] && cells[n] == target {
                bits[n] = true;
                stack.push(n);
            }
        }
    }

    mask
}

/// What a connected-component click does to the raster.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComponentPolicy {
    /// Zero the clicked component of the active label.
    RemoveComponent,
    /// Keep only the clicked component: every other cell of the active label is zeroed.
    TrimToComponent,
    /// Fill the clicked 4-connected region of unlabeled cells with the active label.
    AddOnEmpty,
}

impl ComponentPolicy {
    /// Map a click to a policy. `remove_only` is the primary action; the
    /// modified action trims, or fills empty space when `only_on_empty` is set.
    pub fn for_click(remove_only: bool, only_on_empty: bool) -> Self {
        match (remove_only, only_on_empty) {
            (true, _) => ComponentPolicy::RemoveComponent,
            (false, false) => ComponentPolicy::TrimToComponent,
            (false, true) => ComponentPolicy::AddOnEmpty,
        }
    }
}

/// Apply a connected-component edit at `(x, y)` for the `active` label.
///
/// Returns the bounding box of the changed cells, or `None` when nothing changed.
pub fn apply_component(
    raster: &mut LabelRaster,
    active: Option<LabelId>,
    x: i32,
    y: i32,
    policy: ComponentPolicy,
) -> Option<PixelRect> {
    let id = active.filter(|id| *id != BACKGROUND)?;
    if !raster.in_bounds(x, y) {
        return None;
    }

    match policy {
        ComponentPolicy::RemoveComponent => {
            let comp = flood(raster, x, y, id);
            let rect = comp.bounds()?;
            raster.erase_mask(&comp, id);
            Some(rect)
        }
        ComponentPolicy::TrimToComponent => {
            let comp = flood(raster, x, y, id);
            if comp.is_empty() {
                return None;
            }
            let mut outside = raster.mask_of(id);
            outside.subtract(&comp);
            let rect = outside.bounds()?;
            raster.erase_mask(&outside, id);
            Some(rect)
        }
        ComponentPolicy::AddOnEmpty => {
            let empty = flood(raster, x, y, BACKGROUND);
            let rect = empty.bounds()?;
            raster.fill_mask(&empty, id, FillPolicy::OnlyEmpty);
            Some(rect)
        }
    }
}
