/// Small integer naming one annotation class. `0` is reserved for unlabeled cells.
pub type LabelId = u8;

/// The reserved "no label" value.
pub const BACKGROUND: LabelId = 0;

/// Inclusive rectangle of image cells touched by an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelRect {
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Clip the signed box `[x0, x1] x [y0, y1]` to a `width x height` grid.
    /// Returns `None` when nothing of the box lies inside the grid.
    pub fn clipped(x0: i64, y0: i64, x1: i64, y1: i64, width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let (w, h) = (width as i64, height as i64);
        if x1 < 0 || y1 < 0 || x0 >= w || y0 >= h || x0 > x1 || y0 > y1 {
            return None;
        }
        Some(Self {
            x0: x0.max(0) as usize,
            y0: y0.max(0) as usize,
            x1: x1.min(w - 1) as usize,
            y1: y1.min(h - 1) as usize,
        })
    }

    pub fn full(width: usize, height: usize) -> Option<Self> {
        Self::clipped(0, 0, width as i64 - 1, height as i64 - 1, width, height)
    }

    pub fn width(&self) -> usize {
        self.x1 - self.x0 + 1
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0 + 1
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Grow by `pad` cells on every side, clipped to the grid.
    pub fn padded(self, pad: usize, width: usize, height: usize) -> Self {
        Self {
            x0: self.x0.saturating_sub(pad),
            y0: self.y0.saturating_sub(pad),
            x1: (self.x1 + pad).min(width.saturating_sub(1)),
            y1: (self.y1 + pad).min(height.saturating_sub(1)),
        }
    }
}

/// Merge two optional dirty rectangles.
pub fn union_dirty(a: Option<PixelRect>, b: Option<PixelRect>) -> Option<PixelRect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Whether additive writes may overwrite cells that already carry another label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillPolicy {
    #[default]
    Overwrite,
    OnlyEmpty,
}

impl FillPolicy {
    pub fn from_only_on_empty(only_on_empty: bool) -> Self {
        if only_on_empty {
            FillPolicy::OnlyEmpty
        } else {
            FillPolicy::Overwrite
        }
    }

    /// Can a cell currently holding `current` receive a new label?
    #[inline]
    pub fn allows(self, current: LabelId) -> bool {
        match self {
            FillPolicy::Overwrite => true,
            FillPolicy::OnlyEmpty => current == BACKGROUND,
        }
    }
}

/// Source index whose pixel contains the center of destination pixel `dst`.
#[inline]
fn center_source(dst: usize, dst_len: usize, src_len: usize) -> usize {
    (((2 * dst + 1) * src_len) / (2 * dst_len)).min(src_len - 1)
}

/// Row-major boolean grid with the same dimensions as the raster it describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoolMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl BoolMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut bits = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self { width, height, bits }
    }

    /// Wrap an existing row-major buffer. Returns `None` when the length is wrong.
    pub fn from_vec(width: usize, height: usize, bits: Vec<bool>) -> Option<Self> {
        (bits.len() == width * height).then_some(Self { width, height, bits })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = value;
        }
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn as_mut_slice(&mut self) -> &mut [bool] {
        &mut self.bits
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }

    pub fn is_subset_of(&self, other: &BoolMask) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.bits.iter().zip(&other.bits).all(|(a, b)| !*a || *b)
    }

    /// Coordinates of every set cell, row-major.
    pub fn iter_set(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let w = self.width.max(1);
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(move |(i, _)| (i % w, i / w))
    }

    /// Tight bounding box of the set cells.
    pub fn bounds(&self) -> Option<PixelRect> {
        let mut rect: Option<PixelRect> = None;
        for (x, y) in self.iter_set() {
            let cell = PixelRect::new(x, y, x, y);
            rect = Some(rect.map_or(cell, |r| r.union(cell)));
        }
        rect
    }

    pub fn union_with(&mut self, other: &BoolMask) {
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a |= *b;
        }
    }

    pub fn subtract(&mut self, other: &BoolMask) {
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a &= !*b;
        }
    }
}

/// The canonical grid of label ids, one cell per working-resolution pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelRaster {
    width: usize,
    height: usize,
    cells: Vec<LabelId>,
}

impl LabelRaster {
    /// Zero-filled raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![BACKGROUND; width * height],
        }
    }

    /// Wrap an existing row-major buffer. Returns `None` when the length is wrong.
    pub fn from_cells(width: usize, height: usize, cells: Vec<LabelId>) -> Option<Self> {
        (cells.len() == width * height).then_some(Self { width, height, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Option<LabelId> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    /// Signed lookup for coordinates straight out of the viewport mapper.
    pub fn get_signed(&self, x: i32, y: i32) -> Option<LabelId> {
        if self.in_bounds(x, y) {
            self.get(x as usize, y as usize)
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, id: LabelId) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            self.cells[idx] = id;
        }
    }

    pub fn cells(&self) -> &[LabelId] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [LabelId] {
        &mut self.cells
    }

    pub fn count(&self, id: LabelId) -> usize {
        self.cells.iter().filter(|c| **c == id).count()
    }

    /// Cells equal to `id` as a boolean mask.
    pub fn mask_of(&self, id: LabelId) -> BoolMask {
        let bits = self.cells.iter().map(|c| *c == id).collect();
        BoolMask {
            width: self.width,
            height: self.height,
            bits,
        }
    }

    /// Zero every cell carrying `id`. Returns the number of cells cleared.
    pub fn clear_label(&mut self, id: LabelId) -> usize {
        if id == BACKGROUND {
            return 0;
        }
        let mut cleared = 0;
        for cell in self.cells.iter_mut().filter(|c| **c == id) {
            *cell = BACKGROUND;
            cleared += 1;
        }
        cleared
    }

    /// Write `id` into every cell set in `mask` that `policy` allows.
    /// Returns the number of cells whose value changed.
    pub fn fill_mask(&mut self, mask: &BoolMask, id: LabelId, policy: FillPolicy) -> usize {
        debug_assert_eq!((mask.width, mask.height), (self.width, self.height));
        let mut changed = 0;
        for (cell, on) in self.cells.iter_mut().zip(&mask.bits) {
            if *on && *cell != id && policy.allows(*cell) {
                *cell = id;
                changed += 1;
            }
        }
        changed
    }

    /// Zero the cells set in `mask` that currently carry `id`; other labels are untouched.
    pub fn erase_mask(&mut self, mask: &BoolMask, id: LabelId) -> usize {
        debug_assert_eq!((mask.width, mask.height), (self.width, self.height));
        let mut changed = 0;
        for (cell, on) in self.cells.iter_mut().zip(&mask.bits) {
            if *on && *cell == id {
                *cell = BACKGROUND;
                changed += 1;
            }
        }
        changed
    }

    /// Distinct non-background ids in ascending order.
    pub fn distinct_labels(&self) -> Vec<LabelId> {
        let mut seen = [false; 256];
        for c in &self.cells {
            seen[*c as usize] = true;
        }
        (1..=255u16)
            .filter(|id| seen[*id as usize])
            .map(|id| id as LabelId)
            .collect()
    }

    /// Nearest-neighbor resample to a new size, sampling at pixel centers.
    ///
    /// Upsampling then downsampling back to the original size is an identity
    /// for any scale, integer or not.
    pub fn resized_nearest(&self, width: usize, height: usize) -> LabelRaster {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut out = LabelRaster::new(width, height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        let src_x: Vec<usize> = (0..width).map(|x| center_source(x, width, self.width)).collect();
        for y in 0..height {
            let sy = center_source(y, height, self.height);
            let src_row = &self.cells[sy * self.width..(sy + 1) * self.width];
            let dst_row = &mut out.cells[y * width..(y + 1) * width];
            for (dst, sx) in dst_row.iter_mut().zip(&src_x) {
                *dst = src_row[*sx];
            }
        }
        out
    }
}
