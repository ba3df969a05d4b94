use crate::brush_engine::brush::BrushMode;
use crate::canvas::raster::{BACKGROUND, BoolMask, FillPolicy, LabelId, LabelRaster, PixelRect};
use crate::error::{AnnotatorError, Result};

/// One point prompt in image coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub x: i32,
    pub y: i32,
    pub foreground: bool,
}

/// How magic-wand clicks reach the oracle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromptMode {
    /// Every click is its own one-point request, applied immediately.
    SinglePoint,
    /// Clicks accumulate while the append modifier is held and are flushed together.
    MultiPoint,
}

/// Ordered prompts of the pending request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromptSet {
    prompts: Vec<Prompt>,
}

impl PromptSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: i32, y: i32, foreground: bool) {
        self.prompts.push(Prompt { x, y, foreground });
    }

    pub fn clear(&mut self) {
        self.prompts.clear();
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter()
    }

    /// Split into the `(points, labels)` arrays the oracle expects.
    pub fn to_arrays(&self) -> (Vec<(i32, i32)>, Vec<u8>) {
        self.prompts
            .iter()
            .map(|p| ((p.x, p.y), p.foreground as u8))
            .unzip()
    }
}

/// Merge an oracle mask into the raster with brush add/erase semantics.
///
/// Add writes the active label where `policy` allows; Erase clears only cells
/// carrying the active label. Returns the bounds of the mask when any cell
/// changed. A mask whose size differs from the raster is rejected untouched.
pub fn apply_prediction(
    raster: &mut LabelRaster,
    mask: &BoolMask,
    active: Option<LabelId>,
    mode: BrushMode,
    policy: FillPolicy,
) -> Result<Option<PixelRect>> {
    if (mask.width(), mask.height()) != (raster.width(), raster.height()) {
        return Err(AnnotatorError::MaskSizeMismatch {
            got_w: mask.width(),
            got_h: mask.height(),
            want_w: raster.width(),
            want_h: raster.height(),
        });
    }
    let Some(id) = active.filter(|id| *id != BACKGROUND) else {
        return Ok(None);
    };

    let changed = match mode {
        BrushMode::Add => raster.fill_mask(mask, id, policy),
        BrushMode::Erase => raster.erase_mask(mask, id),
    };
    Ok(if changed > 0 { mask.bounds() } else { None })
}
