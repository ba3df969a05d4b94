use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;

use crate::brush_engine::brush::{Brush, BrushMode};
use crate::brush_engine::stroke::StrokeState;
use crate::canvas::history::{Snapshot, UndoHistory};
use crate::canvas::labels::LabelRegistry;
use crate::canvas::raster::{FillPolicy, LabelId, LabelRaster, PixelRect, union_dirty};
use crate::canvas::viewport::Viewport;
use crate::config::EditorConfig;
use crate::editor::input::Interaction;
use crate::error::{AnnotatorError, Result};
use crate::io::image_loader::{WorkingImage, load_working_image};
use crate::io::mask_file::{self, LoadedMask};
use crate::regions::flood::{ComponentPolicy, apply_component};
use crate::regions::morphology::{MorphOp, smooth};
use crate::render::throttle::FrameLimiter;
use crate::segmentation::oracle::{ColorRegionOracle, SegmentationOracle};
use crate::segmentation::prompts::{PromptMode, PromptSet, apply_prediction};
use crate::segmentation::worker::OracleHandle;
use crate::utils::vector::Vec2;

/// The editing tools. At most one is active.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    None,
    Brush,
    MagicWand,
    ConnectedComponent,
    Smoothing,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::None => "None",
            Tool::Brush => "Brush",
            Tool::MagicWand => "Magic wand",
            Tool::ConnectedComponent => "Connected component",
            Tool::Smoothing => "Smoothing",
        }
    }
}

/// The loaded image and its label raster.
pub struct Document {
    pub image: RgbImage,
    pub raster: LabelRaster,
    /// Size on disk; masks are saved at this size.
    pub original_size: (u32, u32),
    pub path: Option<PathBuf>,
}

/// Everything an editing session owns, passed explicitly to every operation.
pub struct EditorState {
    pub config: EditorConfig,
    pub(crate) document: Option<Document>,
    pub(crate) registry: LabelRegistry,
    pub(crate) history: UndoHistory,
    pub(crate) viewport: Viewport,
    pub(crate) tool: Tool,
    pub(crate) interaction: Interaction,
    pub(crate) prompts: PromptSet,
    pub(crate) only_on_empty: bool,
    pub(crate) brush: Brush,
    pub(crate) cursor: Option<Vec2>,
    oracle: OracleHandle,
    frame_limiter: FrameLimiter,
    dirty: Option<PixelRect>,
    overlay_stale: bool,
    last_error: Option<String>,
}

impl EditorState {
    /// Session using the built-in color-region oracle.
    pub fn new(config: EditorConfig) -> Self {
        let oracle = Box::new(ColorRegionOracle::new(config.oracle_tolerance));
        Self::with_oracle(config, oracle)
    }

    pub fn with_oracle(config: EditorConfig, oracle: Box<dyn SegmentationOracle>) -> Self {
        Self {
            registry: LabelRegistry::new(),
            history: UndoHistory::new(config.undo_depth),
            viewport: Viewport::new(800.0, 600.0, 0, 0),
            brush: Brush::new(config.brush_size),
            frame_limiter: FrameLimiter::new(config.refresh_interval),
            config,
            document: None,
            tool: Tool::None,
            interaction: Interaction::Idle,
            prompts: PromptSet::new(),
            only_on_empty: false,
            cursor: None,
            oracle: OracleHandle::new(oracle),
            dirty: None,
            overlay_stale: true,
            last_error: None,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn raster(&self) -> Option<&LabelRaster> {
        self.document.as_ref().map(|d| &d.raster)
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.document.as_ref().map(|d| &d.image)
    }

    pub fn registry(&self) -> &LabelRegistry {
        &self.registry
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush = Brush::new(size);
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn only_on_empty(&self) -> bool {
        self.only_on_empty
    }

    pub fn set_only_on_empty(&mut self, only_on_empty: bool) {
        self.only_on_empty = only_on_empty;
    }

    fn fill_policy(&self) -> FillPolicy {
        FillPolicy::from_only_on_empty(self.only_on_empty)
    }

    pub fn undo_len(&self) -> usize {
        self.history.len()
    }

    pub fn oracle_ready(&self) -> bool {
        self.oracle.is_ready()
    }

    pub fn oracle(&mut self) -> &mut OracleHandle {
        &mut self.oracle
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn record_error(&mut self, err: &AnnotatorError) {
        log::warn!("{err}");
        self.last_error = Some(err.to_string());
    }

    fn active_label(&self) -> Option<LabelId> {
        self.registry.active()
    }

    pub(crate) fn mark_dirty(&mut self, rect: Option<PixelRect>) {
        self.dirty = union_dirty(self.dirty, rect);
    }

    /// Image rectangle mutated since the last call.
    pub fn take_dirty(&mut self) -> Option<PixelRect> {
        self.dirty.take()
    }

    /// Whether the whole overlay must be rebuilt (undo, label changes, loads).
    pub fn take_overlay_stale(&mut self) -> bool {
        std::mem::replace(&mut self.overlay_stale, false)
    }

    /// Redraws are throttled while stroking; everything else redraws immediately.
    pub fn should_redraw(&mut self, now: Instant) -> bool {
        match self.interaction {
            Interaction::Stroking { .. } => self.frame_limiter.should_render(now),
            _ => true,
        }
    }

    fn snapshot(&self) -> Option<Snapshot> {
        self.document.as_ref().map(|doc| Snapshot {
            raster: doc.raster.clone(),
            registry: self.registry.clone(),
        })
    }

    fn push_undo(&mut self) {
        if let Some(snapshot) = self.snapshot() {
            self.history.push(snapshot);
        }
    }

    /// Restore the state before the most recent action. No-op on empty history.
    pub fn undo(&mut self) -> bool {
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        let Some(snapshot) = self.history.pop() else {
            log::debug!("nothing to undo");
            return false;
        };
        doc.raster = snapshot.raster;
        let active = self.registry.active();
        self.registry = snapshot.registry;
        if active.is_some_and(|id| self.registry.contains(id)) {
            self.registry.set_active(active);
        }
        self.end_interaction();
        self.overlay_stale = true;
        true
    }

    /// Select `tool`, or deactivate it if it is already active.
    /// Returns `false` when the tool cannot be selected right now.
    pub fn select_tool(&mut self, tool: Tool) -> bool {
        if tool != Tool::None && self.document.is_none() {
            log::debug!("no image loaded, ignoring tool selection");
            return false;
        }
        if tool == Tool::MagicWand && self.tool != Tool::MagicWand && !self.oracle.is_ready() {
            log::debug!("segmentation oracle not ready, magic wand unavailable");
            return false;
        }
        self.end_interaction();
        self.prompts.clear();
        self.tool = if self.tool == tool { Tool::None } else { tool };
        log::debug!("tool: {:?}", self.tool);
        true
    }

    pub(crate) fn deactivate_tools(&mut self) {
        self.end_interaction();
        self.prompts.clear();
        self.tool = Tool::None;
    }

    fn end_interaction(&mut self) {
        if let Interaction::Stroking { stroke } = &mut self.interaction {
            stroke.end();
        }
        self.interaction = Interaction::Idle;
        self.frame_limiter.reset();
    }

    /// Apply oracle readiness events. The magic wand is dropped if readiness was lost.
    pub fn poll_oracle(&mut self) -> bool {
        let changed = self.oracle.poll();
        if !self.oracle.is_ready() && self.tool == Tool::MagicWand {
            self.deactivate_tools();
        }
        changed
    }

    /// Replace the session's image. Raster, labels and history start over.
    pub fn load_image(&mut self, working: WorkingImage, path: Option<PathBuf>) {
        self.deactivate_tools();
        let (w, h) = working.size();
        self.oracle.begin_image(working.image.clone());
        self.document = Some(Document {
            raster: LabelRaster::new(w as usize, h as usize),
            image: working.image,
            original_size: working.original_size,
            path,
        });
        self.registry.clear();
        self.history = UndoHistory::new(self.config.undo_depth);
        self.viewport.set_image_size(w as usize, h as usize);
        self.dirty = None;
        self.overlay_stale = true;
        self.last_error = None;
    }

    pub fn open_image(&mut self, path: &Path) -> Result<()> {
        let working = load_working_image(path, self.config.max_resolution)?;
        self.load_image(working, Some(path.to_path_buf()));
        Ok(())
    }

    pub fn save_mask(&self, path: &Path) -> Result<()> {
        let doc = self.document.as_ref().ok_or(AnnotatorError::NoImage)?;
        mask_file::save_mask(path, &doc.raster, &self.registry, doc.original_size)
    }

    /// Read a mask file and replace raster and labels with it as one undoable action.
    /// The current state is untouched if the file fails to load.
    pub fn load_mask(&mut self, path: &Path) -> Result<()> {
        let doc = self.document.as_ref().ok_or(AnnotatorError::NoImage)?;
        let size = (doc.raster.width(), doc.raster.height());
        let loaded = mask_file::load_mask(path, size)?;
        self.import_mask(loaded)
    }

    pub fn import_mask(&mut self, loaded: LoadedMask) -> Result<()> {
        let snapshot = self.snapshot().ok_or(AnnotatorError::NoImage)?;
        let doc = self.document.as_mut().ok_or(AnnotatorError::NoImage)?;
        if (loaded.raster.width(), loaded.raster.height()) != (doc.raster.width(), doc.raster.height()) {
            return Err(AnnotatorError::MaskSizeMismatch {
                got_w: loaded.raster.width(),
                got_h: loaded.raster.height(),
                want_w: doc.raster.width(),
                want_h: doc.raster.height(),
            });
        }
        self.history.push(snapshot);
        doc.raster = loaded.raster;
        self.registry = loaded.registry;
        self.deactivate_tools();
        self.overlay_stale = true;
        Ok(())
    }

    /// Create a label with the smallest free id and make it active.
    /// `None` when no image is loaded, the name is blank or every id is taken.
    pub fn add_label(&mut self, name: impl Into<String>) -> Option<LabelId> {
        let name = name.into();
        if name.trim().is_empty() {
            log::debug!("ignoring label with an empty name");
            return None;
        }
        let snapshot = self.snapshot()?;
        let id = self.registry.create(name.trim())?;
        self.deactivate_tools();
        self.history.push(snapshot);
        self.registry.set_active(Some(id));
        self.overlay_stale = true;
        log::debug!("added label {id}");
        Some(id)
    }

    pub fn set_active_label(&mut self, id: Option<LabelId>) -> bool {
        self.registry.set_active(id)
    }

    /// Zero every cell of `id` and free the id.
    pub fn clear_label(&mut self, id: LabelId) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        let Some(snapshot) = self.snapshot() else {
            return false;
        };
        self.deactivate_tools();
        self.history.push(snapshot);
        if let Some(doc) = self.document.as_mut() {
            doc.raster.clear_label(id);
        }
        self.registry.remove(id);
        self.overlay_stale = true;
        log::debug!("cleared label {id}");
        true
    }

    pub fn clear_active_label(&mut self) -> bool {
        match self.registry.active() {
            Some(id) => self.clear_label(id),
            None => false,
        }
    }

    /// Remove every label as a single undoable action.
    pub fn clear_all_labels(&mut self) -> bool {
        if self.registry.is_empty() {
            return false;
        }
        let Some(snapshot) = self.snapshot() else {
            return false;
        };
        self.deactivate_tools();
        self.history.push(snapshot);
        for id in self.registry.ids() {
            if let Some(doc) = self.document.as_mut() {
                doc.raster.clear_label(id);
            }
        }
        self.registry.clear();
        self.overlay_stale = true;
        true
    }

    pub fn resize_canvas(&mut self, width: f64, height: f64) -> bool {
        self.viewport.resize(width, height)
    }

    pub fn zoom_at(&mut self, anchor: Vec2, factor: f64) -> bool {
        self.viewport.zoom_about(anchor, factor)
    }

    pub fn zoom_in(&mut self) -> bool {
        let factor = self.config.zoom_in_factor();
        self.viewport.zoom_about_center(factor)
    }

    pub fn zoom_out(&mut self) -> bool {
        let factor = self.config.zoom_out_factor();
        self.viewport.zoom_about_center(factor)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.pan(dx, dy);
    }

    /// Arrow-key pan by `config.pan_step` screen pixels in the given direction.
    pub fn pan_step(&mut self, dir_x: f64, dir_y: f64) {
        let step = self.config.pan_step;
        self.viewport.pan(dir_x * step, dir_y * step);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// Start a brush stroke at image coordinates. The press must land on the image.
    pub fn begin_stroke(&mut self, ix: i32, iy: i32, mode: BrushMode) -> bool {
        let active = self.active_label();
        let Some(doc) = self.document.as_ref() else {
            return false;
        };
        if active.is_none() || !doc.raster.in_bounds(ix, iy) {
            log::debug!("stroke ignored at ({ix}, {iy})");
            return false;
        }
        self.push_undo();
        self.interaction = Interaction::Stroking {
            stroke: StrokeState::new(mode),
        };
        self.frame_limiter.reset();
        self.continue_stroke(ix, iy);
        true
    }

    /// Extend the current stroke to image coordinates; samples off the image are clipped.
    pub fn continue_stroke(&mut self, ix: i32, iy: i32) {
        let active = self.active_label();
        let policy = self.fill_policy();
        let (radius, step) = (self.brush.radius(), self.brush.spacing());
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        if let Interaction::Stroking { stroke } = &mut self.interaction {
            let rect = stroke.add_point(&mut doc.raster, active, (ix, iy), radius, step, policy);
            self.dirty = union_dirty(self.dirty, rect);
        }
    }

    pub fn end_stroke(&mut self) {
        if matches!(self.interaction, Interaction::Stroking { .. }) {
            self.end_interaction();
        }
    }

    /// Connected-component click. `remove_only` is the primary action.
    pub fn component_click(&mut self, ix: i32, iy: i32, remove_only: bool) -> bool {
        let policy = ComponentPolicy::for_click(remove_only, self.only_on_empty);
        let active = self.active_label();
        let Some(snapshot) = self.snapshot() else {
            return false;
        };
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        match apply_component(&mut doc.raster, active, ix, iy, policy) {
            Some(rect) => {
                self.history.push(snapshot);
                self.mark_dirty(Some(rect));
                log::debug!("{policy:?} at ({ix}, {iy})");
                true
            }
            None => false,
        }
    }

    /// Dilate or erode the active label's component under the click.
    pub fn smooth_click(&mut self, ix: i32, iy: i32, op: MorphOp) -> bool {
        let active = self.active_label();
        let policy = self.fill_policy();
        let kernel = self.config.smoothing_kernel;
        let Some(snapshot) = self.snapshot() else {
            return false;
        };
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        match smooth(&mut doc.raster, active, ix, iy, op, kernel, policy) {
            Some(rect) => {
                self.history.push(snapshot);
                self.mark_dirty(Some(rect));
                log::debug!("{op:?} at ({ix}, {iy})");
                true
            }
            None => false,
        }
    }

    /// Magic-wand click at image coordinates.
    ///
    /// In [`PromptMode::SinglePoint`] the click is sent to the oracle at once
    /// and the region added or erased. In [`PromptMode::MultiPoint`] the click
    /// only joins the pending prompts (foreground when `add`).
    pub fn magic_click(&mut self, ix: i32, iy: i32, add: bool, mode: PromptMode) -> Result<bool> {
        let active = self.active_label();
        let Some(doc) = self.document.as_ref() else {
            return Ok(false);
        };
        if active.is_none() || !doc.raster.in_bounds(ix, iy) {
            log::debug!("magic wand click ignored at ({ix}, {iy})");
            return Ok(false);
        }
        match mode {
            PromptMode::MultiPoint => {
                self.prompts.push(ix, iy, add);
                Ok(false)
            }
            PromptMode::SinglePoint => {
                self.prompts.clear();
                self.prompts.push(ix, iy, true);
                self.run_prompts(BrushMode::from_add(add))
            }
        }
    }

    /// Send the accumulated prompts as one request and add the result.
    pub fn flush_prompts(&mut self) -> Result<bool> {
        if self.prompts.is_empty() {
            return Ok(false);
        }
        self.run_prompts(BrushMode::Add)
    }

    fn run_prompts(&mut self, mode: BrushMode) -> Result<bool> {
        let prediction = self.oracle.predict(&self.prompts);
        self.prompts.clear();
        let mask = prediction?;

        let active = self.active_label();
        let policy = self.fill_policy();
        let Some(snapshot) = self.snapshot() else {
            return Ok(false);
        };
        let Some(doc) = self.document.as_mut() else {
            return Ok(false);
        };
        match apply_prediction(&mut doc.raster, &mask, active, mode, policy)? {
            Some(rect) => {
                self.history.push(snapshot);
                self.mark_dirty(Some(rect));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
