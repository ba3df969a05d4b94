use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::brush_engine::brush::{MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::canvas::history::UNDO_DEPTH;
use crate::io::image_loader::MAX_RESOLUTION;
use crate::regions::morphology::DEFAULT_KERNEL;
use crate::render::compositor::OVERLAY_ALPHA;
use crate::render::throttle::REFRESH_INTERVAL;
use crate::segmentation::oracle::DEFAULT_TOLERANCE;

/// Tunables of an editing session.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorConfig {
    /// Longest working-image axis; `None` keeps full resolution.
    pub max_resolution: Option<u32>,
    pub undo_depth: usize,
    /// Initial brush diameter in image pixels.
    pub brush_size: u32,
    pub smoothing_kernel: usize,
    pub overlay_alpha: u8,
    /// Minimum time between redraws while stroking.
    pub refresh_interval: Duration,
    /// Zoom-in factor; zooming out uses `2 - zoom_step`.
    pub zoom_step: f64,
    /// Arrow-key pan distance in screen pixels.
    pub pan_step: f64,
    pub oracle_tolerance: u8,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_resolution: Some(MAX_RESOLUTION),
            undo_depth: UNDO_DEPTH,
            brush_size: 30,
            smoothing_kernel: DEFAULT_KERNEL,
            overlay_alpha: OVERLAY_ALPHA,
            refresh_interval: REFRESH_INTERVAL,
            zoom_step: 1.1,
            pan_step: 20.0,
            oracle_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl EditorConfig {
    pub fn zoom_in_factor(&self) -> f64 {
        self.zoom_step
    }

    pub fn zoom_out_factor(&self) -> f64 {
        2.0 - self.zoom_step
    }
}

/// Command line of the annotator binary.
#[derive(Parser, Debug)]
#[command(about = "Paint, fill and segment label masks over an image", version)]
pub struct CliArgs {
    /// Image to open on startup
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Mask file to load on top of the image
    #[arg(long, requires = "image")]
    pub mask: Option<PathBuf>,

    /// Cap on the longer axis of the working image
    #[arg(long, default_value_t = MAX_RESOLUTION)]
    pub max_res: u32,

    /// Edit at full resolution
    #[arg(long, conflicts_with = "max_res")]
    pub no_downscale: bool,

    /// Number of undoable actions kept
    #[arg(long, default_value_t = UNDO_DEPTH)]
    pub undo_depth: usize,

    /// Initial brush diameter
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(MIN_BRUSH_SIZE as i64..=MAX_BRUSH_SIZE as i64))]
    pub brush_size: u32,

    /// Where saved masks go; defaults to `<image>_mask.png`
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl CliArgs {
    pub fn to_config(&self) -> EditorConfig {
        EditorConfig {
            max_resolution: (!self.no_downscale).then_some(self.max_res),
            undo_depth: self.undo_depth,
            brush_size: self.brush_size,
            ..EditorConfig::default()
        }
    }
}
