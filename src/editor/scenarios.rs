//! End-to-end editing sessions driven through [`EditorState`].

use std::thread;
use std::time::Duration;

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::brush_engine::brush::BrushMode;
use crate::canvas::raster::{BoolMask, LabelRaster};
use crate::config::EditorConfig;
use crate::editor::state::{EditorState, Tool};
use crate::error::{AnnotatorError, Result};
use crate::io::image_loader::WorkingImage;
use crate::regions::flood::flood;
use crate::regions::morphology::MorphOp;
use crate::segmentation::oracle::SegmentationOracle;
use crate::segmentation::prompts::PromptMode;

fn session(w: u32, h: u32) -> EditorState {
    let mut editor = EditorState::new(EditorConfig::default());
    editor.resize_canvas(w as f64, h as f64);
    editor.load_image(WorkingImage::from_rgb(RgbImage::new(w, h), None), None);
    editor
}

fn cells(editor: &EditorState) -> Vec<u8> {
    editor.raster().map(|r| r.cells().to_vec()).unwrap_or_default()
}

#[test]
fn paint_flood_dilate_then_undo_to_empty() {
    let mut editor = session(10, 10);
    assert_eq!(editor.add_label("A"), Some(1));
    editor.set_brush_size(5);
    assert_eq!(editor.brush().radius(), 2);

    assert!(editor.begin_stroke(5, 5, BrushMode::Add));
    editor.end_stroke();

    let raster = editor.raster().unwrap();
    let disk = BoolMask::from_fn(10, 10, |x, y| {
        let (dx, dy) = (x as i32 - 5, y as i32 - 5);
        dx * dx + dy * dy <= 4
    });
    for y in 0..10 {
        for x in 0..10 {
            let want = if disk.get(x, y) { 1 } else { 0 };
            assert_eq!(raster.get(x, y), Some(want), "cell ({x}, {y})");
        }
    }
    assert_eq!(flood(raster, 5, 5, 1), disk);

    assert!(editor.smooth_click(5, 5, MorphOp::Dilate));
    let grown = editor.raster().unwrap().mask_of(1);
    assert!(disk.is_subset_of(&grown));
    assert!(grown.count() > disk.count());

    assert!(editor.undo());
    assert!(editor.undo());
    assert!(editor.raster().unwrap().cells().iter().all(|&c| c == 0));
}

#[test]
fn freed_label_id_is_reused() {
    let mut editor = session(8, 8);
    let ids: Vec<_> = ["a", "b", "c"].iter().filter_map(|n| editor.add_label(*n)).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(editor.clear_label(2));
    assert_eq!(editor.add_label("d"), Some(2));
    assert_eq!(editor.registry().name(2), Some("d"));
}

#[test]
fn only_the_last_undo_depth_actions_can_be_undone() {
    let mut editor = session(32, 32);
    editor.add_label("a");
    editor.set_brush_size(5);
    let depth = editor.config.undo_depth;

    for i in 0..depth + 3 {
        let x = (i % 8) as i32 * 4 + 2;
        let y = (i / 8) as i32 * 4 + 2;
        assert!(editor.begin_stroke(x, y, BrushMode::Add));
        editor.end_stroke();
    }
    assert_eq!(editor.undo_len(), depth);

    for _ in 0..depth {
        assert!(editor.undo());
    }
    assert!(!editor.undo());
    // the three oldest strokes fell off the history and remain painted
    assert!(editor.raster().unwrap().count(1) > 0);
}

#[test]
fn random_edits_undo_back_to_the_start() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut editor = session(48, 48);
    editor.add_label("a");
    editor.add_label("b");
    editor.set_brush_size(9);

    for _ in 0..20 {
        let start = cells(&editor);
        let n = rng.random_range(1..=editor.config.undo_depth);
        let mut applied = 0;
        for _ in 0..n {
            let x = rng.random_range(0..48);
            let y = rng.random_range(0..48);
            let changed = match rng.random_range(0..4) {
                0 => {
                    let mode = BrushMode::from_add(rng.random_bool(0.7));
                    let ok = editor.begin_stroke(x, y, mode);
                    if ok {
                        editor.continue_stroke(rng.random_range(0..48), rng.random_range(0..48));
                        editor.end_stroke();
                    }
                    ok
                }
                1 => editor.component_click(x, y, rng.random_bool(0.5)),
                2 => {
                    let op = if rng.random_bool(0.5) { MorphOp::Dilate } else { MorphOp::Erode };
                    editor.smooth_click(x, y, op)
                }
                _ => {
                    // switching labels is not an edit
                    editor.set_active_label(Some(rng.random_range(1..=2)));
                    false
                }
            };
            if changed {
                applied += 1;
            }
        }
        for _ in 0..applied {
            assert!(editor.undo());
        }
        assert_eq!(cells(&editor), start);
    }
}

#[test]
fn saved_mask_reloads_into_a_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene_mask.png");

    let mut editor = session(24, 16);
    editor.add_label("road");
    editor.set_brush_size(7);
    editor.begin_stroke(6, 6, BrushMode::Add);
    editor.end_stroke();
    editor.add_label("car");
    editor.begin_stroke(18, 10, BrushMode::Add);
    editor.end_stroke();
    editor.save_mask(&path).unwrap();

    let mut other = session(24, 16);
    other.load_mask(&path).unwrap();
    assert_eq!(cells(&other), cells(&editor));
    assert_eq!(other.registry().len(), 2);
    assert_eq!(other.registry().color(1), editor.registry().color(1));
    assert_eq!(other.registry().color(2), editor.registry().color(2));

    // loading is one undoable action
    assert!(other.undo());
    assert!(other.registry().is_empty());
    assert!(other.raster().unwrap().cells().iter().all(|&c| c == 0));
}

#[test]
fn mask_of_another_size_is_resampled_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("half_mask.png");

    let mut small = session(8, 8);
    small.add_label("a");
    small.set_only_on_empty(true);
    small.component_click(0, 0, false);
    assert_eq!(small.raster().unwrap().count(1), 64);
    small.save_mask(&path).unwrap();

    let mut large = session(16, 16);
    large.load_mask(&path).unwrap();
    assert_eq!(large.raster().unwrap().count(1), 256);
}

#[test]
fn downscaled_image_mask_survives_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide_mask.png");
    let open = |editor: &mut EditorState| {
        let working = WorkingImage::from_rgb(RgbImage::new(1500, 60), Some(1024));
        editor.load_image(working, None);
    };

    let mut editor = EditorState::new(EditorConfig::default());
    open(&mut editor);
    assert_eq!(editor.document().unwrap().original_size, (1500, 60));
    let (w, h) = {
        let raster = editor.raster().unwrap();
        (raster.width(), raster.height())
    };
    assert!(w < 1500 && h < 60);

    editor.add_label("thin");
    editor.set_brush_size(5);
    for x in (3..w as i32 - 3).step_by(7) {
        assert!(editor.begin_stroke(x, h as i32 / 2, BrushMode::Add));
        editor.end_stroke();
    }
    editor.add_label("edge");
    editor.begin_stroke(w as i32 - 1, h as i32 - 1, BrushMode::Add);
    editor.end_stroke();
    editor.save_mask(&path).unwrap();

    let mut other = EditorState::new(EditorConfig::default());
    open(&mut other);
    other.load_mask(&path).unwrap();
    assert_eq!(cells(&other), cells(&editor));
}

/// Remembers the size of the last image and selects everything. Initializing
/// an image whose top-left pixel is red takes a while.
struct SlowOracle {
    size: Option<(usize, usize)>,
}

impl SegmentationOracle for SlowOracle {
    fn set_image(&mut self, image: &RgbImage) -> Result<()> {
        if image.get_pixel(0, 0) == &Rgb([255, 0, 0]) {
            thread::sleep(Duration::from_millis(200));
        }
        self.size = Some((image.width() as usize, image.height() as usize));
        Ok(())
    }

    fn predict(&mut self, _points: &[(i32, i32)], _labels: &[u8]) -> Result<BoolMask> {
        let (w, h) = self.size.ok_or(AnnotatorError::OracleNotReady)?;
        Ok(BoolMask::from_fn(w, h, |_, _| true))
    }
}

#[test]
fn switching_images_mid_initialization_uses_the_newest() {
    let mut editor = EditorState::with_oracle(EditorConfig::default(), Box::new(SlowOracle { size: None }));
    editor.resize_canvas(32.0, 32.0);

    let slow = RgbImage::from_pixel(20, 20, Rgb([255, 0, 0]));
    editor.load_image(WorkingImage::from_rgb(slow, None), None);
    editor.load_image(WorkingImage::from_rgb(RgbImage::new(12, 6), None), None);
    assert!(!editor.oracle_ready());

    assert!(editor.oracle().wait_ready(Duration::from_secs(5)));
    // late events of the first image must not flip readiness
    thread::sleep(Duration::from_millis(250));
    editor.poll_oracle();
    assert!(editor.oracle_ready());

    editor.add_label("a");
    assert!(editor.select_tool(Tool::MagicWand));
    assert!(editor.magic_click(3, 3, true, PromptMode::SinglePoint).unwrap());
    assert_eq!(editor.raster().unwrap().count(1), 12 * 6);
}

struct BrokenOracle;

impl SegmentationOracle for BrokenOracle {
    fn set_image(&mut self, _image: &RgbImage) -> Result<()> {
        Err(AnnotatorError::Oracle("weights missing".to_string()))
    }

    fn predict(&mut self, _points: &[(i32, i32)], _labels: &[u8]) -> Result<BoolMask> {
        Err(AnnotatorError::OracleNotReady)
    }
}

#[test]
fn failed_initialization_keeps_magic_wand_disabled() {
    let mut editor = EditorState::with_oracle(EditorConfig::default(), Box::new(BrokenOracle));
    editor.load_image(WorkingImage::from_rgb(RgbImage::new(4, 4), None), None);
    assert!(!editor.oracle().wait_ready(Duration::from_secs(5)));
    assert!(editor.oracle().last_error().is_some_and(|e| e.contains("weights missing")));
    assert!(!editor.select_tool(Tool::MagicWand));

    // the rest of the editor keeps working
    editor.add_label("a");
    editor.set_only_on_empty(true);
    assert!(editor.component_click(0, 0, false));
    let raster: &LabelRaster = editor.raster().unwrap();
    assert_eq!(raster.count(1), 16);
}
