use crate::brush_engine::brush::BrushMode;
use crate::brush_engine::stroke::StrokeState;
use crate::editor::state::{EditorState, Tool};
use crate::error::Result;
use crate::regions::morphology::MorphOp;
use crate::segmentation::prompts::PromptMode;
use crate::utils::vector::Vec2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Modifier keys relevant to the editor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Turns a primary action into its secondary variant.
    pub shift: bool,
    /// Magic wand: accumulate prompts instead of sending each click.
    pub append: bool,
}

/// Host-independent input, in canvas coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EditorEvent {
    Press {
        pos: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
    },
    Move {
        pos: Vec2,
        modifiers: Modifiers,
    },
    Release {
        pos: Vec2,
        button: PointerButton,
    },
    /// Positive `delta` zooms in.
    Scroll {
        pos: Vec2,
        delta: f64,
    },
    /// The append modifier was let go; pending prompts are sent.
    AppendReleased,
    /// Pointer left the canvas.
    Leave,
    Resize {
        width: f64,
        height: f64,
    },
    ZoomIn,
    ZoomOut,
    ResetView,
    /// Arrow-key pan; components are -1, 0 or 1.
    Pan {
        dx: f64,
        dy: f64,
    },
    Undo,
}

/// What an ongoing drag is doing.
#[derive(Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// View drag: the origin at press time plus the total pointer delta.
    Panning { anchor: Vec2, origin: (i32, i32) },
    Stroking { stroke: StrokeState },
}

impl EditorState {
    /// Dispatch one input event. Returns `true` when the canvas should be redrawn.
    pub fn handle_event(&mut self, event: EditorEvent) -> bool {
        match self.dispatch(event) {
            Ok(redraw) => redraw,
            Err(err) => {
                self.record_error(&err);
                true
            }
        }
    }

    fn dispatch(&mut self, event: EditorEvent) -> Result<bool> {
        match event {
            EditorEvent::Press { pos, button, modifiers } => self.on_press(pos, button, modifiers),
            EditorEvent::Move { pos, .. } => Ok(self.on_move(pos)),
            EditorEvent::Release { pos, .. } => Ok(self.on_release(pos)),
            EditorEvent::Scroll { pos, delta } => {
                if delta == 0.0 {
                    return Ok(false);
                }
                let factor = if delta > 0.0 {
                    self.config.zoom_in_factor()
                } else {
                    self.config.zoom_out_factor()
                };
                Ok(self.zoom_at(pos, factor))
            }
            EditorEvent::AppendReleased => {
                if self.tool != Tool::MagicWand {
                    return Ok(false);
                }
                self.flush_prompts()?;
                Ok(true)
            }
            EditorEvent::Leave => {
                self.cursor = None;
                Ok(true)
            }
            EditorEvent::Resize { width, height } => Ok(self.resize_canvas(width, height)),
            EditorEvent::ZoomIn => Ok(self.zoom_in()),
            EditorEvent::ZoomOut => Ok(self.zoom_out()),
            EditorEvent::ResetView => {
                self.reset_view();
                Ok(true)
            }
            EditorEvent::Pan { dx, dy } => {
                self.pan_step(dx, dy);
                Ok(true)
            }
            EditorEvent::Undo => Ok(self.undo()),
        }
    }

    fn on_press(&mut self, pos: Vec2, button: PointerButton, modifiers: Modifiers) -> Result<bool> {
        self.cursor = Some(pos);
        if self.document.is_none() {
            return Ok(false);
        }
        let primary = button == PointerButton::Primary && !modifiers.shift;
        let (ix, iy) = self.viewport.screen_to_image(pos);

        match self.tool {
            Tool::None => {
                if button == PointerButton::Primary {
                    self.interaction = Interaction::Panning {
                        anchor: pos,
                        origin: self.viewport.origin(),
                    };
                }
                Ok(false)
            }
            Tool::Brush => Ok(self.begin_stroke(ix, iy, BrushMode::from_add(primary))),
            Tool::ConnectedComponent => Ok(self.component_click(ix, iy, primary)),
            Tool::Smoothing => {
                let op = if primary { MorphOp::Dilate } else { MorphOp::Erode };
                Ok(self.smooth_click(ix, iy, op))
            }
            Tool::MagicWand => {
                let mode = if modifiers.append {
                    PromptMode::MultiPoint
                } else {
                    PromptMode::SinglePoint
                };
                self.magic_click(ix, iy, primary, mode)?;
                Ok(true)
            }
        }
    }

    fn on_move(&mut self, pos: Vec2) -> bool {
        self.cursor = Some(pos);
        match &self.interaction {
            Interaction::Idle => self.tool == Tool::Brush,
            Interaction::Panning { anchor, origin } => {
                let delta = pos - *anchor;
                let origin = *origin;
                self.viewport.set_origin(origin.0, origin.1);
                self.viewport.pan(delta.x, delta.y);
                true
            }
            Interaction::Stroking { .. } => {
                let (ix, iy) = self.viewport.screen_to_image(pos);
                self.continue_stroke(ix, iy);
                true
            }
        }
    }

    fn on_release(&mut self, pos: Vec2) -> bool {
        self.cursor = Some(pos);
        match self.interaction {
            Interaction::Idle => false,
            Interaction::Panning { .. } => {
                self.interaction = Interaction::Idle;
                false
            }
            Interaction::Stroking { .. } => {
                self.end_stroke();
                true
            }
        }
    }
}
