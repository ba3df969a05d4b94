use eframe::egui;

use crate::app::AnnotatorApp;
use crate::app::render_helper::CanvasView;
use crate::canvas::raster::LabelId;
use crate::editor::input::{EditorEvent, Interaction, Modifiers, PointerButton};
use crate::editor::state::Tool;

fn pointer_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        _ => None,
    }
}

fn modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: m.shift,
        append: m.command,
    }
}

fn tool_for_key(key: egui::Key) -> Option<Tool> {
    match key {
        egui::Key::B => Some(Tool::Brush),
        egui::Key::M => Some(Tool::MagicWand),
        egui::Key::C => Some(Tool::ConnectedComponent),
        egui::Key::S => Some(Tool::Smoothing),
        _ => None,
    }
}

fn label_for_key(key: egui::Key) -> Option<LabelId> {
    use egui::Key::*;
    let id = match key {
        Num1 => 1,
        Num2 => 2,
        Num3 => 3,
        Num4 => 4,
        Num5 => 5,
        Num6 => 6,
        Num7 => 7,
        Num8 => 8,
        Num9 => 9,
        _ => return None,
    };
    Some(id)
}

/// Translate this frame's egui events into editor events.
pub fn handle_input(app: &mut AnnotatorApp, ctx: &egui::Context, view: &CanvasView) {
    let events = ctx.input(|i| i.events.clone());
    let typing = ctx.wants_keyboard_input();
    let mut redraw = false;

    for event in events {
        match event {
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                modifiers: m,
            } => {
                let Some(button) = pointer_button(button) else {
                    continue;
                };
                let pos_canvas = view.to_canvas(pos);
                if pressed {
                    if view.rect.contains(pos) && view.response.hovered() {
                        redraw |= app.editor.handle_event(EditorEvent::Press {
                            pos: pos_canvas,
                            button,
                            modifiers: modifiers(m),
                        });
                    }
                } else {
                    redraw |= app.editor.handle_event(EditorEvent::Release {
                        pos: pos_canvas,
                        button,
                    });
                }
            }
            egui::Event::PointerMoved(pos) => {
                let dragging = !matches!(app.editor.interaction(), Interaction::Idle);
                let event = if view.rect.contains(pos) || dragging {
                    EditorEvent::Move {
                        pos: view.to_canvas(pos),
                        modifiers: modifiers(ctx.input(|i| i.modifiers)),
                    }
                } else {
                    EditorEvent::Leave
                };
                redraw |= app.editor.handle_event(event);
            }
            egui::Event::PointerGone => {
                redraw |= app.editor.handle_event(EditorEvent::Leave);
            }
            egui::Event::Key {
                key,
                pressed: true,
                modifiers: m,
                ..
            } if !typing => {
                redraw |= handle_key(app, ctx, key, m);
            }
            _ => {}
        }
    }

    let scroll = ctx.input(|i| i.raw_scroll_delta.y);
    if scroll != 0.0 && view.response.hovered() {
        if let Some(pos) = ctx.input(|i| i.pointer.hover_pos()) {
            redraw |= app.editor.handle_event(EditorEvent::Scroll {
                pos: view.to_canvas(pos),
                delta: scroll as f64,
            });
        }
    }

    let append_held = ctx.input(|i| i.modifiers.command);
    if app.append_held && !append_held {
        redraw |= app.editor.handle_event(EditorEvent::AppendReleased);
    }
    app.append_held = append_held;

    if redraw {
        ctx.request_repaint();
    }
}

fn handle_key(app: &mut AnnotatorApp, ctx: &egui::Context, key: egui::Key, m: egui::Modifiers) -> bool {
    if m.command {
        return match key {
            egui::Key::Z => app.editor.handle_event(EditorEvent::Undo),
            egui::Key::S => {
                app.save_mask();
                true
            }
            egui::Key::Q => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                false
            }
            _ => false,
        };
    }

    let event = match key {
        egui::Key::Plus | egui::Key::Equals => Some(EditorEvent::ZoomIn),
        egui::Key::Minus => Some(EditorEvent::ZoomOut),
        egui::Key::Num0 => Some(EditorEvent::ResetView),
        egui::Key::ArrowLeft => Some(EditorEvent::Pan { dx: 1.0, dy: 0.0 }),
        egui::Key::ArrowRight => Some(EditorEvent::Pan { dx: -1.0, dy: 0.0 }),
        egui::Key::ArrowUp => Some(EditorEvent::Pan { dx: 0.0, dy: 1.0 }),
        egui::Key::ArrowDown => Some(EditorEvent::Pan { dx: 0.0, dy: -1.0 }),
        _ => None,
    };
    if let Some(event) = event {
        return app.editor.handle_event(event);
    }

    if let Some(tool) = tool_for_key(key) {
        return app.editor.select_tool(tool);
    }
    if let Some(id) = label_for_key(key) {
        if app.editor.registry().contains(id) {
            return app.editor.set_active_label(Some(id));
        }
    }
    false
}
