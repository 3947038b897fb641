//! Canvas input handling: grabbing circles, panning, wheel zoom and pinch.
//!
//! egui reports absolute pointer positions; the engine works in positions
//! relative to the canvas top-left corner, so every event is converted with
//! [`canvas_relative`] before it is forwarded.

use super::state::VennApp;
use crate::drag::PointerId;
use crate::viewport::canvas_relative;
use eframe::egui;

impl VennApp {
    /// Allocates the canvas, forwards this frame's input to the engine and
    /// paints the resulting snapshot.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        self.canvas_rect = Some(canvas_rect);
        self.engine.set_viewport_size(canvas_rect.size());

        // Put the world origin at the canvas centre on the first frame
        if !self.view_centered {
            self.engine.pan_by(canvas_rect.size() / 2.0);
            self.view_centered = true;
        }

        let pinching = self.handle_canvas_pinch(ui);
        if !pinching {
            self.handle_canvas_zoom(ui, &response);
            self.handle_canvas_pointer(ui, &response);
        }

        let snapshot = self.engine.snapshot();
        self.render_snapshot(&painter, canvas_rect, &snapshot);
    }

    /// Handles scroll wheel zooming anchored at the mouse cursor.
    ///
    /// Each wheel event is one zoom step, however egui spreads its smoothed
    /// scroll over later frames.
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let wheel_deltas: Vec<f32> = ui.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::MouseWheel { delta, .. } if delta.y != 0.0 => Some(delta.y),
                    _ => None,
                })
                .collect()
        });
        if wheel_deltas.is_empty() {
            return;
        }

        let mouse_pos = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos());
        if let Some(mouse_pos) = mouse_pos {
            if !response.rect.contains(mouse_pos) {
                return;
            }
            let anchor = canvas_relative(response.rect, mouse_pos);
            for delta in wheel_deltas {
                self.engine.wheel_zoom(anchor, delta);
            }
        }
    }

    /// Handles two-finger pinch zoom. Returns `true` while a pinch is active.
    fn handle_canvas_pinch(&mut self, ui: &mut egui::Ui) -> bool {
        let Some(touch) = ui.input(|i| i.multi_touch()) else {
            if self.interaction.pinch_ratio.take().is_some() {
                self.engine.end_pinch();
            }
            return false;
        };
        let Some(canvas_rect) = self.canvas_rect else {
            return false;
        };

        if self.interaction.pinch_ratio.is_none() {
            // A pinch takes over from any single-pointer gesture
            self.release_primary();
            self.engine.begin_pinch();
        }
        let ratio = self.interaction.pinch_ratio.unwrap_or(1.0) * touch.zoom_delta;
        self.interaction.pinch_ratio = Some(ratio);
        self.engine
            .update_pinch(canvas_relative(canvas_rect, touch.center_pos), ratio);
        true
    }

    /// Handles the primary button: grab and drag circles, click intersection
    /// markers, or pan when pressing empty canvas.
    pub fn handle_canvas_pointer(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        if !ui.input(|i| i.pointer.primary_down()) {
            self.release_primary();
            return;
        }
        let Some(current_pos) = response.interact_pointer_pos() else {
            return;
        };
        let screen = canvas_relative(response.rect, current_pos);

        if self.interaction.held_circle.is_some() {
            self.engine.pointer_move(PointerId::MOUSE, screen);
        } else if self.interaction.is_panning {
            if let Some(last_pos) = self.interaction.last_pan_pos {
                self.engine.pan_by(current_pos - last_pos);
            }
            self.interaction.last_pan_pos = Some(current_pos);
        } else if !self.interaction.marker_pressed {
            // New press
            if let Some(pair) = self.engine.click_marker(screen) {
                self.last_marker_click = Some(pair);
                self.interaction.marker_pressed = true;
            } else if let Some(circle) = self.engine.pointer_down_at(PointerId::MOUSE, screen) {
                self.interaction.held_circle = Some(circle);
            } else {
                self.interaction.is_panning = true;
                self.interaction.last_pan_pos = Some(current_pos);
            }
        }
    }

    /// Ends whatever the primary button was doing. A held circle always goes
    /// through the engine's release path so grouping runs.
    fn release_primary(&mut self) {
        if self.interaction.held_circle.take().is_some() {
            if let Some(report) = self.engine.pointer_up(PointerId::MOUSE) {
                if !report.is_empty() {
                    log::debug!("Release produced {} merges", report.merges.len());
                }
            }
        }
        self.interaction.is_panning = false;
        self.interaction.last_pan_pos = None;
        self.interaction.marker_pressed = false;
    }
}
