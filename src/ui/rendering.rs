//! Canvas painting for the grid, circles, items and intersection highlights.
//!
//! Everything drawn here comes from a [`RenderSnapshot`]; positions in the
//! snapshot are canvas-relative and are offset by the canvas origin.

use super::state::VennApp;
use crate::constants::{GRID_SIZE, LENS_ARC_SEGMENTS, MARKER_RADIUS};
use crate::highlight::IntersectionHighlight;
use crate::snapshot::{ItemSprite, RenderSnapshot, VisibleCircle};
use crate::types::ItemColor;
use eframe::egui;
use eframe::epaint::StrokeKind;

const HIGHLIGHT_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 165, 0);

/// Fill colour of an item sprite.
pub fn item_color32(color: ItemColor) -> egui::Color32 {
    match color {
        ItemColor::Green => egui::Color32::from_rgb(76, 175, 80),
        ItemColor::Blue => egui::Color32::from_rgb(33, 150, 243),
        ItemColor::Red => egui::Color32::from_rgb(244, 67, 54),
        ItemColor::Orange => egui::Color32::from_rgb(255, 152, 0),
        ItemColor::Purple => egui::Color32::from_rgb(156, 39, 176),
        ItemColor::Teal => egui::Color32::from_rgb(0, 150, 136),
        ItemColor::Pink => egui::Color32::from_rgb(233, 30, 99),
    }
}

impl VennApp {
    /// Renders the snapshot in layers: grid, circles (largest first), items,
    /// then highlights on top.
    pub fn render_snapshot(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        snapshot: &RenderSnapshot,
    ) {
        if self.show_grid {
            self.draw_grid(painter, canvas_rect, snapshot);
        }

        for circle in &snapshot.circles {
            self.draw_circle(painter, canvas_rect, circle);
        }

        for sprite in &snapshot.items {
            self.draw_item(painter, canvas_rect, sprite);
        }

        for highlight in &snapshot.highlights {
            self.draw_highlight(painter, canvas_rect, snapshot, highlight);
        }
    }

    /// Draws a zoom-aware grid with emphasized axes.
    pub fn draw_grid(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        snapshot: &RenderSnapshot,
    ) {
        let viewport = &snapshot.viewport;
        let screen_grid_size = GRID_SIZE * viewport.scale;
        if screen_grid_size < 2.0 {
            return;
        }

        let grid_color = egui::Color32::from_rgba_unmultiplied(128, 128, 128, 32);
        let stroke = egui::Stroke::new(1.0, grid_color);
        let top_left = viewport.screen_to_world(egui::Pos2::ZERO);
        let bottom_right = viewport.screen_to_world(canvas_rect.size().to_pos2());

        let mut x = (top_left.x / GRID_SIZE).floor() * GRID_SIZE;
        while x <= bottom_right.x {
            let screen_x = canvas_rect.min.x + viewport.world_to_screen(egui::pos2(x, 0.0)).x;
            painter.line_segment(
                [
                    egui::pos2(screen_x, canvas_rect.min.y),
                    egui::pos2(screen_x, canvas_rect.max.y),
                ],
                stroke,
            );
            x += GRID_SIZE;
        }

        let mut y = (top_left.y / GRID_SIZE).floor() * GRID_SIZE;
        while y <= bottom_right.y {
            let screen_y = canvas_rect.min.y + viewport.world_to_screen(egui::pos2(0.0, y)).y;
            painter.line_segment(
                [
                    egui::pos2(canvas_rect.min.x, screen_y),
                    egui::pos2(canvas_rect.max.x, screen_y),
                ],
                stroke,
            );
            y += GRID_SIZE;
        }

        let origin = canvas_rect.min + viewport.world_to_screen(egui::Pos2::ZERO).to_vec2();
        let axis_stroke =
            egui::Stroke::new(1.5, egui::Color32::from_rgba_unmultiplied(128, 128, 128, 80));
        if canvas_rect.y_range().contains(origin.y) {
            painter.line_segment(
                [
                    egui::pos2(canvas_rect.min.x, origin.y),
                    egui::pos2(canvas_rect.max.x, origin.y),
                ],
                axis_stroke,
            );
        }
        if canvas_rect.x_range().contains(origin.x) {
            painter.line_segment(
                [
                    egui::pos2(origin.x, canvas_rect.min.y),
                    egui::pos2(origin.x, canvas_rect.max.y),
                ],
                axis_stroke,
            );
        }
    }

    /// Draws one circle. Groups get a translucent fill; held circles a
    /// brighter outline.
    pub fn draw_circle(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        circle: &VisibleCircle,
    ) {
        let center = canvas_rect.min + circle.screen_center.to_vec2();
        let (fill, stroke_color) = if circle.is_composite {
            let alpha = (24 + 12 * circle.depth.min(4)) as u8;
            (
                egui::Color32::from_rgba_unmultiplied(100, 150, 255, alpha),
                egui::Color32::from_rgb(100, 150, 255),
            )
        } else if self.dark_mode {
            (
                egui::Color32::from_rgba_unmultiplied(255, 255, 255, 12),
                egui::Color32::from_gray(170),
            )
        } else {
            (
                egui::Color32::from_rgba_unmultiplied(0, 0, 0, 10),
                egui::Color32::from_gray(90),
            )
        };
        let stroke_width = if circle.is_dragging { 3.0 } else { 1.5 };

        painter.circle_filled(center, circle.screen_radius, fill);
        painter.circle_stroke(
            center,
            circle.screen_radius,
            egui::Stroke::new(stroke_width, stroke_color),
        );
    }

    /// Draws an item square centred in its leaf circle.
    pub fn draw_item(&self, painter: &egui::Painter, canvas_rect: egui::Rect, sprite: &ItemSprite) {
        let rect = egui::Rect::from_min_size(
            canvas_rect.min + sprite.screen_min.to_vec2(),
            sprite.screen_size,
        );
        let outline = if self.dark_mode {
            egui::Color32::from_gray(30)
        } else {
            egui::Color32::WHITE
        };
        painter.rect_filled(rect, 2.0, item_color32(sprite.color));
        painter.rect_stroke(rect, 2.0, egui::Stroke::new(1.0, outline), StrokeKind::Outside);
    }

    /// Draws the lens between two circles with a dashed outline and the
    /// clickable "+" marker at its centre.
    pub fn draw_highlight(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        snapshot: &RenderSnapshot,
        highlight: &IntersectionHighlight,
    ) {
        let viewport = &snapshot.viewport;
        let points: Vec<egui::Pos2> = highlight
            .lens
            .outline(LENS_ARC_SEGMENTS)
            .into_iter()
            .map(|world| canvas_rect.min + viewport.world_to_screen(world).to_vec2())
            .collect();
        if points.len() < 3 {
            return;
        }

        let fill = egui::Color32::from_rgba_unmultiplied(255, 165, 0, 76);
        painter.add(egui::Shape::convex_polygon(
            points.clone(),
            fill,
            egui::Stroke::NONE,
        ));

        let mut closed = points;
        closed.push(closed[0]);
        painter.extend(egui::Shape::dashed_line(
            &closed,
            egui::Stroke::new(1.0, HIGHLIGHT_COLOR),
            4.0,
            2.0,
        ));

        let marker = canvas_rect.min + highlight.marker_screen.to_vec2();
        painter.circle_filled(marker, MARKER_RADIUS, egui::Color32::WHITE);
        painter.circle_stroke(marker, MARKER_RADIUS, egui::Stroke::new(2.0, HIGHLIGHT_COLOR));
        painter.text(
            marker,
            egui::Align2::CENTER_CENTER,
            "+",
            egui::FontId::proportional(16.0),
            HIGHLIGHT_COLOR,
        );
    }
}
