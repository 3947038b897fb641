//! Pan/zoom transform and visibility culling.
//!
//! Screen space has its origin at the canvas top-left corner and
//! `screen = world * scale + pan`.

use crate::config::LayoutConfig;
use crate::constants::DEFAULT_SPAWN;
use crate::store::EntityStore;
use crate::types::CircleId;
use eframe::egui::{pos2, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Current pan offset, zoom factor and (once known) canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen-space translation applied after scaling
    pub pan: Vec2,
    /// Zoom factor, kept within the configured bounds
    pub scale: f32,
    /// Canvas size in screen pixels, `None` until the host reports it
    pub size: Option<Vec2>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
            size: None,
        }
    }
}

impl Viewport {
    /// Converts canvas-relative screen coordinates to world coordinates.
    pub fn screen_to_world(&self, screen_pos: Pos2) -> Pos2 {
        (screen_pos - self.pan) / self.scale
    }

    /// Converts world coordinates to canvas-relative screen coordinates.
    pub fn world_to_screen(&self, world_pos: Pos2) -> Pos2 {
        world_pos * self.scale + self.pan
    }

    /// World point shown at the middle of the canvas, or the default spawn
    /// point when the canvas size is not known yet.
    pub fn center_world(&self) -> Pos2 {
        match self.size {
            Some(size) => self.screen_to_world((size / 2.0).to_pos2()),
            None => pos2(DEFAULT_SPAWN.0, DEFAULT_SPAWN.1),
        }
    }

    /// Visible world rectangle grown by `padding` world units on every side.
    pub fn visible_world_rect(&self, padding: f32) -> Option<Rect> {
        let size = self.size?;
        let min = self.screen_to_world(Pos2::ZERO);
        let max = self.screen_to_world(size.to_pos2());
        Some(Rect::from_min_max(min, max).expand(padding))
    }

    /// Translates the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Sets the zoom factor while keeping the world point under `anchor` fixed.
    ///
    /// Returns `true` if the scale changed.
    pub fn zoom_at(&mut self, anchor: Pos2, scale: f32, config: &LayoutConfig) -> bool {
        let new_scale = config.clamp_zoom(scale);
        if (new_scale - self.scale).abs() <= f32::EPSILON {
            return false;
        }
        let world_under_anchor = self.screen_to_world(anchor);
        self.scale = new_scale;
        self.pan = anchor.to_vec2() - world_under_anchor.to_vec2() * new_scale;
        true
    }

    /// One zoom step in the direction of `scroll`; positive scroll zooms in.
    pub fn wheel_zoom(&mut self, anchor: Pos2, scroll: f32, config: &LayoutConfig) -> bool {
        if scroll == 0.0 || !scroll.is_finite() {
            return false;
        }
        let step = config.zoom_step.copysign(scroll);
        self.zoom_at(anchor, self.scale + step, config)
    }

    /// One zoom step in, anchored at the canvas centre.
    pub fn zoom_in(&mut self, config: &LayoutConfig) -> bool {
        self.zoom_at(self.screen_center(), self.scale + config.zoom_step, config)
    }

    /// One zoom step out, anchored at the canvas centre.
    pub fn zoom_out(&mut self, config: &LayoutConfig) -> bool {
        self.zoom_at(self.screen_center(), self.scale - config.zoom_step, config)
    }

    fn screen_center(&self) -> Pos2 {
        self.size
            .map(|size| (size / 2.0).to_pos2())
            .unwrap_or(Pos2::ZERO)
    }
}

/// Transform captured when a two-finger pinch starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchGesture {
    initial_scale: f32,
    initial_pan: Vec2,
}

impl PinchGesture {
    /// Records the transform the pinch is relative to.
    pub fn begin(viewport: &Viewport) -> Self {
        Self {
            initial_scale: viewport.scale,
            initial_pan: viewport.pan,
        }
    }

    /// Applies the cumulative pinch `ratio` around `center`.
    pub fn apply(&self, viewport: &mut Viewport, center: Pos2, ratio: f32, config: &LayoutConfig) {
        if !ratio.is_finite() || ratio <= 0.0 {
            return;
        }
        let world_under_center = (center - self.initial_pan) / self.initial_scale;
        let scale = config.clamp_zoom(self.initial_scale * ratio);
        viewport.scale = scale;
        viewport.pan = center.to_vec2() - world_under_center.to_vec2() * scale;
    }
}

/// Ids of circles whose bounding box reaches into the padded visible area,
/// largest first so nested circles paint on top of their groups.
///
/// With no known canvas size every circle is kept.
pub fn cull(store: &EntityStore, viewport: &Viewport, padding: f32) -> Vec<CircleId> {
    let bounds = viewport.visible_world_rect(padding);

    let mut visible: Vec<_> = store
        .circles()
        .filter(|circle| match bounds {
            Some(rect) => {
                let r = circle.radius;
                let p = circle.position;
                p.x - r < rect.max.x
                    && p.x + r > rect.min.x
                    && p.y - r < rect.max.y
                    && p.y + r > rect.min.y
            }
            None => true,
        })
        .collect();

    visible.sort_by(|a, b| b.radius.total_cmp(&a.radius).then(a.seq.cmp(&b.seq)));
    visible.into_iter().map(|circle| circle.id).collect()
}

/// Canvas-relative position of an absolute egui pointer position.
pub fn canvas_relative(canvas: Rect, absolute: Pos2) -> Pos2 {
    (absolute - canvas.min).to_pos2()
}
