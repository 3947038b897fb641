//! Tunable layout parameters.
//!
//! Every constant in [`crate::constants`] that influences grouping, physics or
//! the viewport is mirrored here so a host can override it from JSON. Missing
//! fields fall back to the defaults.

use crate::constants;
use crate::geometry;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Layout engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Radius of an empty circle before the item term.
    pub base_radius: f32,
    /// Multiplier `k` of the radius formula.
    pub radius_scale: f32,
    /// Required overlap before two circles merge.
    pub overlap_margin: f32,
    /// Gap kept between siblings by the repulsion term.
    pub spacing: f32,
    /// Saturated pull toward the group centre.
    pub center_pull: f32,
    /// Repulsion per unit of penetration.
    pub repulsion: f32,
    /// Distance at which the centre pull saturates.
    pub max_center_distance: f32,
    /// Lower zoom bound.
    pub min_zoom: f32,
    /// Upper zoom bound.
    pub max_zoom: f32,
    /// Zoom change per wheel event.
    pub zoom_step: f32,
    /// Culling margin in world units.
    pub viewport_padding: f32,
    /// Physics tick length in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_radius: constants::BASE_CIRCLE_RADIUS,
            radius_scale: constants::RADIUS_SCALE,
            overlap_margin: constants::OVERLAP_MARGIN,
            spacing: constants::CIRCLE_SPACING,
            center_pull: constants::CENTER_PULL,
            repulsion: constants::REPULSION,
            max_center_distance: constants::MAX_CENTER_DISTANCE,
            min_zoom: constants::MIN_ZOOM,
            max_zoom: constants::MAX_ZOOM,
            zoom_step: constants::ZOOM_STEP,
            viewport_padding: constants::VIEWPORT_PADDING,
            tick_interval_ms: constants::TICK_INTERVAL.as_millis() as u64,
        }
    }
}

impl LayoutConfig {
    /// Deserialize a config from JSON. Fields that are absent keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the config to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns a copy with every value clamped into a range where the
    /// relaxation loop stays stable and the viewport bounds make sense.
    pub fn sanitized(&self) -> Self {
        let min_zoom = if self.min_zoom.is_finite() && self.min_zoom > 0.0 {
            self.min_zoom
        } else {
            constants::MIN_ZOOM
        };
        let max_zoom = if self.max_zoom.is_finite() {
            self.max_zoom.max(min_zoom)
        } else {
            constants::MAX_ZOOM.max(min_zoom)
        };

        Self {
            base_radius: self.base_radius.max(0.0),
            radius_scale: self.radius_scale.max(f32::EPSILON),
            overlap_margin: self.overlap_margin.max(0.0),
            spacing: self.spacing.max(0.0),
            center_pull: self.center_pull.clamp(0.0, 1.0),
            repulsion: self.repulsion.clamp(0.0, 0.01),
            max_center_distance: self.max_center_distance.max(1.0),
            min_zoom,
            max_zoom,
            zoom_step: self.zoom_step.abs().max(0.001),
            viewport_padding: self.viewport_padding.max(0.0),
            tick_interval_ms: self.tick_interval_ms.max(1),
        }
    }

    /// Radius of a circle holding `item_count` items in total.
    pub fn radius_for(&self, item_count: usize) -> f32 {
        geometry::radius_for(item_count, self.base_radius, self.radius_scale)
    }

    /// The physics tick as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Clamp a zoom factor into `[min_zoom, max_zoom]`.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
