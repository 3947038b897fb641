//! The layout engine as seen by a host.
//!
//! [`VennEngine`] owns the entity store and serializes every mutation coming
//! from the three input sources (physics ticks, pointer events, viewport
//! gestures). Hosts feed it normalized events and read back a
//! [`RenderSnapshot`] each frame.

use crate::config::LayoutConfig;
use crate::constants::{ITEM_SIZE, MARKER_RADIUS};
use crate::drag::{DragController, DragOutcome, DragState, PointerId};
use crate::grouping::CommitReport;
use crate::highlight::IntersectionHighlight;
use crate::physics::{self, PhysicsTicker};
use crate::snapshot::{build_forest, forest_json, ForestNode, RenderSnapshot};
use crate::store::EntityStore;
use crate::types::*;
use crate::viewport::{PinchGesture, Viewport};
use eframe::egui::{Pos2, Vec2};
use std::time::Duration;
use uuid::Uuid;

/// Circle grouping and layout engine.
#[derive(Debug, Clone)]
pub struct VennEngine {
    config: LayoutConfig,
    store: EntityStore,
    drag: DragController,
    viewport: Viewport,
    pinch: Option<PinchGesture>,
    ticker: PhysicsTicker,
    mounted: bool,
}

impl Default for VennEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl VennEngine {
    /// Creates an unmounted engine working on a sanitized copy of `config`.
    pub fn new(config: LayoutConfig) -> Self {
        let config = config.sanitized();
        let ticker = PhysicsTicker::new(config.tick_interval());
        let viewport = Viewport {
            scale: config.clamp_zoom(1.0),
            ..Default::default()
        };
        Self {
            config,
            store: EntityStore::new(),
            drag: DragController::new(),
            viewport,
            pinch: None,
            ticker,
            mounted: false,
        }
    }

    /// The sanitized layout config.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Read-only access to the entity store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Current pan and zoom.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Whether the physics clock is running.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Drag state of `pointer`.
    pub fn drag_state(&self, pointer: PointerId) -> DragState {
        self.drag.state(pointer)
    }

    /// True while any pointer holds a circle.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Starts the physics ticker.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.ticker.start();
        log::debug!("Layout engine mounted");
    }

    /// Stops the physics ticker and releases every pointer through the
    /// normal release path.
    pub fn unmount(&mut self) {
        self.ticker.stop();
        self.pinch = None;
        if let Some(report) = self.drag.release_all(&mut self.store, &self.config) {
            log::debug!("Released held circles on unmount ({} merges)", report.merges.len());
        }
        self.mounted = false;
        log::debug!("Layout engine unmounted");
    }

    /// Reports the canvas size in screen pixels.
    pub fn set_viewport_size(&mut self, size: Vec2) {
        if size.x > 0.0 && size.y > 0.0 && size.is_finite() {
            self.viewport.size = Some(size);
        }
    }

    /// Creates an item in a new leaf circle at the centre of the view.
    ///
    /// Before the canvas size is known the circle is placed at the default
    /// spawn point.
    pub fn add_item(&mut self) -> (ItemId, CircleId) {
        let circle_id = Uuid::new_v4();
        let color = ItemColor::for_index(self.store.item_count());
        let item = Item::new(circle_id, ITEM_SIZE, color);
        let item_id = item.id;
        let position = self.viewport.center_world();
        let seq = self.store.next_seq();

        self.store.insert_circle(Circle::leaf(
            circle_id,
            position,
            item_id,
            self.config.radius_for(1),
            seq,
        ));
        self.store.insert_item(item);

        log::info!(
            "Added {} item {} at ({:.1}, {:.1})",
            color.name(),
            item_id,
            position.x,
            position.y
        );
        (item_id, circle_id)
    }

    /// Grabs `circle` with `pointer` at canvas position `screen`.
    pub fn pointer_down(&mut self, pointer: PointerId, circle: CircleId, screen: Pos2) -> bool {
        self.drag.grab(&mut self.store, pointer, circle, screen)
    }

    /// Grabs whichever circle is drawn on top at canvas position `screen`.
    pub fn pointer_down_at(&mut self, pointer: PointerId, screen: Pos2) -> Option<CircleId> {
        let world = self.viewport.screen_to_world(screen);
        let circle = self.store.circle_at(world)?;
        self.pointer_down(pointer, circle, screen).then_some(circle)
    }

    /// Moves the circle held by `pointer`.
    pub fn pointer_move(&mut self, pointer: PointerId, screen: Pos2) -> DragOutcome {
        let outcome = self.drag.drag_to(
            &mut self.store,
            &self.viewport,
            &self.config,
            pointer,
            screen,
        );
        if let DragOutcome::Detached { from, dissolved } = outcome {
            log::debug!("Pointer {:?} pulled a circle out of {} (dissolved: {})", pointer, from, dissolved);
        }
        outcome
    }

    /// Releases `pointer` and commits any new overlaps.
    pub fn pointer_up(&mut self, pointer: PointerId) -> Option<CommitReport> {
        self.drag.release(&mut self.store, &self.config, pointer)
    }

    /// Pans the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
    }

    /// One wheel zoom step anchored at `anchor`.
    pub fn wheel_zoom(&mut self, anchor: Pos2, scroll: f32) -> bool {
        self.viewport.wheel_zoom(anchor, scroll, &self.config)
    }

    /// Zooms in one step around the canvas centre.
    pub fn zoom_in(&mut self) -> bool {
        self.viewport.zoom_in(&self.config)
    }

    /// Zooms out one step around the canvas centre.
    pub fn zoom_out(&mut self) -> bool {
        self.viewport.zoom_out(&self.config)
    }

    /// Starts a pinch relative to the current transform.
    pub fn begin_pinch(&mut self) {
        self.pinch = Some(PinchGesture::begin(&self.viewport));
    }

    /// Applies the cumulative pinch `ratio` around `center`. Starts a pinch
    /// implicitly if none is active.
    pub fn update_pinch(&mut self, center: Pos2, ratio: f32) {
        let gesture = *self
            .pinch
            .get_or_insert_with(|| PinchGesture::begin(&self.viewport));
        gesture.apply(&mut self.viewport, center, ratio, &self.config);
    }

    /// Ends the active pinch, keeping the current transform.
    pub fn end_pinch(&mut self) {
        self.pinch = None;
    }

    /// Whether a pinch is active.
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Runs the physics ticks that are due after `elapsed` wall time.
    ///
    /// Returns the number of ticks run; zero while unmounted.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let ticks = self.ticker.advance(elapsed);
        for _ in 0..ticks {
            physics::step(&mut self.store, &self.config);
        }
        ticks
    }

    /// Runs one physics tick immediately. Returns `true` if anything moved.
    pub fn tick(&mut self) -> bool {
        physics::step(&mut self.store, &self.config)
    }

    /// The current frame view.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::build(&self.store, &self.viewport, &self.config)
    }

    /// The debug hierarchy.
    pub fn forest(&self) -> Vec<ForestNode> {
        build_forest(&self.store)
    }

    /// The debug hierarchy as JSON.
    pub fn forest_json(&self) -> Result<String, serde_json::Error> {
        forest_json(&self.store)
    }

    /// The intersection marker under canvas position `screen`, if any.
    pub fn marker_at(&self, screen: Pos2) -> Option<IntersectionHighlight> {
        self.snapshot().marker_at(screen, MARKER_RADIUS).cloned()
    }

    /// Reports a click at `screen` on an intersection marker. Clicking never
    /// merges anything; the pair is only handed back to the host.
    pub fn click_marker(&self, screen: Pos2) -> Option<(CircleId, CircleId)> {
        let highlight = self.marker_at(screen)?;
        let (a, b) = highlight.circles;
        log::info!("Intersection clicked between circles {} and {}", a, b);
        Some((a, b))
    }
}
