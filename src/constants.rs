//! Shared application-wide constants.
//! Centralizes the default layout tunables and the values used by the desktop host.

use std::time::Duration;

// Circle sizing
/// Radius of a circle holding zero items, before the item term is added.
pub const BASE_CIRCLE_RADIUS: f32 = 20.0;
/// Multiplier `k` in `base + (n^1.1 * k + k)`.
pub const RADIUS_SCALE: f32 = 30.0;
/// Exponent applied to the item count; above 1.0 so growth is super-linear.
pub const RADIUS_EXPONENT: f32 = 1.1;

// Grouping
/// Two circles must overlap by at least this much before they merge.
pub const OVERLAP_MARGIN: f32 = 50.0;

// Physics
/// Extra gap kept between sibling circles inside a group.
pub const CIRCLE_SPACING: f32 = 40.0;
/// Saturated strength of the pull toward the group centre.
pub const CENTER_PULL: f32 = 0.1;
/// Repulsion per unit of penetration between siblings.
pub const REPULSION: f32 = 0.002;
/// Distance at which the centre pull reaches full strength.
pub const MAX_CENTER_DISTANCE: f32 = 100.0;
/// Fixed physics tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);
/// Upper bound on ticks replayed by a single `advance` call.
pub const MAX_CATCH_UP_TICKS: u32 = 8;

// Viewport
/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f32 = 0.5;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f32 = 2.0;
/// Additive zoom change per wheel event or toolbar click.
pub const ZOOM_STEP: f32 = 0.1;
/// World-space margin added around the visible rectangle when culling.
pub const VIEWPORT_PADDING: f32 = 100.0;

// Items
/// Default item width and height in world units.
pub const ITEM_SIZE: (f32, f32) = (20.0, 20.0);
/// World position used for new circles when the viewport size is unknown.
pub const DEFAULT_SPAWN: (f32, f32) = (0.0, 0.0);

// Intersection markers
/// Radius of the clickable marker placed at a lens centre (screen pixels).
pub const MARKER_RADIUS: f32 = 12.0;
/// Points sampled per arc when flattening a lens for painting.
pub const LENS_ARC_SEGMENTS: usize = 24;

// Grid/drawing
/// Grid cell size in world units.
pub const GRID_SIZE: f32 = 40.0;
