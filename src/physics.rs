//! Per-group relaxation and its fixed-step scheduler.
//!
//! Each composite circle is its own physics container: it moves to the centroid
//! of its children, pulls its leaf children toward that centre and pushes
//! siblings apart until they keep the configured spacing. Containers never feel
//! forces themselves, they only follow their children.

use crate::config::LayoutConfig;
use crate::constants::MAX_CATCH_UP_TICKS;
use crate::store::EntityStore;
use crate::types::*;
use eframe::egui::{pos2, Pos2, Vec2};
use std::time::Duration;

const GOLDEN_ANGLE: f32 = 2.399_963;
const COINCIDENT_DISTANCE: f32 = 1e-4;

#[derive(Clone, Copy)]
struct Body {
    id: CircleId,
    position: Pos2,
    radius: f32,
    is_composite: bool,
}

/// Runs one relaxation tick over every composite circle, in creation order.
///
/// Groups being dragged are skipped, and dragging children neither contribute
/// to the centroid nor move. Returns `true` if any position changed.
pub fn step(store: &mut EntityStore, config: &LayoutConfig) -> bool {
    let mut moved = false;

    for group_id in store.composites() {
        let Some(group) = store.circle(&group_id) else {
            continue;
        };
        if group.is_dragging {
            continue;
        }

        let bodies: Vec<Body> = group
            .child_ids()
            .iter()
            .filter_map(|id| store.circle(id))
            .filter(|child| !child.is_dragging)
            .map(|child| Body {
                id: child.id,
                position: child.position,
                radius: child.radius,
                is_composite: child.is_composite(),
            })
            .collect();
        if bodies.is_empty() {
            continue;
        }

        let count = bodies.len() as f32;
        let center = pos2(
            bodies.iter().map(|b| b.position.x).sum::<f32>() / count,
            bodies.iter().map(|b| b.position.y).sum::<f32>() / count,
        );
        if let Some(group) = store.circle_mut(&group_id) {
            moved |= group.position != center;
            group.position = center;
        }

        for (index, body) in bodies.iter().enumerate() {
            if body.is_composite {
                continue;
            }
            let displacement = pull(body.position, center, config)
                + repulsion(index, &bodies, config);
            if displacement == Vec2::ZERO {
                continue;
            }
            if let Some(child) = store.circle_mut(&body.id) {
                child.position += displacement;
                moved = true;
            }
        }
    }

    log::trace!("Physics tick, moved: {}", moved);
    moved
}

/// Pull toward the group centre, saturating at `max_center_distance`.
fn pull(position: Pos2, center: Pos2, config: &LayoutConfig) -> Vec2 {
    let offset = center - position;
    let distance = offset.length();
    if distance <= 0.0 {
        return Vec2::ZERO;
    }
    let strength = (distance / config.max_center_distance).min(1.0) * config.center_pull;
    offset * strength
}

/// Push away from every sibling closer than `r1 + r2 + spacing`, averaged
/// over the overlapping siblings.
fn repulsion(index: usize, bodies: &[Body], config: &LayoutConfig) -> Vec2 {
    let body = bodies[index];
    let mut total = Vec2::ZERO;
    let mut overlapping = 0usize;

    for (other_index, other) in bodies.iter().enumerate() {
        if other_index == index {
            continue;
        }
        let min_distance = body.radius + other.radius + config.spacing;
        let offset = body.position - other.position;
        let distance = offset.length();
        if distance >= min_distance {
            continue;
        }
        overlapping += 1;

        if distance < COINCIDENT_DISTANCE {
            // Same spot: split the pair along a direction fixed by the lower index.
            let angle = index.min(other_index) as f32 * GOLDEN_ANGLE;
            let direction = Vec2::angled(angle);
            let sign = if index < other_index { 1.0 } else { -1.0 };
            total += direction * sign * min_distance * config.repulsion;
        } else {
            total += offset * (min_distance - distance) * config.repulsion;
        }
    }

    if overlapping > 1 {
        total / overlapping as f32
    } else {
        total
    }
}

/// Fixed-timestep scheduler for [`step`].
///
/// The host reports elapsed wall time; the ticker answers how many physics
/// ticks are due. A stalled host cannot queue more than
/// [`MAX_CATCH_UP_TICKS`] ticks per call.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsTicker {
    interval: Duration,
    accumulated: Duration,
    running: bool,
}

impl PhysicsTicker {
    /// Creates a stopped ticker.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accumulated: Duration::ZERO,
            running: false,
        }
    }

    /// Starts producing ticks.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stops producing ticks and drops any partial interval.
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulated = Duration::ZERO;
    }

    /// Whether ticks are being produced.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Fixed tick length.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Adds `elapsed` to the accumulator and returns the number of ticks due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.running {
            return 0;
        }

        self.accumulated += elapsed;
        let mut ticks = 0;
        while self.accumulated >= self.interval && ticks < MAX_CATCH_UP_TICKS {
            self.accumulated -= self.interval;
            ticks += 1;
        }
        if self.accumulated >= self.interval {
            self.accumulated = Duration::ZERO;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{add_group, add_leaf};

    fn position(store: &EntityStore, id: &CircleId) -> Pos2 {
        store.circle(id).unwrap().position
    }

    #[test]
    fn test_lone_leaves_are_untouched() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(10.0, 0.0));

        assert!(!step(&mut store, &config));
        assert_eq!(position(&store, &a), pos2(0.0, 0.0));
        assert_eq!(position(&store, &b), pos2(10.0, 0.0));
    }

    #[test]
    fn test_distant_children_are_pulled_in() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(-300.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(300.0, 0.0));
        let group = add_group(&mut store, &config, &[a, b]);

        assert!(step(&mut store, &config));

        assert_eq!(position(&store, &group), pos2(0.0, 0.0));
        assert!((position(&store, &a).x + 270.0).abs() < 1e-3);
        assert!((position(&store, &b).x - 270.0).abs() < 1e-3);
    }

    #[test]
    fn test_close_siblings_are_pushed_apart() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(-50.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(50.0, 0.0));
        add_group(&mut store, &config, &[a, b]);

        step(&mut store, &config);

        // pull +2.5, repulsion -20
        assert!((position(&store, &a).x + 67.5).abs() < 1e-3);
        assert!((position(&store, &b).x - 67.5).abs() < 1e-3);
    }

    #[test]
    fn test_coincident_siblings_separate() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(5.0, 5.0));
        let b = add_leaf(&mut store, &config, pos2(5.0, 5.0));
        add_group(&mut store, &config, &[a, b]);

        step(&mut store, &config);
        let after_one = position(&store, &a).distance(position(&store, &b));
        for _ in 0..10 {
            step(&mut store, &config);
        }

        assert!(after_one > 0.5);
        assert!(position(&store, &a).distance(position(&store, &b)) > after_one);
    }

    #[test]
    fn test_relaxation_settles_at_equilibrium() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(-1.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(1.0, 0.0));
        add_group(&mut store, &config, &[a, b]);

        for _ in 0..300 {
            step(&mut store, &config);
        }

        // Pull 0.001x^2 balances repulsion 0.8x - 0.008x^2 at x = 88.9.
        let separation = position(&store, &a).distance(position(&store, &b));
        assert!((separation - 177.78).abs() < 1.0, "separation {separation}");
    }

    #[test]
    fn test_crowded_group_beside_large_sibling_settles() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let inner: Vec<_> = (0..20)
            .map(|i| add_leaf(&mut store, &config, pos2(i as f32 * 10.0, 0.0)))
            .collect();
        let nested = add_group(&mut store, &config, &inner);
        let mut outer = vec![nested];
        for i in 0..6 {
            outer.push(add_leaf(&mut store, &config, pos2(300.0 + i as f32 * 10.0, 50.0)));
        }
        add_group(&mut store, &config, &outer);
        let leaves: Vec<CircleId> = inner.iter().chain(&outer[1..]).copied().collect();

        for _ in 0..2000 {
            step(&mut store, &config);
        }

        let mut largest_move: f32 = 0.0;
        for _ in 0..50 {
            let before: Vec<Pos2> = leaves.iter().map(|id| position(&store, id)).collect();
            step(&mut store, &config);
            for (id, old) in leaves.iter().zip(before) {
                largest_move = largest_move.max(position(&store, id).distance(old));
            }
        }
        assert!(largest_move < 1.0, "still moving {largest_move} per tick");
        assert!(store.check_forest().is_ok());
    }

    #[test]
    fn test_dragging_group_is_skipped() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(-300.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(300.0, 0.0));
        let group = add_group(&mut store, &config, &[a, b]);
        store.circle_mut(&group).unwrap().position = pos2(7.0, 7.0);
        store.circle_mut(&group).unwrap().is_dragging = true;

        assert!(!step(&mut store, &config));
        assert_eq!(position(&store, &group), pos2(7.0, 7.0));
        assert_eq!(position(&store, &a), pos2(-300.0, 0.0));
    }

    #[test]
    fn test_dragging_child_is_excluded() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(-300.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(300.0, 0.0));
        let c = add_leaf(&mut store, &config, pos2(0.0, 900.0));
        let group = add_group(&mut store, &config, &[a, b, c]);
        store.circle_mut(&c).unwrap().is_dragging = true;

        step(&mut store, &config);

        assert_eq!(position(&store, &group), pos2(0.0, 0.0));
        assert_eq!(position(&store, &c), pos2(0.0, 900.0));
    }

    #[test]
    fn test_nested_group_follows_its_children() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(-400.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(-200.0, 0.0));
        let inner = add_group(&mut store, &config, &[a, b]);
        let c = add_leaf(&mut store, &config, pos2(500.0, 0.0));
        add_group(&mut store, &config, &[inner, c]);
        store.circle_mut(&inner).unwrap().position = pos2(-100.0, 0.0);

        step(&mut store, &config);

        // The inner group moved to its children's centroid, not by a force.
        let inner_position = position(&store, &inner);
        assert!((inner_position.x + 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_ticker_counts_due_ticks() {
        let mut ticker = PhysicsTicker::new(Duration::from_millis(16));
        assert_eq!(ticker.advance(Duration::from_millis(100)), 0);

        ticker.start();
        assert_eq!(ticker.advance(Duration::from_millis(10)), 0);
        assert_eq!(ticker.advance(Duration::from_millis(10)), 1);
        assert_eq!(ticker.advance(Duration::from_millis(36)), 2);
    }

    #[test]
    fn test_ticker_caps_catch_up() {
        let mut ticker = PhysicsTicker::new(Duration::from_millis(16));
        ticker.start();

        assert_eq!(ticker.advance(Duration::from_secs(5)), MAX_CATCH_UP_TICKS);
        assert_eq!(ticker.advance(Duration::from_millis(1)), 0);
    }

    #[test]
    fn test_stopped_ticker_yields_nothing() {
        let mut ticker = PhysicsTicker::new(Duration::from_millis(16));
        ticker.start();
        ticker.advance(Duration::from_millis(15));
        ticker.stop();

        assert!(!ticker.is_running());
        assert_eq!(ticker.advance(Duration::from_millis(15)), 0);
        ticker.start();
        assert_eq!(ticker.advance(Duration::from_millis(15)), 0);
    }
}
