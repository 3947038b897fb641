//! Lens highlights for outermost circles that are close to merging.
//!
//! The band is visual only: two outermost circles qualify while they overlap
//! geometrically but by less than the merge margin, so an impending merge is
//! shown before a release commits it.

use crate::config::LayoutConfig;
use crate::geometry::{circle_intersection, Lens};
use crate::store::EntityStore;
use crate::types::*;
use crate::viewport::Viewport;
use eframe::egui::Pos2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A lens between two outermost circles, with its clickable marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionHighlight {
    /// The participating circles, smaller id first
    pub circles: (CircleId, CircleId),
    /// Lens geometry in world space
    pub lens: Lens,
    /// Marker position in world space
    pub marker_world: Pos2,
    /// Marker position on the canvas
    pub marker_screen: Pos2,
}

impl IntersectionHighlight {
    /// True if `circle` is one of the pair.
    pub fn involves(&self, circle: &CircleId) -> bool {
        self.circles.0 == *circle || self.circles.1 == *circle
    }
}

fn in_band(a: &Circle, b: &Circle, margin: f32) -> bool {
    let distance = a.position.distance(b.position);
    let sum = a.radius + b.radius;
    distance < sum && distance > sum - margin
}

/// Computes at most one highlight per outermost circle: its largest partner
/// within the band. Each unordered pair is emitted once.
pub fn highlights(
    store: &EntityStore,
    viewport: &Viewport,
    config: &LayoutConfig,
) -> Vec<IntersectionHighlight> {
    let mut outermost: Vec<&Circle> = store
        .outermost()
        .iter()
        .filter_map(|id| store.circle(id))
        .collect();
    outermost.sort_by(|a, b| b.radius.total_cmp(&a.radius).then(a.seq.cmp(&b.seq)));

    let mut visited: HashSet<(CircleId, CircleId)> = HashSet::new();
    let mut result = Vec::new();

    for circle in &outermost {
        // Sorted largest first, so the first match is the largest partner.
        let Some(partner) = outermost
            .iter()
            .find(|other| other.id != circle.id && in_band(circle, other, config.overlap_margin))
        else {
            continue;
        };

        let key = if circle.id < partner.id {
            (circle.id, partner.id)
        } else {
            (partner.id, circle.id)
        };
        if !visited.insert(key) {
            continue;
        }

        let Some(lens) = circle_intersection(circle.disc(), partner.disc()) else {
            continue;
        };
        result.push(IntersectionHighlight {
            circles: key,
            marker_world: lens.center,
            marker_screen: viewport.world_to_screen(lens.center),
            lens,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{add_group, add_leaf};
    use eframe::egui::pos2;

    fn pair_of(a: CircleId, b: CircleId) -> (CircleId, CircleId) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    #[test]
    fn test_pair_in_band_is_highlighted() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(120.0, 0.0));
        let view = Viewport {
            pan: eframe::egui::vec2(10.0, 0.0),
            ..Default::default()
        };

        let found = highlights(&store, &view, &config);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].circles, pair_of(a, b));
        assert!(found[0].involves(&a));
        assert!((found[0].marker_world.x - 60.0).abs() < 1e-3);
        assert!((found[0].marker_screen.x - 70.0).abs() < 1e-3);
    }

    #[test]
    fn test_merge_range_and_apart_are_not_highlighted() {
        let config = LayoutConfig::default();
        let view = Viewport::default();

        for distance in [100.0, 110.0, 160.0, 300.0] {
            let mut store = EntityStore::new();
            add_leaf(&mut store, &config, pos2(0.0, 0.0));
            add_leaf(&mut store, &config, pos2(distance, 0.0));
            assert!(highlights(&store, &view, &config).is_empty(), "distance {distance}");
        }
    }

    #[test]
    fn test_largest_partner_wins_and_pairs_are_unique() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let x = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        let y = add_leaf(&mut store, &config, pos2(-120.0, 0.0));
        let m1 = add_leaf(&mut store, &config, pos2(150.0, 0.0));
        let m2 = add_leaf(&mut store, &config, pos2(190.0, 0.0));
        let group = add_group(&mut store, &config, &[m1, m2]);

        let found = highlights(&store, &Viewport::default(), &config);
        let pairs: Vec<_> = found.iter().map(|h| h.circles).collect();

        assert_eq!(pairs, vec![pair_of(group, x), pair_of(x, y)]);
        assert!(found.iter().all(|h| !h.involves(&m1) && !h.involves(&m2)));
    }
}
