//! Pure circle geometry: sizing, overlap tests and lens construction.
//!
//! Nothing here holds state. Every function works on [`Disc`] values so the
//! entity store, the highlighter and the tests can share one implementation.

use eframe::egui::{pos2, Pos2};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::constants::RADIUS_EXPONENT;

/// A circle reduced to its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disc {
    /// Centre
    pub center: Pos2,
    /// Radius
    pub radius: f32,
}

impl Disc {
    /// Creates a disc.
    pub fn new(center: Pos2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether `point` lies inside or on the boundary.
    pub fn contains(&self, point: Pos2) -> bool {
        self.center.distance(point) <= self.radius
    }
}

/// Radius for a circle holding `item_count` items: `base + (n^1.1 * k + k)`.
///
/// Strictly increasing in `item_count`; `radius_for(0, base, k) == base + k`.
pub fn radius_for(item_count: usize, base: f32, k: f32) -> f32 {
    base + ((item_count as f32).powf(RADIUS_EXPONENT) * k + k)
}

/// True iff the centres are closer than `a.r + b.r - margin`.
pub fn circles_overlap(a: Disc, b: Disc, margin: f32) -> bool {
    a.center.distance(b.center) < a.radius + b.radius - margin
}

/// One boundary arc of a lens, swept with increasing angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensArc {
    /// Centre of the circle the arc lies on
    pub center: Pos2,
    /// Radius of that circle
    pub radius: f32,
    /// Angle of the first point, radians
    pub start_angle: f32,
    /// Angle of the last point, radians; always greater than `start_angle`
    pub end_angle: f32,
}

impl LensArc {
    /// Point on the arc's circle at `angle`.
    pub fn point_at(&self, angle: f32) -> Pos2 {
        pos2(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }

    /// First point of the arc.
    pub fn start(&self) -> Pos2 {
        self.point_at(self.start_angle)
    }

    /// Last point of the arc.
    pub fn end(&self) -> Pos2 {
        self.point_at(self.end_angle)
    }

    /// Angular extent in radians.
    pub fn sweep(&self) -> f32 {
        self.end_angle - self.start_angle
    }
}

/// The region shared by two overlapping circles.
///
/// The boundary is `arcs[0]` (on the first circle) followed by `arcs[1]` (on
/// the second), which closes back at the start of `arcs[0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    /// Boundary arcs in drawing order
    pub arcs: [LensArc; 2],
    /// The two boundary intersection points
    pub points: [Pos2; 2],
    /// Midpoint of the intersection points, where the marker goes
    pub center: Pos2,
}

impl Lens {
    /// Flattens the boundary into a closed polygon (first vertex not repeated).
    pub fn outline(&self, segments_per_arc: usize) -> Vec<Pos2> {
        let segments = segments_per_arc.max(1);
        let mut points = Vec::with_capacity(segments * 2);

        let first = &self.arcs[0];
        for step in 0..=segments {
            let t = step as f32 / segments as f32;
            points.push(first.point_at(first.start_angle + first.sweep() * t));
        }

        // The second arc starts where the first ends and ends where the first starts.
        let second = &self.arcs[1];
        for step in 1..segments {
            let t = step as f32 / segments as f32;
            points.push(second.point_at(second.start_angle + second.sweep() * t));
        }

        points
    }

    /// SVG path data for the lens, in the same coordinate space as the circles.
    pub fn svg_path(&self) -> String {
        let [first, second] = &self.arcs;
        let start = first.start();
        let middle = first.end();
        let end = second.end();
        let large = |arc: &LensArc| u8::from(arc.sweep() > PI);

        format!(
            "M {} {} A {} {} 0 {} 1 {} {} A {} {} 0 {} 1 {} {} Z",
            start.x,
            start.y,
            first.radius,
            first.radius,
            large(first),
            middle.x,
            middle.y,
            second.radius,
            second.radius,
            large(second),
            end.x,
            end.y,
        )
    }
}

/// Lens shared by `a` and `b`, via the law of cosines.
///
/// Returns `None` when the circles are apart or just touching
/// (`distance >= a.r + b.r`) and when one contains the other
/// (`distance <= |a.r - b.r|`).
pub fn circle_intersection(a: Disc, b: Disc) -> Option<Lens> {
    let distance = a.center.distance(b.center);
    if distance >= a.radius + b.radius || distance <= (a.radius - b.radius).abs() {
        return None;
    }

    let cos_a = (a.radius * a.radius + distance * distance - b.radius * b.radius)
        / (2.0 * a.radius * distance);
    let cos_b = (b.radius * b.radius + distance * distance - a.radius * a.radius)
        / (2.0 * b.radius * distance);
    let angle_a = cos_a.clamp(-1.0, 1.0).acos();
    let angle_b = cos_b.clamp(-1.0, 1.0).acos();
    let theta = (b.center.y - a.center.y).atan2(b.center.x - a.center.x);

    let arc_a = LensArc {
        center: a.center,
        radius: a.radius,
        start_angle: theta - angle_a,
        end_angle: theta + angle_a,
    };
    let arc_b = LensArc {
        center: b.center,
        radius: b.radius,
        start_angle: theta + PI - angle_b,
        end_angle: theta + PI + angle_b,
    };

    let points = [arc_a.end(), arc_a.start()];
    let center = pos2(
        (points[0].x + points[1].x) / 2.0,
        (points[0].y + points[1].y) / 2.0,
    );

    Some(Lens {
        arcs: [arc_a, arc_b],
        points,
        center,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn disc(x: f32, y: f32, r: f32) -> Disc {
        Disc::new(pos2(x, y), r)
    }

    #[test]
    fn test_radius_for_zero_items() {
        assert_eq!(radius_for(0, 20.0, 30.0), 50.0);
    }

    #[test]
    fn test_radius_for_one_item() {
        assert!((radius_for(1, 20.0, 30.0) - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_overlap_requires_margin() {
        let a = disc(0.0, 0.0, 80.0);
        // 80 + 80 - 50 = 110
        assert!(circles_overlap(a, disc(109.0, 0.0, 80.0), 50.0));
        assert!(!circles_overlap(a, disc(110.0, 0.0, 80.0), 50.0));
        // Geometrically overlapping but not by enough.
        assert!(!circles_overlap(a, disc(150.0, 0.0, 80.0), 50.0));
    }

    #[test]
    fn test_intersection_of_equal_circles() {
        let lens = circle_intersection(disc(0.0, 0.0, 50.0), disc(60.0, 0.0, 50.0)).unwrap();

        assert!((lens.center.x - 30.0).abs() < 1e-3);
        assert!(lens.center.y.abs() < 1e-3);
        for point in lens.points {
            assert!((point.x - 30.0).abs() < 1e-3);
            assert!((point.y.abs() - 40.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_touching_circles_have_no_intersection() {
        assert!(circle_intersection(disc(0.0, 0.0, 50.0), disc(100.0, 0.0, 50.0)).is_none());
    }

    #[test]
    fn test_contained_circle_has_no_intersection() {
        assert!(circle_intersection(disc(0.0, 0.0, 50.0), disc(10.0, 0.0, 20.0)).is_none());
        assert!(circle_intersection(disc(0.0, 0.0, 50.0), disc(0.0, 0.0, 50.0)).is_none());
    }

    #[test]
    fn test_lens_arcs_share_endpoints() {
        let lens = circle_intersection(disc(0.0, 0.0, 80.0), disc(90.0, 30.0, 60.0)).unwrap();
        let [first, second] = lens.arcs;

        assert!(first.end().distance(second.start()) < 1e-2);
        assert!(second.end().distance(first.start()) < 1e-2);
    }

    #[test]
    fn test_outline_is_closed_polygon_without_duplicates() {
        let lens = circle_intersection(disc(0.0, 0.0, 50.0), disc(60.0, 0.0, 50.0)).unwrap();
        let outline = lens.outline(8);

        assert_eq!(outline.len(), 16);
        assert_eq!(outline[0], lens.arcs[0].start());
    }

    #[test]
    fn test_svg_path_shape() {
        let lens = circle_intersection(disc(0.0, 0.0, 50.0), disc(60.0, 0.0, 50.0)).unwrap();
        let path = lens.svg_path();

        assert!(path.starts_with("M "));
        assert_eq!(path.matches(" A ").count(), 2);
        assert!(path.ends_with('Z'));
    }

    proptest! {
        #[test]
        fn prop_radius_strictly_increasing(n in 0usize..5_000) {
            prop_assert!(radius_for(n + 1, 20.0, 30.0) > radius_for(n, 20.0, 30.0));
        }

        #[test]
        fn prop_overlap_is_symmetric(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0, ar in 1.0f32..300.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0, br in 1.0f32..300.0,
            margin in 0.0f32..100.0,
        ) {
            let a = disc(ax, ay, ar);
            let b = disc(bx, by, br);
            prop_assert_eq!(circles_overlap(a, b, margin), circles_overlap(b, a, margin));
        }

        #[test]
        fn prop_lens_points_lie_on_both_circles(
            ar in 10.0f32..300.0, br in 10.0f32..300.0, t in 0.05f32..0.95,
        ) {
            let low = (ar - br).abs();
            let high = ar + br;
            let distance = low + (high - low) * t;
            let a = disc(0.0, 0.0, ar);
            let b = disc(distance, 0.0, br);
            let lens = circle_intersection(a, b).expect("distance is inside the overlap band");
            let tolerance = 1e-2 * ar.max(br);
            for point in lens.points {
                prop_assert!((point.distance(a.center) - ar).abs() < tolerance);
                prop_assert!((point.distance(b.center) - br).abs() < tolerance);
            }
        }
    }
}
