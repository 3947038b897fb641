//! Read-only views derived from the entity store each frame.

use crate::config::LayoutConfig;
use crate::highlight::{highlights, IntersectionHighlight};
use crate::store::EntityStore;
use crate::types::*;
use crate::viewport::{cull, Viewport};
use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A circle that survived culling, resolved for drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleCircle {
    /// Circle being drawn
    pub id: CircleId,
    /// Centre in world space
    pub world_center: Pos2,
    /// Centre on the canvas
    pub screen_center: Pos2,
    /// Radius in world units
    pub world_radius: f32,
    /// Radius in canvas pixels
    pub screen_radius: f32,
    /// Whether the circle is a group
    pub is_composite: bool,
    /// Whether the circle is currently held or moves with a held circle
    pub is_dragging: bool,
    /// Number of ancestors; outermost circles are at depth 0
    pub depth: usize,
    /// Total items contained
    pub item_count: usize,
}

/// An item drawn centred in its visible leaf circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSprite {
    /// Item being drawn
    pub item: ItemId,
    /// Leaf circle holding the item
    pub circle: CircleId,
    /// Fill colour
    pub color: ItemColor,
    /// Top-left corner on the canvas
    pub screen_min: Pos2,
    /// Size on the canvas
    pub screen_size: Vec2,
}

/// Everything a host needs to paint one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Visible circles, largest first
    pub circles: Vec<VisibleCircle>,
    /// Items of visible leaf circles
    pub items: Vec<ItemSprite>,
    /// Lens highlights between outermost circles
    pub highlights: Vec<IntersectionHighlight>,
    /// The transform the screen positions were resolved with
    pub viewport: Viewport,
}

impl RenderSnapshot {
    /// Builds the frame view of `store` under `viewport`.
    pub fn build(store: &EntityStore, viewport: &Viewport, config: &LayoutConfig) -> Self {
        let parents = store.parent_map();
        let mut circles = Vec::new();
        let mut items = Vec::new();

        for id in cull(store, viewport, config.viewport_padding) {
            let Some(circle) = store.circle(&id) else {
                continue;
            };
            let screen_center = viewport.world_to_screen(circle.position);

            if !circle.is_composite() {
                for item in circle.items.iter().filter_map(|item| store.item(item)) {
                    let screen_size = item.size_vec() * viewport.scale;
                    items.push(ItemSprite {
                        item: item.id,
                        circle: circle.id,
                        color: item.color,
                        screen_min: screen_center - screen_size / 2.0,
                        screen_size,
                    });
                }
            }

            circles.push(VisibleCircle {
                id,
                world_center: circle.position,
                screen_center,
                world_radius: circle.radius,
                screen_radius: circle.radius * viewport.scale,
                is_composite: circle.is_composite(),
                is_dragging: circle.is_dragging,
                depth: depth_in(&parents, id),
                item_count: circle.items.len(),
            });
        }

        Self {
            circles,
            items,
            highlights: highlights(store, viewport, config),
            viewport: *viewport,
        }
    }

    /// The highlight whose marker covers canvas position `screen`, if any.
    pub fn marker_at(&self, screen: Pos2, marker_radius: f32) -> Option<&IntersectionHighlight> {
        self.highlights
            .iter()
            .find(|highlight| highlight.marker_screen.distance(screen) <= marker_radius)
    }
}

fn depth_in(parents: &HashMap<CircleId, CircleId>, id: CircleId) -> usize {
    let mut depth = 0;
    let mut cursor = id;
    while let Some(parent) = parents.get(&cursor) {
        depth += 1;
        cursor = *parent;
        if depth > parents.len() {
            break;
        }
    }
    depth
}

/// One circle of the debug hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestNode {
    /// Circle id
    pub id: CircleId,
    /// Centre in world space
    pub position: Pos2,
    /// Current radius
    pub radius: f32,
    /// Every contained item
    pub items: Vec<ItemId>,
    /// Containing group, if any
    pub parent: Option<CircleId>,
    /// Direct children in join order
    pub children: Vec<ForestNode>,
}

/// The whole forest, outermost circles in creation order and children in
/// the order they joined.
pub fn build_forest(store: &EntityStore) -> Vec<ForestNode> {
    let mut seen = HashSet::new();
    store
        .outermost()
        .into_iter()
        .filter_map(|root| forest_node(store, root, None, &mut seen))
        .collect()
}

fn forest_node(
    store: &EntityStore,
    id: CircleId,
    parent: Option<CircleId>,
    seen: &mut HashSet<CircleId>,
) -> Option<ForestNode> {
    if !seen.insert(id) {
        return None;
    }
    let circle = store.circle(&id)?;
    let children = circle
        .child_ids()
        .iter()
        .filter_map(|child| forest_node(store, *child, Some(id), seen))
        .collect();

    Some(ForestNode {
        id,
        position: circle.position,
        radius: circle.radius,
        items: circle.items.clone(),
        parent,
        children,
    })
}

/// The debug hierarchy as pretty JSON.
pub fn forest_json(store: &EntityStore) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&build_forest(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{add_group, add_leaf};
    use eframe::egui::{pos2, vec2};

    #[test]
    fn test_snapshot_resolves_screen_geometry() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(100.0, 100.0));
        let view = Viewport {
            pan: vec2(50.0, 0.0),
            scale: 2.0,
            size: Some(vec2(800.0, 600.0)),
        };

        let snapshot = RenderSnapshot::build(&store, &view, &config);

        assert_eq!(snapshot.circles.len(), 1);
        let circle = &snapshot.circles[0];
        assert_eq!(circle.id, a);
        assert_eq!(circle.screen_center, pos2(250.0, 200.0));
        assert_eq!(circle.screen_radius, config.radius_for(1) * 2.0);
        assert_eq!(circle.depth, 0);

        assert_eq!(snapshot.items.len(), 1);
        let sprite = &snapshot.items[0];
        assert_eq!(sprite.screen_size, vec2(40.0, 40.0));
        assert_eq!(sprite.screen_min, pos2(230.0, 180.0));
    }

    #[test]
    fn test_items_only_for_visible_leaves() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(10.0, 0.0));
        let group = add_group(&mut store, &config, &[a, b]);
        add_leaf(&mut store, &config, pos2(50_000.0, 0.0));
        let view = Viewport {
            size: Some(vec2(800.0, 600.0)),
            ..Default::default()
        };

        let snapshot = RenderSnapshot::build(&store, &view, &config);

        let ids: Vec<_> = snapshot.circles.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![group, a, b]);
        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.items.iter().all(|s| s.circle == a || s.circle == b));
        assert_eq!(snapshot.circles[1].depth, 1);
    }

    #[test]
    fn test_marker_hit_testing() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        add_leaf(&mut store, &config, pos2(0.0, 0.0));
        add_leaf(&mut store, &config, pos2(120.0, 0.0));

        let snapshot = RenderSnapshot::build(&store, &Viewport::default(), &config);

        assert!(snapshot.marker_at(pos2(65.0, 5.0), 12.0).is_some());
        assert!(snapshot.marker_at(pos2(80.0, 0.0), 12.0).is_none());
    }

    #[test]
    fn test_forest_lists_nested_children() {
        let config = LayoutConfig::default();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(10.0, 0.0));
        let group = add_group(&mut store, &config, &[a, b]);
        let c = add_leaf(&mut store, &config, pos2(500.0, 0.0));

        let forest = build_forest(&store);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].id, group);
        assert_eq!(forest[1].id, c);
        assert_eq!(forest[0].items.len(), 2);
        assert_eq!(forest[0].parent, None);
        let children: Vec<_> = forest[0].children.iter().map(|n| n.id).collect();
        assert_eq!(children, vec![a, b]);
        assert_eq!(forest[0].children[0].parent, Some(group));
        assert!(forest[1].children.is_empty());

        let json = forest_json(&store).unwrap();
        assert!(json.contains(&group.to_string()));
    }
}
