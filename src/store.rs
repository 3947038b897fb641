//! Entity store: the single source of truth for circles and items.
//!
//! Circles form a forest expressed through `children` id lists rather than
//! object references. Both maps sit behind `Arc`, so cloning the store hands a
//! reader a frozen snapshot while the next mutation copies on write.

use crate::types::*;
use eframe::egui::Pos2;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Structural problems reported by [`EntityStore::check_forest`].
#[derive(Debug, Clone, PartialEq)]
pub enum ForestError {
    /// A circle lists a child id that is not in the store
    DanglingChild {
        /// The listing circle
        parent: CircleId,
        /// The missing child
        child: CircleId,
    },
    /// A circle appears in more than one `children` list
    MultipleParents(CircleId),
    /// A circle is its own descendant
    Cycle(CircleId),
    /// A composite circle with fewer than two children
    UnderfilledGroup(CircleId),
    /// A composite circle whose items differ from the union of its children's
    ItemMismatch(CircleId),
}

impl fmt::Display for ForestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestError::DanglingChild { parent, child } => {
                write!(f, "circle {parent} lists missing child {child}")
            }
            ForestError::MultipleParents(id) => write!(f, "circle {id} has more than one parent"),
            ForestError::Cycle(id) => write!(f, "circle {id} is its own descendant"),
            ForestError::UnderfilledGroup(id) => {
                write!(f, "group {id} has fewer than two children")
            }
            ForestError::ItemMismatch(id) => {
                write!(f, "group {id} items differ from its children's items")
            }
        }
    }
}

impl std::error::Error for ForestError {}

/// Mapping from ids to circles and items.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    circles: Arc<HashMap<CircleId, Circle>>,
    items: Arc<HashMap<ItemId, Item>>,
    next_seq: u64,
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a circle.
    pub fn circle(&self, id: &CircleId) -> Option<&Circle> {
        self.circles.get(id)
    }

    /// Looks up an item.
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    /// All circles, in no particular order.
    pub fn circles(&self) -> impl Iterator<Item = &Circle> {
        self.circles.values()
    }

    /// All items, in no particular order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Number of circles, leaf and composite.
    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    /// Number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Issues the next creation sequence number.
    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Mutable access to one circle, copying the map if a snapshot shares it.
    pub fn circle_mut(&mut self, id: &CircleId) -> Option<&mut Circle> {
        Arc::make_mut(&mut self.circles).get_mut(id)
    }

    /// Mutable access to every circle, copying the map if a snapshot shares it.
    pub fn circles_mut(&mut self) -> impl Iterator<Item = &mut Circle> {
        Arc::make_mut(&mut self.circles).values_mut()
    }

    /// Inserts or replaces a circle.
    pub fn insert_circle(&mut self, circle: Circle) {
        Arc::make_mut(&mut self.circles).insert(circle.id, circle);
    }

    /// Removes a circle. Callers are responsible for unlinking it first.
    pub fn remove_circle(&mut self, id: &CircleId) -> Option<Circle> {
        Arc::make_mut(&mut self.circles).remove(id)
    }

    /// Inserts or replaces an item.
    pub fn insert_item(&mut self, item: Item) {
        Arc::make_mut(&mut self.items).insert(item.id, item);
    }

    /// The circle listing `id` among its children, if any.
    pub fn parent_of(&self, id: &CircleId) -> Option<CircleId> {
        self.circles
            .values()
            .find(|circle| circle.child_ids().contains(id))
            .map(|circle| circle.id)
    }

    /// Child to parent mapping for the whole forest.
    pub fn parent_map(&self) -> HashMap<CircleId, CircleId> {
        let mut parents = HashMap::new();
        for circle in self.circles.values() {
            for child in circle.child_ids() {
                parents.insert(*child, circle.id);
            }
        }
        parents
    }

    /// True iff no circle lists `id` as a child.
    pub fn is_outermost(&self, id: &CircleId) -> bool {
        self.circles.contains_key(id) && self.parent_of(id).is_none()
    }

    /// Outermost circles in creation order.
    pub fn outermost(&self) -> Vec<CircleId> {
        let parents = self.parent_map();
        let mut roots: Vec<&Circle> = self
            .circles
            .values()
            .filter(|circle| !parents.contains_key(&circle.id))
            .collect();
        roots.sort_by_key(|circle| circle.seq);
        roots.into_iter().map(|circle| circle.id).collect()
    }

    /// Composite circles in creation order.
    pub fn composites(&self) -> Vec<CircleId> {
        let mut groups: Vec<&Circle> = self
            .circles
            .values()
            .filter(|circle| circle.is_composite())
            .collect();
        groups.sort_by_key(|circle| circle.seq);
        groups.into_iter().map(|circle| circle.id).collect()
    }

    /// `id` followed by all of its descendants, depth first.
    pub fn subtree(&self, id: &CircleId) -> Vec<CircleId> {
        let mut visited = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![*id];

        while let Some(current) = stack.pop() {
            let Some(circle) = self.circles.get(&current) else {
                continue;
            };
            if !seen.insert(current) {
                continue;
            }
            visited.push(current);
            stack.extend(circle.child_ids().iter().rev().copied());
        }

        visited
    }

    /// Number of ancestors above `id`.
    pub fn depth_of(&self, id: &CircleId) -> usize {
        let parents = self.parent_map();
        let mut depth = 0;
        let mut cursor = *id;
        while let Some(parent) = parents.get(&cursor) {
            depth += 1;
            cursor = *parent;
            if depth > parents.len() {
                break;
            }
        }
        depth
    }

    /// The smallest circle containing `point`, which is the one drawn on top.
    pub fn circle_at(&self, point: Pos2) -> Option<CircleId> {
        self.circles
            .values()
            .filter(|circle| circle.disc().contains(point))
            .min_by(|a, b| a.radius.total_cmp(&b.radius).then(b.seq.cmp(&a.seq)))
            .map(|circle| circle.id)
    }

    /// Verifies the forest invariants: every child exists, has exactly one
    /// parent, no cycles, groups have at least two children and carry exactly
    /// the union of their children's items.
    pub fn check_forest(&self) -> Result<(), ForestError> {
        let mut parents: HashMap<CircleId, CircleId> = HashMap::new();

        for circle in self.circles.values() {
            if circle.is_composite() && circle.child_ids().len() < 2 {
                return Err(ForestError::UnderfilledGroup(circle.id));
            }
            for child in circle.child_ids() {
                if !self.circles.contains_key(child) {
                    return Err(ForestError::DanglingChild {
                        parent: circle.id,
                        child: *child,
                    });
                }
                if parents.insert(*child, circle.id).is_some() {
                    return Err(ForestError::MultipleParents(*child));
                }
            }
        }

        for id in self.circles.keys() {
            let mut cursor = *id;
            let mut steps = 0;
            while let Some(parent) = parents.get(&cursor) {
                if parent == id {
                    return Err(ForestError::Cycle(*id));
                }
                cursor = *parent;
                steps += 1;
                if steps > parents.len() {
                    return Err(ForestError::Cycle(*id));
                }
            }
        }

        for circle in self.circles.values().filter(|circle| circle.is_composite()) {
            let mut expected: Vec<ItemId> = circle
                .child_ids()
                .iter()
                .filter_map(|child| self.circles.get(child))
                .flat_map(|child| child.items.iter().copied())
                .collect();
            let mut actual = circle.items.clone();
            expected.sort();
            actual.sort();
            if expected != actual {
                return Err(ForestError::ItemMismatch(circle.id));
            }
        }

        Ok(())
    }
}
