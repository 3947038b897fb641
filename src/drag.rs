//! Pointer-driven dragging: rigid subtree moves and detaching from a group.
//!
//! Each active pointer is either idle or holding one circle. Holding a circle
//! marks its whole subtree as dragging, which takes it out of the physics pass
//! until the pointer is released. Releasing always goes through the grouping
//! commit, whether the pointer ended over a valid target or not.

use crate::config::LayoutConfig;
use crate::grouping::{self, CommitReport};
use crate::store::EntityStore;
use crate::types::*;
use crate::viewport::Viewport;
use eframe::egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies one pointer (mouse button, touch, pen) reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub u64);

impl PointerId {
    /// The primary mouse pointer.
    pub const MOUSE: PointerId = PointerId(0);
}

/// Per-pointer drag state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    /// Not holding anything
    Idle,
    /// Holding a circle
    Holding {
        /// The grabbed circle
        circle: CircleId,
        /// Screen position of the last processed event
        last_screen: Pos2,
    },
}

/// What a pointer move did to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// The held subtree was translated.
    Moved,
    /// The held circle left its group before being translated.
    Detached {
        /// The group it left
        from: CircleId,
        /// Whether that group was deleted because one child remained
        dissolved: bool,
    },
    /// Unknown pointer or stale circle; nothing changed.
    Ignored,
}

/// Result of [`detach`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detachment {
    /// The former parent
    pub from: CircleId,
    /// Whether the former parent was dissolved
    pub dissolved: bool,
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    circle: CircleId,
    last_screen: Pos2,
}

/// Tracks which circle each pointer is holding.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    holds: HashMap<PointerId, Hold>,
}

impl DragController {
    /// Creates a controller with no holds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `pointer`.
    pub fn state(&self, pointer: PointerId) -> DragState {
        match self.holds.get(&pointer) {
            Some(hold) => DragState::Holding {
                circle: hold.circle,
                last_screen: hold.last_screen,
            },
            None => DragState::Idle,
        }
    }

    /// True while any pointer holds a circle.
    pub fn is_dragging(&self) -> bool {
        !self.holds.is_empty()
    }

    /// Circles currently held, one per active pointer.
    pub fn held_circles(&self) -> Vec<CircleId> {
        self.holds.values().map(|hold| hold.circle).collect()
    }

    /// Starts holding `circle` with `pointer` at canvas position `screen`.
    ///
    /// Returns `false` if the circle does not exist, the pointer already holds
    /// something, or another pointer holds the same circle.
    pub fn grab(
        &mut self,
        store: &mut EntityStore,
        pointer: PointerId,
        circle: CircleId,
        screen: Pos2,
    ) -> bool {
        if store.circle(&circle).is_none()
            || self.holds.contains_key(&pointer)
            || self.holds.values().any(|hold| hold.circle == circle)
        {
            return false;
        }

        set_subtree_dragging(store, &circle, true);
        self.holds.insert(
            pointer,
            Hold {
                circle,
                last_screen: screen,
            },
        );
        true
    }

    /// Moves the circle held by `pointer` to follow canvas position `screen`.
    ///
    /// If the candidate centre ends up farther from the parent's centre than
    /// the parent's radius, the circle is detached first. Either way the held
    /// subtree is then translated rigidly by the world-space delta.
    pub fn drag_to(
        &mut self,
        store: &mut EntityStore,
        viewport: &Viewport,
        config: &LayoutConfig,
        pointer: PointerId,
        screen: Pos2,
    ) -> DragOutcome {
        let Some(hold) = self.holds.get_mut(&pointer) else {
            return DragOutcome::Ignored;
        };
        let Some(circle) = store.circle(&hold.circle) else {
            self.holds.remove(&pointer);
            return DragOutcome::Ignored;
        };

        let delta: Vec2 = (screen - hold.last_screen) / viewport.scale;
        hold.last_screen = screen;
        let held = hold.circle;
        let candidate = circle.position + delta;

        let mut outcome = DragOutcome::Moved;
        if let Some(parent_id) = store.parent_of(&held) {
            let beyond_parent = store
                .circle(&parent_id)
                .is_some_and(|parent| parent.position.distance(candidate) > parent.radius);
            if beyond_parent {
                if let Some(detachment) = detach(store, config, held) {
                    outcome = DragOutcome::Detached {
                        from: detachment.from,
                        dissolved: detachment.dissolved,
                    };
                }
            }
        }

        translate_subtree(store, &held, delta);
        set_subtree_dragging(store, &held, true);
        outcome
    }

    /// Ends the hold of `pointer` and runs the grouping commit.
    ///
    /// Returns `None` if the pointer was not holding anything.
    pub fn release(
        &mut self,
        store: &mut EntityStore,
        config: &LayoutConfig,
        pointer: PointerId,
    ) -> Option<CommitReport> {
        let hold = self.holds.remove(&pointer)?;
        set_subtree_dragging(store, &hold.circle, false);
        Some(self.commit(store, config))
    }

    /// Releases every pointer, as on teardown. Runs a single commit if any
    /// pointer was holding.
    pub fn release_all(
        &mut self,
        store: &mut EntityStore,
        config: &LayoutConfig,
    ) -> Option<CommitReport> {
        if self.holds.is_empty() {
            return None;
        }
        self.holds.clear();
        Some(self.commit(store, config))
    }

    fn commit(&mut self, store: &mut EntityStore, config: &LayoutConfig) -> CommitReport {
        let report = grouping::commit(store, config);

        // The commit clears every flag; pointers still down keep their subtrees locked.
        self.holds.retain(|_, hold| store.circle(&hold.circle).is_some());
        for hold in self.holds.values() {
            set_subtree_dragging(store, &hold.circle, true);
        }
        report
    }
}

/// Sets `is_dragging` on `root` and all its descendants.
pub fn set_subtree_dragging(store: &mut EntityStore, root: &CircleId, dragging: bool) {
    for id in store.subtree(root) {
        if let Some(circle) = store.circle_mut(&id) {
            circle.is_dragging = dragging;
        }
    }
}

/// Moves `root` and every descendant by the same world-space delta.
pub fn translate_subtree(store: &mut EntityStore, root: &CircleId, delta: Vec2) {
    for id in store.subtree(root) {
        if let Some(circle) = store.circle_mut(&id) {
            circle.position += delta;
        }
    }
}

/// Removes `child` from its parent group.
///
/// The child's items are stripped from every ancestor and their radii are
/// recomputed. A parent left with a single child is deleted and that child
/// takes its place. Returns `None` if `child` is already outermost.
pub fn detach(store: &mut EntityStore, config: &LayoutConfig, child: CircleId) -> Option<Detachment> {
    let parent_id = store.parent_of(&child)?;
    let stripped = store.circle(&child)?.items.clone();

    let mut ancestor = Some(parent_id);
    while let Some(id) = ancestor {
        if let Some(circle) = store.circle_mut(&id) {
            circle.items.retain(|item| !stripped.contains(item));
            circle.radius = config.radius_for(circle.items.len());
        }
        ancestor = store.parent_of(&id);
    }

    if let Some(children) = store
        .circle_mut(&parent_id)
        .and_then(|parent| parent.children.as_mut())
    {
        children.retain(|id| *id != child);
    }

    let dissolved = dissolve_if_underfilled(store, parent_id);
    log::debug!(
        "Detached {} from {}{}",
        child,
        parent_id,
        if dissolved { " (group dissolved)" } else { "" }
    );

    Some(Detachment {
        from: parent_id,
        dissolved,
    })
}

/// Deletes `group` if it has fewer than two children, handing its slot in the
/// grandparent to the remaining child. Returns `true` if the group was removed.
fn dissolve_if_underfilled(store: &mut EntityStore, group: CircleId) -> bool {
    let Some(circle) = store.circle(&group) else {
        return false;
    };
    if !circle.is_composite() || circle.child_ids().len() >= 2 {
        return false;
    }

    let remaining = circle.child_ids().first().copied();
    let grandparent = store.parent_of(&group);
    store.remove_circle(&group);

    if let Some(grandparent) = grandparent {
        if let Some(children) = store
            .circle_mut(&grandparent)
            .and_then(|circle| circle.children.as_mut())
        {
            if let Some(slot) = children.iter().position(|id| *id == group) {
                match remaining {
                    Some(only) => children[slot] = only,
                    None => {
                        children.remove(slot);
                    }
                }
            }
        }
        if remaining.is_none() {
            dissolve_if_underfilled(store, grandparent);
        }
    }

    true
}
