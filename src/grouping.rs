//! Grouping pass run when an interaction ends.
//!
//! The pass looks at outermost circles only and merges every pair whose overlap
//! exceeds the configured margin. It is not transitively closed:
//! overlaps that only appear once a group has grown are picked up by the next
//! commit.

use crate::config::LayoutConfig;
use crate::geometry::{circles_overlap, Disc};
use crate::store::EntityStore;
use crate::types::*;
use eframe::egui::pos2;
use std::collections::HashMap;

/// A single merge performed by [`commit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Merge {
    /// Two leaf circles were wrapped in a new group.
    Created {
        /// The new group circle
        group: CircleId,
        /// The two circles it now owns
        members: [CircleId; 2],
    },
    /// An existing group took in another outermost circle.
    Extended {
        /// The group that grew
        group: CircleId,
        /// The circle that became its child
        joined: CircleId,
    },
}

impl Merge {
    /// The group that owns the result of the merge.
    pub fn group(&self) -> CircleId {
        match self {
            Merge::Created { group, .. } | Merge::Extended { group, .. } => *group,
        }
    }
}

/// Everything a commit pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReport {
    /// Merges in the order they were applied
    pub merges: Vec<Merge>,
}

impl CommitReport {
    /// True when the pass left the forest untouched.
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }
}

/// Clears every drag flag, then merges overlapping outermost circles pairwise.
///
/// Pairs are tested against the geometry at the start of the pass. When one
/// side of an overlapping pair was already absorbed earlier in the same pass,
/// the merge targets the group that absorbed it.
pub fn commit(store: &mut EntityStore, config: &LayoutConfig) -> CommitReport {
    for circle in store.circles_mut() {
        circle.is_dragging = false;
    }

    let roots: Vec<(CircleId, Disc)> = store
        .outermost()
        .into_iter()
        .filter_map(|id| store.circle(&id).map(|circle| (id, circle.disc())))
        .collect();

    let mut absorbed_into: HashMap<CircleId, CircleId> = HashMap::new();
    let mut report = CommitReport::default();

    for i in 0..roots.len() {
        for j in (i + 1)..roots.len() {
            let (first, first_disc) = roots[i];
            let (second, second_disc) = roots[j];
            if !circles_overlap(first_disc, second_disc, config.overlap_margin) {
                continue;
            }

            let a = current_root(&absorbed_into, first);
            let b = current_root(&absorbed_into, second);
            if a == b {
                continue;
            }

            let Some(merge) = merge_pair(store, config, a, b) else {
                continue;
            };
            let group = merge.group();
            for member in [a, b] {
                if member != group {
                    absorbed_into.insert(member, group);
                }
            }
            report.merges.push(merge);
        }
    }

    debug_assert!(store.check_forest().is_ok(), "commit left an invalid forest");
    report
}

fn current_root(absorbed_into: &HashMap<CircleId, CircleId>, id: CircleId) -> CircleId {
    let mut current = id;
    while let Some(next) = absorbed_into.get(&current) {
        current = *next;
    }
    current
}

fn merge_pair(
    store: &mut EntityStore,
    config: &LayoutConfig,
    a: CircleId,
    b: CircleId,
) -> Option<Merge> {
    let first = store.circle(&a)?;
    let second = store.circle(&b)?;

    match (first.is_composite(), second.is_composite()) {
        (false, false) => Some(create_group(store, config, a, b)),
        (true, false) => extend_group(store, config, a, b),
        (false, true) => extend_group(store, config, b, a),
        (true, true) => {
            let first_absorbs = first.radius > second.radius
                || (first.radius == second.radius && first.seq < second.seq);
            if first_absorbs {
                extend_group(store, config, a, b)
            } else {
                extend_group(store, config, b, a)
            }
        }
    }
}

fn create_group(store: &mut EntityStore, config: &LayoutConfig, a: CircleId, b: CircleId) -> Merge {
    let (position, items) = match (store.circle(&a), store.circle(&b)) {
        (Some(first), Some(second)) => {
            let midpoint = pos2(
                (first.position.x + second.position.x) / 2.0,
                (first.position.y + second.position.y) / 2.0,
            );
            let items: Vec<ItemId> = first.items.iter().chain(&second.items).copied().collect();
            (midpoint, items)
        }
        _ => (pos2(0.0, 0.0), Vec::new()),
    };

    let seq = store.next_seq();
    let radius = config.radius_for(items.len());
    let group = Circle::composite(position, vec![a, b], items, radius, seq);
    let group_id = group.id;
    store.insert_circle(group);

    log::debug!("Grouped {} and {} into new group {}", a, b, group_id);
    Merge::Created {
        group: group_id,
        members: [a, b],
    }
}

fn extend_group(
    store: &mut EntityStore,
    config: &LayoutConfig,
    group: CircleId,
    joined: CircleId,
) -> Option<Merge> {
    let joined_items = store.circle(&joined)?.items.clone();
    let target = store.circle_mut(&group)?;
    target.children.get_or_insert_with(Vec::new).push(joined);
    target.items.extend(joined_items);
    target.radius = config.radius_for(target.items.len());

    log::debug!(
        "Group {} took in {} ({} items)",
        group,
        joined,
        target.items.len()
    );
    Some(Merge::Extended { group, joined })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{add_group, add_leaf};
    use proptest::prelude::*;

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    #[test]
    fn test_overlapping_leaves_form_a_group() {
        let config = config();
        let mut store = EntityStore::new();
        let r = config.radius_for(1);
        let distance = r + r - (config.overlap_margin + 1.0);
        let a = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(distance, 0.0));

        let report = commit(&mut store, &config);

        assert_eq!(report.merges.len(), 1);
        let group_id = report.merges[0].group();
        let group = store.circle(&group_id).unwrap();
        assert_eq!(group.child_ids(), &[a, b]);
        assert_eq!(group.items.len(), 2);
        for member in [a, b] {
            let item = store.circle(&member).unwrap().items[0];
            assert!(group.items.contains(&item));
        }
        assert!((group.radius - config.radius_for(2)).abs() < 1e-4);
        assert!((group.position.x - distance / 2.0).abs() < 1e-4);
        assert_eq!(store.outermost(), vec![group_id]);
    }

    #[test]
    fn test_leaves_at_margin_stay_apart() {
        let config = config();
        let mut store = EntityStore::new();
        let r = config.radius_for(1);
        add_leaf(&mut store, &config, pos2(0.0, 0.0));
        add_leaf(&mut store, &config, pos2(r + r - config.overlap_margin, 0.0));

        assert!(commit(&mut store, &config).is_empty());
        assert_eq!(store.outermost().len(), 2);
    }

    #[test]
    fn test_commit_clears_drag_flags() {
        let config = config();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        store.circle_mut(&a).unwrap().is_dragging = true;

        commit(&mut store, &config);

        assert!(!store.circle(&a).unwrap().is_dragging);
    }

    #[test]
    fn test_group_extends_with_leaf() {
        let config = config();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(20.0, 0.0));
        let group = add_group(&mut store, &config, &[a, b]);
        let c = add_leaf(&mut store, &config, pos2(60.0, 0.0));

        let report = commit(&mut store, &config);

        assert_eq!(report.merges, vec![Merge::Extended { group, joined: c }]);
        let grown = store.circle(&group).unwrap();
        assert_eq!(grown.child_ids(), &[a, b, c]);
        assert_eq!(grown.items.len(), 3);
        assert!((grown.radius - config.radius_for(3)).abs() < 1e-4);
        assert!(store.check_forest().is_ok());
    }

    #[test]
    fn test_larger_group_absorbs_smaller() {
        let config = config();
        let mut store = EntityStore::new();
        let small_members = [
            add_leaf(&mut store, &config, pos2(0.0, 0.0)),
            add_leaf(&mut store, &config, pos2(0.0, 0.0)),
        ];
        let small = add_group(&mut store, &config, &small_members);
        let large_members = [
            add_leaf(&mut store, &config, pos2(100.0, 0.0)),
            add_leaf(&mut store, &config, pos2(100.0, 0.0)),
            add_leaf(&mut store, &config, pos2(100.0, 0.0)),
        ];
        let large = add_group(&mut store, &config, &large_members);

        let report = commit(&mut store, &config);

        assert_eq!(
            report.merges,
            vec![Merge::Extended {
                group: large,
                joined: small
            }]
        );
        assert_eq!(store.parent_of(&small), Some(large));
        assert_eq!(store.circle(&large).unwrap().items.len(), 5);
        assert!(store.check_forest().is_ok());
    }

    #[test]
    fn test_equal_groups_older_absorbs() {
        let config = config();
        let mut store = EntityStore::new();
        let first = [
            add_leaf(&mut store, &config, pos2(0.0, 0.0)),
            add_leaf(&mut store, &config, pos2(0.0, 0.0)),
        ];
        let older = add_group(&mut store, &config, &first);
        let second = [
            add_leaf(&mut store, &config, pos2(50.0, 0.0)),
            add_leaf(&mut store, &config, pos2(50.0, 0.0)),
        ];
        let newer = add_group(&mut store, &config, &second);

        commit(&mut store, &config);

        assert_eq!(store.parent_of(&newer), Some(older));
        assert_eq!(store.outermost(), vec![older]);
    }

    #[test]
    fn test_chain_joins_the_group_formed_earlier_in_the_pass() {
        let config = config();
        let mut store = EntityStore::new();
        let a = add_leaf(&mut store, &config, pos2(0.0, 0.0));
        let b = add_leaf(&mut store, &config, pos2(100.0, 0.0));
        let c = add_leaf(&mut store, &config, pos2(200.0, 0.0));

        let report = commit(&mut store, &config);

        assert_eq!(report.merges.len(), 2);
        let group = report.merges[0].group();
        assert_eq!(report.merges[1], Merge::Extended { group, joined: c });
        assert_eq!(store.circle(&group).unwrap().child_ids(), &[a, b, c]);
        assert_eq!(store.outermost(), vec![group]);
    }

    #[test]
    fn test_second_commit_is_a_no_op() {
        let config = config();
        let mut store = EntityStore::new();
        add_leaf(&mut store, &config, pos2(0.0, 0.0));
        add_leaf(&mut store, &config, pos2(40.0, 0.0));
        add_leaf(&mut store, &config, pos2(2_000.0, 0.0));

        let first = commit(&mut store, &config);
        let forest_after_first: Vec<Circle> = {
            let mut circles: Vec<Circle> = store.circles().cloned().collect();
            circles.sort_by_key(|c| c.seq);
            circles
        };
        let second = commit(&mut store, &config);
        let mut forest_after_second: Vec<Circle> = store.circles().cloned().collect();
        forest_after_second.sort_by_key(|c| c.seq);

        assert_eq!(first.merges.len(), 1);
        assert!(second.is_empty());
        assert_eq!(forest_after_first, forest_after_second);
    }

    proptest! {
        #[test]
        fn prop_commit_keeps_forest_valid(
            points in prop::collection::vec((-600.0f32..600.0, -600.0f32..600.0), 1..12),
            passes in 1usize..4,
        ) {
            let config = config();
            let mut store = EntityStore::new();
            for (x, y) in points {
                add_leaf(&mut store, &config, pos2(x, y));
            }

            for _ in 0..passes {
                commit(&mut store, &config);
                prop_assert!(store.check_forest().is_ok());
                for circle in store.circles() {
                    if circle.is_composite() {
                        prop_assert!(circle.child_ids().len() >= 2);
                        prop_assert!((circle.radius - config.radius_for(circle.items.len())).abs() < 1e-3);
                    }
                }
            }
        }
    }
}
