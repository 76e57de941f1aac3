//! Default target selection
//!
//! Picks a subset of targets in which no two targets overlap, used when the
//! user has not chosen targets explicitly. Every policy returns an
//! independent set of the overlap graph that contains all isolated targets
//! (including targets without sources). Which member of a group of mutually
//! overlapping targets wins depends on the policy.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::id::TargetId;
use super::overlap::OverlapGraph;
use super::target::BuildTarget;

/// Strategy for choosing between overlapping targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Greedy pass in snapshot order: earlier targets win
    #[default]
    InputOrder,
    /// Greedy pass in target id order, independent of snapshot order
    ById,
    /// Repeatedly accepts conflict-free targets and drops the worst remaining
    /// conflict, preferring to keep dependents of accepted targets
    DependencyAware,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::InputOrder => "input_order",
            SelectionPolicy::ById => "by_id",
            SelectionPolicy::DependencyAware => "dependency_aware",
        }
    }
}

/// Computes the default selection, returned in snapshot order
pub fn default_selection(
    targets: &[BuildTarget],
    overlaps: &OverlapGraph,
    policy: SelectionPolicy,
) -> Vec<TargetId> {
    let accepted = match policy {
        SelectionPolicy::InputOrder => greedy(targets.iter().map(|t| &t.id), overlaps),
        SelectionPolicy::ById => {
            let mut ids: Vec<_> = targets.iter().map(|t| &t.id).collect();
            ids.sort();
            greedy(ids.into_iter(), overlaps)
        }
        SelectionPolicy::DependencyAware => dependency_aware(targets, overlaps),
    };

    let selection: Vec<TargetId> = targets
        .iter()
        .filter(|t| accepted.contains(&t.id))
        .map(|t| t.id.clone())
        .collect();

    tracing::debug!(
        policy = policy.as_str(),
        selected = selection.len(),
        total = targets.len(),
        "computed default selection"
    );

    selection
}

/// Accepts each target whose conflicts have not been accepted yet
fn greedy<'a>(
    order: impl Iterator<Item = &'a TargetId>,
    overlaps: &OverlapGraph,
) -> HashSet<TargetId> {
    let mut accepted = HashSet::new();
    for id in order {
        if overlaps
            .conflicts(id)
            .into_iter()
            .all(|conflict| !accepted.contains(conflict))
        {
            accepted.insert(id.clone());
        }
    }
    accepted
}

/// Peels the overlap graph until it is empty
///
/// Each round accepts every target without remaining conflicts, then removes
/// one target: a conflict of a not-yet-accepted dependent of an accepted
/// target if there is one, otherwise the target with the most conflicts
/// (earliest in snapshot order on ties).
fn dependency_aware(targets: &[BuildTarget], overlaps: &OverlapGraph) -> HashSet<TargetId> {
    let position: HashMap<&TargetId, usize> =
        targets.iter().enumerate().map(|(i, t)| (&t.id, i)).collect();

    let mut remaining: BTreeMap<usize, BTreeSet<usize>> = targets
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let conflicts = overlaps
                .conflicts(&t.id)
                .into_iter()
                .filter_map(|c| position.get(c).copied())
                .collect();
            (i, conflicts)
        })
        .collect();

    let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, target) in targets.iter().enumerate() {
        for dep in &target.dependencies {
            if let Some(&dep_pos) = position.get(dep) {
                dependents.entry(dep_pos).or_default().push(i);
            }
        }
    }

    let mut accepted = BTreeSet::new();
    let mut dependers: BTreeSet<usize> = BTreeSet::new();

    while !remaining.is_empty() {
        let isolated: Vec<usize> = remaining
            .iter()
            .filter(|(_, conflicts)| conflicts.is_empty())
            .map(|(&i, _)| i)
            .collect();

        for &i in &isolated {
            accepted.insert(i);
            dependers.extend(dependents.get(&i).into_iter().flatten().copied());
        }

        let worst = dependers
            .iter()
            .filter_map(|d| remaining.get(d))
            .flat_map(|conflicts| conflicts.iter())
            .next()
            .copied()
            .or_else(|| {
                remaining
                    .iter()
                    .filter(|(_, conflicts)| !conflicts.is_empty())
                    .max_by_key(|(&i, conflicts)| (conflicts.len(), Reverse(i)))
                    .map(|(&i, _)| i)
            });

        let removed: Vec<usize> = isolated.into_iter().chain(worst).collect();
        for node in &removed {
            if let Some(conflicts) = remaining.remove(node) {
                for other in conflicts {
                    if let Some(set) = remaining.get_mut(&other) {
                        set.remove(node);
                    }
                }
            }
            dependers.remove(node);
        }
    }

    accepted.into_iter().map(|i| targets[i].id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::ProjectSnapshot;
    use crate::domain::source_index::{DirectoryGrouping, SourceIndex};
    use crate::domain::target::{SourceItem, SourcesItem};

    struct Fixture {
        snapshot: ProjectSnapshot,
        overlaps: OverlapGraph,
    }

    impl Fixture {
        /// Each entry: (target, dependencies, source files)
        fn new(items: &[(&str, &[&str], &[&str])]) -> Self {
            let targets = items
                .iter()
                .map(|(id, deps, _)| {
                    deps.iter().fold(BuildTarget::new(TargetId::new(*id)), |t, d| {
                        t.with_dependency(TargetId::new(*d))
                    })
                })
                .collect();
            let sources = items
                .iter()
                .filter(|(_, _, files)| !files.is_empty())
                .map(|(id, _, files)| {
                    SourcesItem::new(
                        TargetId::new(*id),
                        files.iter().map(|f| SourceItem::file(*f)).collect(),
                    )
                })
                .collect();
            let snapshot = ProjectSnapshot::new(targets, sources);
            let overlaps =
                OverlapGraph::build(&SourceIndex::build(&snapshot, DirectoryGrouping::Disabled));
            Self { snapshot, overlaps }
        }

        fn select(&self, policy: SelectionPolicy) -> Vec<String> {
            default_selection(&self.snapshot.targets, &self.overlaps, policy)
                .into_iter()
                .map(|id| id.to_string())
                .collect()
        }

        fn assert_independent(&self, selection: &[String]) {
            for a in selection {
                for b in selection {
                    assert!(
                        !self.overlaps.overlaps(&TargetId::new(a.as_str()), &TargetId::new(b.as_str())),
                        "{a} and {b} overlap"
                    );
                }
            }
        }
    }

    const ALL: [SelectionPolicy; 3] = [
        SelectionPolicy::InputOrder,
        SelectionPolicy::ById,
        SelectionPolicy::DependencyAware,
    ];

    #[test]
    fn no_targets_no_selection() {
        let fixture = Fixture::new(&[]);
        for policy in ALL {
            assert!(fixture.select(policy).is_empty());
        }
    }

    #[test]
    fn disjoint_targets_are_all_selected() {
        let fixture = Fixture::new(&[
            ("//a", &[], &["file:///a/A.java"]),
            ("//b", &[], &["file:///b/B.java"]),
        ]);
        for policy in ALL {
            assert_eq!(fixture.select(policy), vec!["//a", "//b"]);
        }
    }

    #[test]
    fn shared_file_selects_exactly_one() {
        let fixture = Fixture::new(&[
            ("//a", &[], &["file:///f1"]),
            ("//b", &[], &["file:///f1"]),
        ]);
        for policy in ALL {
            let selection = fixture.select(policy);
            assert_eq!(selection.len(), 1);
            fixture.assert_independent(&selection);
        }
    }

    #[test]
    fn targets_without_sources_are_always_selected() {
        let fixture = Fixture::new(&[
            ("//a", &[], &["file:///f1"]),
            ("//b", &[], &["file:///f1"]),
            ("//no-sources", &["//a"], &[]),
        ]);
        for policy in ALL {
            assert!(fixture.select(policy).contains(&"//no-sources".to_string()));
        }
    }

    #[test]
    fn input_order_prefers_earlier_targets() {
        let fixture = Fixture::new(&[
            ("//z", &[], &["file:///f1"]),
            ("//a", &[], &["file:///f1"]),
        ]);
        assert_eq!(fixture.select(SelectionPolicy::InputOrder), vec!["//z"]);
        assert_eq!(fixture.select(SelectionPolicy::ById), vec!["//a"]);
    }

    #[test]
    fn by_id_ignores_snapshot_order() {
        let forward = Fixture::new(&[
            ("//a", &[], &["file:///f1"]),
            ("//b", &[], &["file:///f1", "file:///f2"]),
            ("//c", &[], &["file:///f2"]),
        ]);
        let backward = Fixture::new(&[
            ("//c", &[], &["file:///f2"]),
            ("//b", &[], &["file:///f1", "file:///f2"]),
            ("//a", &[], &["file:///f1"]),
        ]);

        let mut f = forward.select(SelectionPolicy::ById);
        let mut b = backward.select(SelectionPolicy::ById);
        f.sort();
        b.sort();
        assert_eq!(f, b);
        assert_eq!(f, vec!["//a", "//c"]);
    }

    #[test]
    fn dependency_aware_drops_hub_target() {
        let fixture = Fixture::new(&[
            ("//hub", &[], &["file:///1", "file:///2", "file:///3"]),
            ("//l1", &[], &["file:///1"]),
            ("//l2", &[], &["file:///2"]),
            ("//l3", &[], &["file:///3"]),
        ]);

        assert_eq!(fixture.select(SelectionPolicy::InputOrder), vec!["//hub"]);
        assert_eq!(
            fixture.select(SelectionPolicy::DependencyAware),
            vec!["//l1", "//l2", "//l3"]
        );
    }

    #[test]
    fn dependency_aware_keeps_dependents_of_accepted_targets() {
        // //b1 and //b2 tie on conflicts; //b1 wins because it depends on the
        // already accepted //a1
        let fixture = Fixture::new(&[
            ("//b2", &[], &["file:///b"]),
            ("//b1", &["//a1"], &["file:///b"]),
            ("//a1", &[], &["file:///a"]),
        ]);

        assert_eq!(
            fixture.select(SelectionPolicy::DependencyAware),
            vec!["//b1", "//a1"]
        );
        assert_eq!(fixture.select(SelectionPolicy::InputOrder), vec!["//b2", "//a1"]);
    }

    #[test]
    fn dependency_cycles_are_harmless() {
        let fixture = Fixture::new(&[
            ("//a", &["//b"], &["file:///a"]),
            ("//b", &["//a"], &["file:///b"]),
        ]);
        for policy in ALL {
            assert_eq!(fixture.select(policy), vec!["//a", "//b"]);
        }
    }

    #[test]
    fn chains_stay_independent() {
        let fixture = Fixture::new(&[
            ("//a", &[], &["file:///1"]),
            ("//b", &[], &["file:///1", "file:///2"]),
            ("//c", &[], &["file:///2", "file:///3"]),
            ("//d", &[], &["file:///3", "file:///4"]),
            ("//e", &[], &["file:///4"]),
        ]);
        for policy in ALL {
            let selection = fixture.select(policy);
            fixture.assert_independent(&selection);
            assert!(!selection.is_empty());
        }
    }
}
