//! Overlap graph between targets
//!
//! Two targets overlap when they share ownership of at least one document.
//! Uses petgraph for graph storage and connected components.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::id::TargetId;
use super::source_index::SourceIndex;

/// Symmetric, duplicate-free overlap relation between targets
///
/// Only targets with at least one source item are nodes. Nodes are added in
/// canonical target order, so node indices double as canonical positions.
#[derive(Debug, Default)]
pub struct OverlapGraph {
    graph: UnGraph<TargetId, ()>,
    node_map: HashMap<TargetId, NodeIndex>,
}

impl OverlapGraph {
    /// Builds the overlap graph from a source index
    pub fn build(index: &SourceIndex) -> Self {
        let mut overlaps = Self::default();

        for target in index.targets_with_sources() {
            let idx = overlaps.graph.add_node(target.clone());
            overlaps.node_map.insert(target.clone(), idx);
        }

        for document in index.indexed_documents() {
            let owners = index.owners(document);
            if owners.len() < 2 {
                continue;
            }
            for (i, a) in owners.iter().enumerate() {
                for b in &owners[i + 1..] {
                    overlaps.add_overlap(a, b);
                }
            }
        }

        tracing::debug!(
            targets = overlaps.len(),
            overlaps = overlaps.edge_count(),
            "built overlap graph"
        );

        overlaps
    }

    fn add_overlap(&mut self, a: &TargetId, b: &TargetId) {
        if a == b {
            return;
        }
        let (Some(&a_idx), Some(&b_idx)) = (self.node_map.get(a), self.node_map.get(b)) else {
            return;
        };
        self.graph.update_edge(a_idx, b_idx, ());
    }

    /// Returns the targets overlapping with `target`, in canonical order
    pub fn conflicts(&self, target: &TargetId) -> Vec<&TargetId> {
        let Some(&idx) = self.node_map.get(target) else {
            return vec![];
        };

        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors.into_iter().map(|n| &self.graph[n]).collect()
    }

    /// Returns true if the two targets overlap
    pub fn overlaps(&self, a: &TargetId, b: &TargetId) -> bool {
        match (self.node_map.get(a), self.node_map.get(b)) {
            (Some(&a_idx), Some(&b_idx)) => self.graph.contains_edge(a_idx, b_idx),
            _ => false,
        }
    }

    /// Returns the number of targets overlapping with `target`
    pub fn degree(&self, target: &TargetId) -> usize {
        self.conflicts(target).len()
    }

    /// Returns true if the target has at least one source item
    pub fn contains(&self, target: &TargetId) -> bool {
        self.node_map.contains_key(target)
    }

    /// Returns the number of targets in the graph
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph has no targets
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the number of overlap edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns all targets in the graph, in canonical order
    pub fn target_ids(&self) -> impl Iterator<Item = &TargetId> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Returns the adjacency map
    pub fn to_map(&self) -> BTreeMap<TargetId, BTreeSet<TargetId>> {
        self.target_ids()
            .map(|id| {
                let conflicts = self.conflicts(id).into_iter().cloned().collect();
                (id.clone(), conflicts)
            })
            .collect()
    }

    /// Returns the connected components, each in canonical order
    ///
    /// Components are ordered by their first member. Isolated targets form
    /// singleton components.
    pub fn components(&self) -> Vec<Vec<TargetId>> {
        let mut sets = UnionFind::<usize>::new(self.graph.node_count());
        for edge in self.graph.edge_indices() {
            if let Some((a, b)) = self.graph.edge_endpoints(edge) {
                sets.union(a.index(), b.index());
            }
        }

        let mut components: Vec<Vec<TargetId>> = Vec::new();
        let mut by_root: HashMap<usize, usize> = HashMap::new();
        for idx in self.graph.node_indices() {
            let root = sets.find(idx.index());
            let slot = *by_root.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(self.graph[idx].clone());
        }
        components
    }
}
