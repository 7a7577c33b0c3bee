//! SignerGraph: the discovered tree of certificates signed by a root CA.
//!
//! Nodes live in a flat arena and point at each other by [`NodeIndex`]. The
//! graph also keeps every discovery event in order, including edges it
//! refused to insert, so the final report can list them where they were seen.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{CoreError, Result};
use crate::outcome::FailureReason;
use crate::types::{CertificateNode, NodeIndex};

/// One step of discovery, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DiscoveryEntry {
    /// A certificate inserted into the graph.
    Node(NodeIndex),
    /// A listed child that was refused. It has no descendants.
    Rejected {
        name: String,
        parent: NodeIndex,
        reason: FailureReason,
    },
}

/// Result of offering a child edge to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The child was new and now lives at this index.
    Inserted(NodeIndex),
    /// The name was already placed elsewhere in the graph (first discovery wins).
    Duplicate(NodeIndex),
    /// The edge was refused and recorded as a failed discovery entry.
    Rejected(FailureReason),
}

/// Arena-backed signer tree.
#[derive(Debug, Clone, Serialize)]
pub struct SignerGraph {
    nodes: Vec<CertificateNode>,
    #[serde(skip)]
    by_name: HashMap<String, NodeIndex>,
    entries: Vec<DiscoveryEntry>,
}

impl SignerGraph {
    /// Create a graph holding only the root certificate.
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let mut by_name = HashMap::new();
        by_name.insert(root.clone(), NodeIndex::ROOT);

        Self {
            nodes: vec![CertificateNode::new(root, None, 0)],
            by_name,
            entries: vec![DiscoveryEntry::Node(NodeIndex::ROOT)],
        }
    }

    /// The root node.
    pub fn root(&self) -> &CertificateNode {
        &self.nodes[0]
    }

    /// Get a node by index.
    pub fn node(&self, index: NodeIndex) -> Result<&CertificateNode> {
        self.nodes
            .get(index.get())
            .ok_or(CoreError::UnknownNode(index))
    }

    /// Name of a node, or an empty string for an unknown index.
    pub fn name(&self, index: NodeIndex) -> &str {
        self.nodes
            .get(index.get())
            .map(|n| n.name.as_str())
            .unwrap_or_default()
    }

    /// Number of inserted nodes (rejected entries are not counted).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A graph always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Look up a node by certificate name.
    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.by_name.get(name).copied()
    }

    /// Iterate over all nodes with their indices, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &CertificateNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i), node))
    }

    /// Discovery entries, in discovery order.
    pub fn entries(&self) -> &[DiscoveryEntry] {
        &self.entries
    }

    /// Number of rejected discovery entries.
    pub fn rejected_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiscoveryEntry::Rejected { .. }))
            .count()
    }

    /// Indices of all nodes at a given depth, in insertion order.
    pub fn nodes_at_depth(&self, depth: usize) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, node)| node.depth == depth)
            .map(|(index, _)| index)
            .collect()
    }

    /// Walk from `index`'s parent up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> Ancestors<'_> {
        let next = self.nodes.get(index.get()).and_then(|n| n.parent);
        Ancestors { graph: self, next }
    }

    /// Check whether `name` lies on the path from the root to `index` (inclusive).
    pub fn path_contains(&self, index: NodeIndex, name: &str) -> bool {
        if self.name(index) == name {
            return true;
        }
        self.ancestors(index)
            .any(|ancestor| self.name(ancestor) == name)
    }

    /// Offer a child edge `parent -> name` discovered via the store.
    ///
    /// Applies, in order: cycle rejection (name on the current path),
    /// first-discovery-wins deduplication, and the depth bound.
    pub fn insert_child(
        &mut self,
        parent: NodeIndex,
        name: &str,
        max_depth: usize,
    ) -> Result<Insertion> {
        let parent_depth = self.node(parent)?.depth;

        if self.path_contains(parent, name) {
            self.entries.push(DiscoveryEntry::Rejected {
                name: name.to_string(),
                parent,
                reason: FailureReason::CycleDetected,
            });
            return Ok(Insertion::Rejected(FailureReason::CycleDetected));
        }

        if let Some(existing) = self.index_of(name) {
            return Ok(Insertion::Duplicate(existing));
        }

        let depth = parent_depth + 1;
        if depth > max_depth {
            self.entries.push(DiscoveryEntry::Rejected {
                name: name.to_string(),
                parent,
                reason: FailureReason::DepthExceeded,
            });
            return Ok(Insertion::Rejected(FailureReason::DepthExceeded));
        }

        let index = NodeIndex(self.nodes.len());
        self.nodes
            .push(CertificateNode::new(name.to_string(), Some(parent), depth));
        self.nodes[parent.get()].children.push(index);
        self.by_name.insert(name.to_string(), index);
        self.entries.push(DiscoveryEntry::Node(index));

        Ok(Insertion::Inserted(index))
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    graph: &'a SignerGraph,
    next: Option<NodeIndex>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self
            .graph
            .nodes
            .get(current.get())
            .and_then(|n| n.parent);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_graph_has_root() {
        let graph = SignerGraph::new("ca");
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.root().name, "ca");
        assert_eq!(graph.root().parent, None);
        assert_eq!(graph.index_of("ca"), Some(NodeIndex::ROOT));
        assert_eq!(graph.entries(), &[DiscoveryEntry::Node(NodeIndex::ROOT)]);
    }

    #[test]
    fn test_insert_children() {
        let mut graph = SignerGraph::new("ca");
        let mid = graph.insert_child(NodeIndex::ROOT, "mid", 8).unwrap();
        let Insertion::Inserted(mid) = mid else {
            panic!("expected insertion");
        };
        let leaf = graph.insert_child(mid, "leaf", 8).unwrap();
        let Insertion::Inserted(leaf) = leaf else {
            panic!("expected insertion");
        };

        assert_eq!(graph.node(mid).unwrap().depth, 1);
        assert_eq!(graph.node(leaf).unwrap().depth, 2);
        assert_eq!(graph.node(leaf).unwrap().parent, Some(mid));
        assert_eq!(graph.root().children, vec![mid]);
        assert_eq!(graph.ancestors(leaf).collect::<Vec<_>>(), vec![mid, NodeIndex::ROOT]);
        assert_eq!(graph.nodes_at_depth(2), vec![leaf]);
    }

    #[test]
    fn test_cycle_to_root_rejected() {
        let mut graph = SignerGraph::new("ca");
        let Insertion::Inserted(mid) = graph.insert_child(NodeIndex::ROOT, "mid", 8).unwrap() else {
            panic!("expected insertion");
        };

        let result = graph.insert_child(mid, "ca", 8).unwrap();
        assert_eq!(result, Insertion::Rejected(FailureReason::CycleDetected));
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.entries().last(),
            Some(&DiscoveryEntry::Rejected {
                name: "ca".into(),
                parent: mid,
                reason: FailureReason::CycleDetected,
            })
        );
    }

    #[test]
    fn test_self_edge_is_cycle() {
        let mut graph = SignerGraph::new("ca");
        let result = graph.insert_child(NodeIndex::ROOT, "ca", 8).unwrap();
        assert_eq!(result, Insertion::Rejected(FailureReason::CycleDetected));
    }

    #[test]
    fn test_duplicate_off_path_is_dropped() {
        let mut graph = SignerGraph::new("ca");
        let Insertion::Inserted(a) = graph.insert_child(NodeIndex::ROOT, "a", 8).unwrap() else {
            panic!("expected insertion");
        };
        let Insertion::Inserted(b) = graph.insert_child(NodeIndex::ROOT, "b", 8).unwrap() else {
            panic!("expected insertion");
        };
        let Insertion::Inserted(shared) = graph.insert_child(a, "shared", 8).unwrap() else {
            panic!("expected insertion");
        };

        let entries_before = graph.entries().len();
        let result = graph.insert_child(b, "shared", 8).unwrap();
        assert_eq!(result, Insertion::Duplicate(shared));
        assert_eq!(graph.entries().len(), entries_before);
        assert!(graph.node(b).unwrap().children.is_empty());
    }

    #[test]
    fn test_depth_exceeded() {
        let mut graph = SignerGraph::new("ca");
        let Insertion::Inserted(a) = graph.insert_child(NodeIndex::ROOT, "a", 1).unwrap() else {
            panic!("expected insertion");
        };
        let result = graph.insert_child(a, "b", 1).unwrap();
        assert_eq!(result, Insertion::Rejected(FailureReason::DepthExceeded));
        assert_eq!(graph.index_of("b"), None);
        assert_eq!(graph.rejected_count(), 1);
    }

    #[test]
    fn test_unknown_parent() {
        let mut graph = SignerGraph::new("ca");
        let err = graph.insert_child(NodeIndex(9), "x", 8).unwrap_err();
        assert_eq!(err, CoreError::UnknownNode(NodeIndex(9)));
    }

    proptest! {
        #[test]
        fn test_random_edges_keep_invariants(
            edges in prop::collection::vec((0usize..32, 0usize..12), 0..64),
            max_depth in 1usize..6,
        ) {
            let mut graph = SignerGraph::new("n0");
            for (parent_pick, child) in edges {
                let parent = NodeIndex(parent_pick % graph.len());
                let name = format!("n{}", child);
                graph.insert_child(parent, &name, max_depth).unwrap();
            }

            // Names are unique.
            let mut names: Vec<_> = graph.nodes().map(|(_, n)| n.name.clone()).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), total);

            for (index, node) in graph.nodes() {
                // No node appears among its own ancestors.
                for ancestor in graph.ancestors(index) {
                    prop_assert_ne!(graph.name(ancestor), node.name.as_str());
                }
                prop_assert!(node.depth <= max_depth);
                prop_assert_eq!(graph.ancestors(index).count(), node.depth);
            }

            // Every inserted node appears exactly once among the entries.
            let node_entries = graph
                .entries()
                .iter()
                .filter(|e| matches!(e, DiscoveryEntry::Node(_)))
                .count();
            prop_assert_eq!(node_entries, graph.len());
        }
    }
}
