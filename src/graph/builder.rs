// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};

use crate::graph::model::{Graph, NodeId};
use crate::observability::messages::validation::StrayEdgeIgnored;
use crate::observability::messages::StructuredLog;

/// Adjacency representation derived from a [`Graph`] for a single run.
///
/// Holds each node's deduplicated successor list and its in-degree (count of
/// distinct incoming edges). The index itself is never mutated after
/// construction; layering works on a private copy of the in-degree map, so
/// one index can be layered repeatedly with identical results.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    order: Vec<NodeId>,
    successors: HashMap<NodeId, Vec<NodeId>>,
    in_degree: HashMap<NodeId, usize>,
}

impl AdjacencyIndex {
    /// Build the index from a node list and edge list.
    ///
    /// Every listed node starts with no successors and in-degree 0, even when
    /// no edge touches it. Edges naming a node outside the list are skipped
    /// (logged at debug level) rather than failing construction. Repeated
    /// edges between the same pair count once.
    pub fn build(graph: &Graph) -> Self {
        let mut order = Vec::with_capacity(graph.nodes.len());
        let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut in_degree: HashMap<NodeId, usize> = HashMap::new();

        for node in &graph.nodes {
            if successors.contains_key(node) {
                continue;
            }
            order.push(node.clone());
            successors.insert(node.clone(), Vec::new());
            in_degree.insert(node.clone(), 0);
        }

        let mut seen_edges: HashSet<(&NodeId, &NodeId)> = HashSet::new();
        for edge in &graph.edges {
            if !successors.contains_key(&edge.source) || !successors.contains_key(&edge.target) {
                StrayEdgeIgnored {
                    source: edge.source.as_str(),
                    target: edge.target.as_str(),
                }
                .log();
                continue;
            }
            if !seen_edges.insert((&edge.source, &edge.target)) {
                continue;
            }
            if let Some(list) = successors.get_mut(&edge.source) {
                list.push(edge.target.clone());
            }
            if let Some(degree) = in_degree.get_mut(&edge.target) {
                *degree += 1;
            }
        }

        Self {
            order,
            successors,
            in_degree,
        }
    }

    /// Nodes in first-seen order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.order
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.successors.contains_key(node)
    }

    /// Direct successors of `node`; empty for unknown ids.
    pub fn successors(&self, node: &NodeId) -> &[NodeId] {
        self.successors
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn in_degree(&self, node: &NodeId) -> usize {
        self.in_degree.get(node).copied().unwrap_or(0)
    }

    /// Fresh copy of the in-degree map for destructive use by one consumer.
    pub fn in_degree_snapshot(&self) -> HashMap<NodeId, usize> {
        self.in_degree.clone()
    }

    /// Reverse mapping (node -> direct predecessors), in node order.
    pub fn predecessors(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut reverse: HashMap<NodeId, Vec<NodeId>> = self
            .order
            .iter()
            .map(|node| (node.clone(), Vec::new()))
            .collect();

        for source in &self.order {
            for target in self.successors(source) {
                if let Some(list) = reverse.get_mut(target) {
                    list.push(source.clone());
                }
            }
        }

        reverse
    }

    /// Number of distinct edges retained in the index.
    pub fn edge_count(&self) -> usize {
        self.successors.values().map(Vec::len).sum()
    }
}
