// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SchedulerError;
use crate::graph::builder::AdjacencyIndex;
use crate::graph::model::{Layer, NodeId};

/// Compute topological layers using breadth-wise Kahn's algorithm.
///
/// ## Algorithm
/// 1. Frontier starts as every node with in-degree 0 (in node order)
/// 2. Emit the frontier as the next layer
/// 3. Decrement the in-degree of each successor of each frontier node; a
///    successor reaching exactly 0 joins the next frontier
/// 4. Stop when the frontier is empty
///
/// Works on a private copy of the in-degree map, so the index can be layered
/// again with identical layer membership.
///
/// ## Return Value
/// - Layer 0: nodes with no dependencies
/// - Layer N: nodes whose dependencies all lie in layers 0..N-1
///
/// ## Error Conditions
/// Returns [`SchedulerError::LayeringInconsistency`] if fewer nodes were emitted
/// than the index holds. That only happens for a cycle that slipped past cycle
/// detection; a partial layering is never returned.
///
/// **Time Complexity**: O(V + E)
pub fn compute_layers(index: &AdjacencyIndex) -> Result<Vec<Layer>, SchedulerError> {
    let mut in_degree = index.in_degree_snapshot();
    let mut layers = Vec::new();
    let mut emitted = 0usize;

    let mut frontier: Vec<NodeId> = index
        .nodes()
        .iter()
        .filter(|node| index.in_degree(node) == 0)
        .cloned()
        .collect();

    while !frontier.is_empty() {
        let mut next = Vec::new();

        for node in &frontier {
            for successor in index.successors(node) {
                if let Some(degree) = in_degree.get_mut(successor) {
                    // never underflow
                    if *degree == 0 {
                        continue;
                    }
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(successor.clone());
                    }
                }
            }
        }

        emitted += frontier.len();
        layers.push(Layer::from(std::mem::replace(&mut frontier, next)));
    }

    let expected = index.node_count();
    if emitted != expected {
        let unresolved: Vec<NodeId> = index
            .nodes()
            .iter()
            .filter(|node| in_degree.get(*node).copied().unwrap_or(0) > 0)
            .cloned()
            .collect();
        return Err(SchedulerError::LayeringInconsistency {
            emitted,
            expected,
            unresolved,
        });
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{Edge, Graph};
    use std::collections::{HashMap, HashSet};

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn membership(layers: &[Layer]) -> Vec<HashSet<NodeId>> {
        layers
            .iter()
            .map(|layer| layer.iter().cloned().collect())
            .collect()
    }

    /// Deterministic pseudo-random DAG: edges only go from lower to higher index.
    fn generated_dag(node_count: usize, seed: u64) -> Graph {
        let nodes: Vec<NodeId> = (0..node_count).map(|i| NodeId::new(format!("n{i}"))).collect();
        let mut state = seed;
        let mut edges = Vec::new();
        for target in 1..node_count {
            for source in 0..target {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                if (state >> 33) % 7 == 0 {
                    edges.push(Edge::new(nodes[source].clone(), nodes[target].clone()));
                }
            }
        }
        Graph::new(nodes, edges)
    }

    #[test]
    fn test_diamond_layers() {
        let graph = Graph::from_pairs(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        let layers = compute_layers(&AdjacencyIndex::build(&graph)).unwrap();

        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].nodes(), &[id("a")]);
        assert_eq!(layers[1].len(), 2);
        assert!(layers[1].contains(&id("b")));
        assert!(layers[1].contains(&id("c")));
        assert_eq!(layers[2].nodes(), &[id("d")]);
    }

    #[test]
    fn test_isolated_node_lands_in_first_layer() {
        let graph = Graph::from_pairs(&["a", "b", "lonely"], &[("a", "b")]);
        let layers = compute_layers(&AdjacencyIndex::build(&graph)).unwrap();

        assert!(layers[0].contains(&id("lonely")));
        assert!(layers[0].contains(&id("a")));
        assert_eq!(layers[1].nodes(), &[id("b")]);
    }

    #[test]
    fn test_empty_graph_has_no_layers() {
        let layers = compute_layers(&AdjacencyIndex::build(&Graph::default())).unwrap();
        assert!(layers.is_empty());
    }

    #[test]
    fn test_node_waits_for_longest_dependency_chain() {
        // a -> b -> c and a -> c: c must land after b, not right after a
        let graph = Graph::from_pairs(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let layers = compute_layers(&AdjacencyIndex::build(&graph)).unwrap();

        assert_eq!(layers.len(), 3);
        assert_eq!(layers[2].nodes(), &[id("c")]);
    }

    #[test]
    fn test_every_node_appears_exactly_once() {
        for seed in [1u64, 7, 42, 1234] {
            let graph = generated_dag(40, seed);
            let layers = compute_layers(&AdjacencyIndex::build(&graph)).unwrap();

            let mut seen = HashSet::new();
            for node in layers.iter().flat_map(|layer| layer.iter()) {
                assert!(seen.insert(node.clone()), "{} emitted twice", node);
            }
            assert_eq!(seen.len(), graph.nodes.len());
        }
    }

    #[test]
    fn test_predecessors_live_in_earlier_layers() {
        for seed in [3u64, 99, 2025] {
            let graph = generated_dag(40, seed);
            let index = AdjacencyIndex::build(&graph);
            let layers = compute_layers(&index).unwrap();

            let layer_of: HashMap<&NodeId, usize> = layers
                .iter()
                .enumerate()
                .flat_map(|(i, layer)| layer.iter().map(move |node| (node, i)))
                .collect();

            for edge in &graph.edges {
                assert!(
                    layer_of[&edge.source] < layer_of[&edge.target],
                    "{} -> {} violates layer order",
                    edge.source,
                    edge.target
                );
            }
        }
    }

    #[test]
    fn test_layering_is_repeatable_on_same_index() {
        let index = AdjacencyIndex::build(&generated_dag(30, 17));

        let first = compute_layers(&index).unwrap();
        let second = compute_layers(&index).unwrap();

        assert_eq!(membership(&first), membership(&second));
    }

    #[test]
    fn test_cycle_yields_inconsistency_instead_of_partial_layers() {
        let graph = Graph::from_pairs(
            &["entry", "a", "b", "c"],
            &[("entry", "a"), ("a", "b"), ("b", "c"), ("c", "a")],
        );

        match compute_layers(&AdjacencyIndex::build(&graph)) {
            Err(SchedulerError::LayeringInconsistency {
                emitted,
                expected,
                unresolved,
            }) => {
                assert_eq!(emitted, 1);
                assert_eq!(expected, 4);
                assert_eq!(unresolved, vec![id("a"), id("b"), id("c")]);
            }
            other => panic!("expected LayeringInconsistency, got {:?}", other),
        }
    }
}
