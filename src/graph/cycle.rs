// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cycle detection over an [`AdjacencyIndex`].
//!
//! Uses the "three colors" depth-first search:
//! - **Unvisited**: node not yet explored
//! - **InProgress**: node is on the current DFS path
//! - **Done**: node and everything reachable from it fully explored
//!
//! Unlike a fail-on-first-cycle check, traversal keeps going so every
//! independent cycle is reported. The traversal keeps its own stack of
//! `(node, next successor index)` frames, so depth is bounded by heap memory
//! rather than the call stack.
//!
//! A back edge only names the nodes on one DFS path, and cycles that close
//! through an already-finished node (a cross edge) never produce one. Each node
//! therefore also carries its discovery time and the lowest discovery time it
//! can reach (its low-link). A node whose low-link equals its own discovery
//! time roots a strongly connected component; every component with more than
//! one member, plus every self-edge, is a cycle.
//!
//! **Time Complexity**: O(V + E), single pass.

use std::collections::{BTreeSet, HashMap};

use crate::errors::SchedulerError;
use crate::graph::builder::AdjacencyIndex;
use crate::graph::model::NodeId;
use crate::observability::messages::engine::CycleDetected;
use crate::observability::messages::StructuredLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Per-node traversal state, indexed by position in [`AdjacencyIndex::nodes`].
struct Traversal {
    marks: Vec<Mark>,
    discovered: Vec<usize>,
    low_link: Vec<usize>,
    on_component: Vec<bool>,
    component: Vec<usize>,
    path: Vec<(usize, usize)>,
    in_cycle: Vec<bool>,
    clock: usize,
}

impl Traversal {
    fn new(node_count: usize) -> Self {
        Self {
            marks: vec![Mark::Unvisited; node_count],
            discovered: vec![0; node_count],
            low_link: vec![0; node_count],
            on_component: vec![false; node_count],
            component: Vec::new(),
            path: Vec::new(),
            in_cycle: vec![false; node_count],
            clock: 0,
        }
    }

    fn enter(&mut self, node: usize) {
        self.marks[node] = Mark::InProgress;
        self.discovered[node] = self.clock;
        self.low_link[node] = self.clock;
        self.clock += 1;
        self.on_component[node] = true;
        self.component.push(node);
        self.path.push((node, 0));
    }

    fn lower(&mut self, node: usize, to: usize) {
        self.low_link[node] = self.low_link[node].min(to);
    }

    fn finish(&mut self, node: usize) {
        self.marks[node] = Mark::Done;
        self.path.pop();

        if self.low_link[node] == self.discovered[node] {
            let mut members = Vec::new();
            while let Some(member) = self.component.pop() {
                self.on_component[member] = false;
                members.push(member);
                if member == node {
                    break;
                }
            }
            if members.len() > 1 {
                for member in members {
                    self.in_cycle[member] = true;
                }
            }
        }

        if let Some(&(parent, _)) = self.path.last() {
            self.lower(parent, self.low_link[node]);
        }
    }
}

/// Return every node that participates in at least one cycle.
///
/// An empty set means the graph is acyclic. Self-edges produce a single-node
/// cycle; disjoint components are each used as DFS roots.
pub fn detect_cycles(index: &AdjacencyIndex) -> BTreeSet<NodeId> {
    let nodes = index.nodes();
    let position: HashMap<&NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(at, node)| (node, at))
        .collect();
    let mut traversal = Traversal::new(nodes.len());

    for root in 0..nodes.len() {
        if traversal.marks[root] != Mark::Unvisited {
            continue;
        }
        traversal.enter(root);

        while let Some(frame) = traversal.path.last_mut() {
            let (node, cursor) = *frame;
            let successors = index.successors(&nodes[node]);

            if cursor >= successors.len() {
                traversal.finish(node);
                continue;
            }
            frame.1 += 1;

            let Some(&next) = position.get(&successors[cursor]) else {
                continue;
            };

            match traversal.marks[next] {
                Mark::Unvisited => traversal.enter(next),
                Mark::InProgress => {
                    if next == node {
                        traversal.in_cycle[node] = true;
                    }
                    traversal.lower(node, traversal.discovered[next]);
                }
                Mark::Done => {
                    if traversal.on_component[next] {
                        traversal.lower(node, traversal.discovered[next]);
                    }
                }
            }
        }
    }

    nodes
        .iter()
        .zip(traversal.in_cycle)
        .filter(|(_, in_cycle)| *in_cycle)
        .map(|(node, _)| node.clone())
        .collect()
}

/// Fail with [`SchedulerError::CyclicGraph`] when any cycle exists.
pub fn ensure_acyclic(index: &AdjacencyIndex) -> Result<(), SchedulerError> {
    let nodes = detect_cycles(index);
    if nodes.is_empty() {
        return Ok(());
    }

    let rendered: Vec<&str> = nodes.iter().map(NodeId::as_str).collect();
    CycleDetected { nodes: &rendered }.log();
    Err(SchedulerError::CyclicGraph { nodes })
}
