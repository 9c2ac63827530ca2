// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Run-level errors. Individual node failures are not errors of the run; they
//! are recorded as that node's outcome.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::graph::NodeId;

/// Errors that stop a scheduler run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The graph contains one or more cycles; no node was executed.
    #[error("dependency graph contains a cycle involving: {}", join(.nodes))]
    CyclicGraph { nodes: BTreeSet<NodeId> },

    /// Layering emitted fewer nodes than the graph holds. Cycle detection
    /// should have caught this first, so it indicates an internal bug.
    #[error(
        "layering emitted {emitted} of {expected} nodes; unresolved: {}",
        join(.unresolved)
    )]
    LayeringInconsistency {
        emitted: usize,
        expected: usize,
        unresolved: Vec<NodeId>,
    },

    /// Cancellation was observed at a layer boundary.
    #[error("run cancelled before layer {layer} of {total_layers}")]
    Cancelled { layer: usize, total_layers: usize },
}

impl SchedulerError {
    /// Structural errors describe the graph's shape, not a runtime event.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SchedulerError::CyclicGraph { .. } | SchedulerError::LayeringInconsistency { .. }
        )
    }
}

fn join<'a>(nodes: impl IntoIterator<Item = &'a NodeId>) -> String {
    nodes
        .into_iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
