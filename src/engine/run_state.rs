// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::engine::outcome::ExecutionOutcome;
use crate::errors::SchedulerError;
use crate::graph::{Layer, NodeId};
use crate::observability::messages::engine::PhaseChanged;
use crate::observability::messages::StructuredLog;

/// Terminal reason for a run that did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseFailure {
    Cyclic,
    LayeringInconsistency,
    Cancelled,
}

/// Orchestrator state machine:
/// `Idle -> Validating -> Layering -> ExecutingLayer(0..n) -> Completed`,
/// with `Failed(..)` reachable from validation, layering, or any layer boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Validating,
    Layering,
    ExecutingLayer(usize),
    Completed,
    Failed(PhaseFailure),
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Validating => write!(f, "validating"),
            RunPhase::Layering => write!(f, "layering"),
            RunPhase::ExecutingLayer(layer) => write!(f, "executing_layer({})", layer),
            RunPhase::Completed => write!(f, "completed"),
            RunPhase::Failed(PhaseFailure::Cyclic) => write!(f, "failed(cyclic)"),
            RunPhase::Failed(PhaseFailure::LayeringInconsistency) => {
                write!(f, "failed(layering_inconsistency)")
            }
            RunPhase::Failed(PhaseFailure::Cancelled) => write!(f, "failed(cancelled)"),
        }
    }
}

/// Outcome of one node plus the layer it ran in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord<T> {
    pub layer: usize,
    pub outcome: ExecutionOutcome<T>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every node has a recorded outcome.
    Completed,
    /// Cancellation was observed before `next_layer` started. Layers before it
    /// fully settled; `not_started` lists every node without an outcome.
    Cancelled {
        next_layer: usize,
        total_layers: usize,
        not_started: Vec<NodeId>,
    },
}

/// Result of a run that passed structural validation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<T> {
    pub layers: Vec<Layer>,
    pub records: BTreeMap<NodeId, NodeRecord<T>>,
    pub status: RunStatus,
    pub duration: Duration,
}

impl<T> RunReport<T> {
    pub fn outcome(&self, node: &NodeId) -> Option<&ExecutionOutcome<T>> {
        self.records.get(node).map(|record| &record.outcome)
    }

    pub fn layer_of(&self, node: &NodeId) -> Option<usize> {
        self.records.get(node).map(|record| record.layer)
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&NodeId, &T)> {
        self.records
            .iter()
            .filter_map(|(node, record)| record.outcome.value().map(|value| (node, value)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &NodeId> {
        self.records
            .iter()
            .filter(|(_, record)| record.outcome.is_failure())
            .map(|(node, _)| node)
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// Turn a cancelled report into [`SchedulerError::Cancelled`].
    pub fn into_result(self) -> Result<Self, SchedulerError> {
        match &self.status {
            RunStatus::Completed => Ok(self),
            RunStatus::Cancelled {
                next_layer,
                total_layers,
                ..
            } => Err(SchedulerError::Cancelled {
                layer: *next_layer,
                total_layers: *total_layers,
            }),
        }
    }
}

/// Transient, per-run state owned by exactly one orchestrator call.
///
/// Outcomes are append-only: the first outcome recorded for a node wins.
pub(crate) struct RunState<T> {
    phase: RunPhase,
    records: BTreeMap<NodeId, NodeRecord<T>>,
    cancel: CancellationToken,
}

impl<T> RunState<T> {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        Self {
            phase: RunPhase::Idle,
            records: BTreeMap::new(),
            cancel,
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> RunPhase {
        self.phase
    }

    pub(crate) fn transition(&mut self, to: RunPhase) {
        PhaseChanged {
            from: &self.phase,
            to: &to,
        }
        .log();
        self.phase = to;
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn outcome(&self, node: &NodeId) -> Option<&ExecutionOutcome<T>> {
        self.records.get(node).map(|record| &record.outcome)
    }

    pub(crate) fn record(&mut self, node: NodeId, layer: usize, outcome: ExecutionOutcome<T>) {
        self.records
            .entry(node)
            .or_insert(NodeRecord { layer, outcome });
    }

    pub(crate) fn into_report(
        self,
        layers: Vec<Layer>,
        status: RunStatus,
        duration: Duration,
    ) -> RunReport<T> {
        RunReport {
            layers,
            records: self.records,
            status,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::outcome::NodeFailure;

    #[test]
    fn test_first_recorded_outcome_wins() {
        let mut state: RunState<u8> = RunState::new(CancellationToken::new());
        let node = NodeId::from("a");

        state.record(node.clone(), 0, ExecutionOutcome::Succeeded(1));
        state.record(node.clone(), 0, ExecutionOutcome::Failed(NodeFailure::error("late")));

        assert_eq!(state.outcome(&node), Some(&ExecutionOutcome::Succeeded(1)));
    }

    #[test]
    fn test_transition_tracks_phase() {
        let mut state: RunState<u8> = RunState::new(CancellationToken::new());
        assert_eq!(state.phase(), RunPhase::Idle);

        state.transition(RunPhase::Validating);
        state.transition(RunPhase::ExecutingLayer(2));

        assert_eq!(state.phase(), RunPhase::ExecutingLayer(2));
        assert_eq!(state.phase().to_string(), "executing_layer(2)");
    }

    #[test]
    fn test_cancelled_report_converts_to_error() {
        let report: RunReport<u8> = RunReport {
            layers: vec![],
            records: BTreeMap::new(),
            status: RunStatus::Cancelled {
                next_layer: 1,
                total_layers: 3,
                not_started: vec![NodeId::from("b")],
            },
            duration: Duration::ZERO,
        };

        assert!(!report.is_complete());
        assert_eq!(
            report.into_result().unwrap_err(),
            SchedulerError::Cancelled {
                layer: 1,
                total_layers: 3
            }
        );
    }
}
