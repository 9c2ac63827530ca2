// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for scheduler run lifecycle and execution events.
//!
//! This module contains message types for logging events related to:
//! * Run lifecycle (start, completion, cancellation) and phase transitions
//! * Cycle detection and topological layering
//! * Per-layer execution and per-node failures

use crate::engine::RunPhase;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Run started over a freshly built graph.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_dag_scheduler::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     node_count: 5,
///     edge_count: 4,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted {
    pub node_count: usize,
    pub edge_count: usize,
    pub max_concurrency: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting scheduler run: {} nodes, {} edges, max_concurrency={}",
            self.node_count, self.edge_count, self.max_concurrency
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            edge_count = self.edge_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            node_count = self.node_count,
            edge_count = self.edge_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Orchestrator moved between run phases.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct PhaseChanged<'a> {
    pub from: &'a RunPhase,
    pub to: &'a RunPhase,
}

impl Display for PhaseChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Run phase {} -> {}", self.from, self.to)
    }
}

impl StructuredLog for PhaseChanged<'_> {
    fn log(&self) {
        tracing::debug!(from = %self.from, to = %self.to, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "phase_changed",
            span_name = name,
            from = %self.from,
            to = %self.to,
        )
    }
}

/// Cycle detection found one or more cycles.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_dag_scheduler::observability::messages::engine::CycleDetected;
///
/// let nodes = vec!["a", "b", "c"];
/// let msg = CycleDetected { nodes: &nodes };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CycleDetected<'a> {
    pub nodes: &'a [&'a str],
}

impl Display for CycleDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cycle detected among {} nodes: {}",
            self.nodes.len(),
            self.nodes.join(", ")
        )
    }
}

impl StructuredLog for CycleDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle_nodes = %self.nodes.join(", "),
            cycle_size = self.nodes.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "cycle_detected",
            span_name = name,
            cycle_nodes = %self.nodes.join(", "),
            cycle_size = self.nodes.len(),
        )
    }
}

/// Layer computation completed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_dag_scheduler::observability::messages::engine::LayersComputed;
///
/// let msg = LayersComputed {
///     layer_count: 3,
///     node_count: 7,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct LayersComputed {
    pub layer_count: usize,
    pub node_count: usize,
}

impl Display for LayersComputed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Computed {} layers for {} nodes",
            self.layer_count, self.node_count
        )
    }
}

impl StructuredLog for LayersComputed {
    fn log(&self) {
        tracing::info!(
            layer_count = self.layer_count,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "layers_computed",
            span_name = name,
            layer_count = self.layer_count,
            node_count = self.node_count,
        )
    }
}

/// Layering emitted fewer nodes than the graph holds.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct LayeringFailed<'a> {
    pub reason: &'a str,
}

impl Display for LayeringFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Topological layering failed: {}", self.reason)
    }
}

impl StructuredLog for LayeringFailed<'_> {
    fn log(&self) {
        tracing::error!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("layering_failed", span_name = name, reason = self.reason)
    }
}

/// A layer was handed to the bounded executor.
///
/// # Log Level
/// `info!` - Important operational event
pub struct LayerStarted {
    pub layer: usize,
    pub total_layers: usize,
    pub node_count: usize,
}

impl Display for LayerStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing layer {}/{} with {} nodes",
            self.layer + 1,
            self.total_layers,
            self.node_count
        )
    }
}

impl StructuredLog for LayerStarted {
    fn log(&self) {
        tracing::info!(
            layer = self.layer,
            total_layers = self.total_layers,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "layer",
            span_name = name,
            layer = self.layer,
            total_layers = self.total_layers,
            node_count = self.node_count,
        )
    }
}

/// Every node in a layer has a recorded outcome.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_dag_scheduler::observability::messages::engine::LayerCompleted;
/// use std::time::Duration;
///
/// let msg = LayerCompleted {
///     layer: 0,
///     succeeded: 3,
///     failed: 1,
///     duration: Duration::from_millis(120),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct LayerCompleted {
    pub layer: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl Display for LayerCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Layer {} settled: {} succeeded, {} failed in {:?}",
            self.layer, self.succeeded, self.failed, self.duration
        )
    }
}

impl StructuredLog for LayerCompleted {
    fn log(&self) {
        tracing::info!(
            layer = self.layer,
            succeeded = self.succeeded,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "layer_completed",
            span_name = name,
            layer = self.layer,
            succeeded = self.succeeded,
            failed = self.failed,
            duration = ?self.duration,
        )
    }
}

/// A node's operation failed; recorded as its outcome, the run continues.
///
/// # Log Level
/// `warn!` - Contained failure
pub struct NodeFailed<'a> {
    pub node_id: &'a str,
    pub layer: usize,
    pub reason: &'a str,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' in layer {} failed: {}",
            self.node_id, self.layer, self.reason
        )
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            layer = self.layer,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "node_failed",
            span_name = name,
            node_id = self.node_id,
            layer = self.layer,
            reason = self.reason,
        )
    }
}

/// A node was not submitted because a predecessor failed and the run is
/// configured to skip such dependents.
///
/// # Log Level
/// `warn!` - Contained failure
pub struct NodeSkipped<'a> {
    pub node_id: &'a str,
    pub failed_upstream: &'a str,
}

impl Display for NodeSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Skipping node '{}': upstream '{}' failed",
            self.node_id, self.failed_upstream
        )
    }
}

impl StructuredLog for NodeSkipped<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            failed_upstream = self.failed_upstream,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "node_skipped",
            span_name = name,
            node_id = self.node_id,
            failed_upstream = self.failed_upstream,
        )
    }
}

/// Run completed with an outcome for every node.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted {
    pub node_count: usize,
    pub layer_count: usize,
    pub failed_count: usize,
    pub duration: Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Scheduler run completed: {} nodes across {} layers ({} failed) in {:?}",
            self.node_count, self.layer_count, self.failed_count, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            layer_count = self.layer_count,
            failed_count = self.failed_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            node_count = self.node_count,
            layer_count = self.layer_count,
            failed_count = self.failed_count,
            duration = ?self.duration,
        )
    }
}

/// Cancellation observed at a layer boundary.
///
/// # Log Level
/// `warn!` - Run stopped early on request
pub struct RunCancelled {
    pub next_layer: usize,
    pub total_layers: usize,
    pub not_started: usize,
}

impl Display for RunCancelled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Scheduler run cancelled before layer {} of {}: {} nodes not started",
            self.next_layer, self.total_layers, self.not_started
        )
    }
}

impl StructuredLog for RunCancelled {
    fn log(&self) {
        tracing::warn!(
            next_layer = self.next_layer,
            total_layers = self.total_layers,
            not_started = self.not_started,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "run_cancelled",
            span_name = name,
            next_layer = self.next_layer,
            total_layers = self.total_layers,
            not_started = self.not_started,
        )
    }
}
