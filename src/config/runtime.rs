// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::stub::SimulatedExecutor;
use crate::config::GraphConfig;
use crate::engine::RunOrchestrator;
use crate::graph::Graph;

/// Scheduler runtime builder - wires a graph definition into a ready-to-run
/// orchestrator.
///
/// The `RuntimeBuilder` pairs the scheduler's [`Graph`] with a
/// [`RunOrchestrator`] backed by the [`SimulatedExecutor`], configured with the
/// definition's concurrency limit and upstream-failure policy.
///
/// # Examples
///
/// ```
/// use the_dag_scheduler::config::{parse_yaml, RuntimeBuilder};
///
/// let config = parse_yaml(
///     r#"
/// scheduler:
///   max_concurrency: 2
/// nodes:
///   - id: a
///   - id: b
///     depends_on: [a]
/// "#,
/// )
/// .unwrap();
///
/// let (orchestrator, graph) = RuntimeBuilder::from_config(&config);
///
/// assert_eq!(orchestrator.max_concurrency(), 2);
/// assert_eq!(graph.node_count(), 2);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the orchestrator and graph for a (validated) definition.
    pub fn from_config(cfg: &GraphConfig) -> (RunOrchestrator<SimulatedExecutor>, Graph) {
        let executor = Arc::new(SimulatedExecutor::from_config(cfg));
        let orchestrator =
            RunOrchestrator::new(executor, cfg.scheduler.resolved_max_concurrency())
                .with_upstream_failure(cfg.scheduler.upstream_failure);
        (orchestrator, cfg.to_graph())
    }
}
