// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::engine::bounded::{BoundedExecutor, TaskFailure};
use crate::engine::outcome::{ExecutionOutcome, NodeFailure, NodeInputs, UpstreamOutput};
use crate::engine::run_state::{PhaseFailure, RunPhase, RunReport, RunState, RunStatus};
use crate::errors::SchedulerError;
use crate::graph::{compute_layers, ensure_acyclic, AdjacencyIndex, Graph, Layer, NodeId};
use crate::observability::messages::engine::{
    LayerCompleted, LayerStarted, LayeringFailed, LayersComputed, NodeFailed, NodeSkipped,
    RunCancelled, RunCompleted, RunStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::NodeExecutor;

/// What to do with a node whose direct predecessor failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamFailurePolicy {
    /// Submit the node anyway; the failed predecessor shows up in its inputs
    /// as [`UpstreamOutput::NoOutput`].
    #[default]
    Execute,
    /// Record the node as skipped without invoking the executor.
    Skip,
}

/// Drives one full pass over a graph: build, validate, layer, then execute
/// layer by layer with bounded concurrency.
///
/// ## Execution Strategy
/// 1. **Validation**: build the [`AdjacencyIndex`] and run cycle detection to
///    completion; any cycle fails the run before a single node executes
/// 2. **Layering**: compute every layer up front with Kahn's algorithm
/// 3. **Layer-by-Layer Execution**: resolve each node's inputs from its direct
///    predecessors' outcomes, hand the layer to the [`BoundedExecutor`], and
///    start the next layer only once every node in this one has an outcome
///
/// ## Failure Handling
/// A node failure is recorded as that node's outcome and never aborts the run.
/// Dependents still execute by default (see [`UpstreamFailurePolicy`]).
///
/// ## Cancellation
/// The token is checked at layer boundaries only. In-flight work always
/// settles, so every submitted node gets an outcome; the report names the
/// layer that never started and the nodes left without one.
///
/// All per-run state lives inside one `run` call, so a single orchestrator can
/// run the same graph concurrently.
pub struct RunOrchestrator<E: NodeExecutor> {
    executor: Arc<E>,
    pool: BoundedExecutor,
    upstream_failure: UpstreamFailurePolicy,
}

impl<E: NodeExecutor> RunOrchestrator<E> {
    /// Create an orchestrator with the specified concurrency limit (clamped to at least 1).
    pub fn new(executor: Arc<E>, max_concurrency: usize) -> Self {
        Self {
            executor,
            pool: BoundedExecutor::new(max_concurrency),
            upstream_failure: UpstreamFailurePolicy::default(),
        }
    }

    pub fn with_upstream_failure(mut self, policy: UpstreamFailurePolicy) -> Self {
        self.upstream_failure = policy;
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.pool.max_concurrency()
    }

    /// Run the graph to completion.
    pub async fn run(&self, graph: &Graph) -> Result<RunReport<E::Output>, SchedulerError> {
        self.run_with_cancellation(graph, CancellationToken::new())
            .await
    }

    /// Run the graph, stopping at the next layer boundary once `cancel` fires.
    ///
    /// Returns `Err` only for structural problems (cycle, layering
    /// inconsistency). A cancelled run returns `Ok` with
    /// [`RunStatus::Cancelled`]; call [`RunReport::into_result`] to treat it
    /// as an error.
    pub async fn run_with_cancellation(
        &self,
        graph: &Graph,
        cancel: CancellationToken,
    ) -> Result<RunReport<E::Output>, SchedulerError> {
        let started = RunStarted {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            max_concurrency: self.pool.max_concurrency(),
        };
        let span = started.span("scheduler_run");

        async move {
            started.log();
            self.drive(graph, cancel).await
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        graph: &Graph,
        cancel: CancellationToken,
    ) -> Result<RunReport<E::Output>, SchedulerError> {
        let clock = Instant::now();
        let mut state: RunState<E::Output> = RunState::new(cancel);

        state.transition(RunPhase::Validating);
        let index = AdjacencyIndex::build(graph);
        if let Err(error) = ensure_acyclic(&index) {
            state.transition(RunPhase::Failed(PhaseFailure::Cyclic));
            return Err(error);
        }

        state.transition(RunPhase::Layering);
        let layers = match compute_layers(&index) {
            Ok(layers) => layers,
            Err(error) => {
                LayeringFailed {
                    reason: &error.to_string(),
                }
                .log();
                state.transition(RunPhase::Failed(PhaseFailure::LayeringInconsistency));
                return Err(error);
            }
        };
        LayersComputed {
            layer_count: layers.len(),
            node_count: index.node_count(),
        }
        .log();

        let predecessors = index.predecessors();
        let total_layers = layers.len();

        for layer_index in 0..total_layers {
            if state.is_cancelled() {
                state.transition(RunPhase::Failed(PhaseFailure::Cancelled));
                let not_started: Vec<NodeId> = layers[layer_index..]
                    .iter()
                    .flat_map(|layer| layer.iter().cloned())
                    .collect();
                RunCancelled {
                    next_layer: layer_index,
                    total_layers,
                    not_started: not_started.len(),
                }
                .log();
                let status = RunStatus::Cancelled {
                    next_layer: layer_index,
                    total_layers,
                    not_started,
                };
                return Ok(state.into_report(layers, status, clock.elapsed()));
            }

            state.transition(RunPhase::ExecutingLayer(layer_index));
            let layer = &layers[layer_index];
            let layer_span = LayerStarted {
                layer: layer_index,
                total_layers,
                node_count: layer.len(),
            }
            .span("layer");

            self.execute_layer(layer_index, total_layers, layer, &predecessors, &mut state)
                .instrument(layer_span)
                .await;
        }

        state.transition(RunPhase::Completed);
        let report = state.into_report(layers, RunStatus::Completed, clock.elapsed());
        RunCompleted {
            node_count: report.records.len(),
            layer_count: report.layers.len(),
            failed_count: report.failed_count(),
            duration: report.duration,
        }
        .log();

        Ok(report)
    }

    /// Execute every node of one layer and record all outcomes.
    async fn execute_layer(
        &self,
        layer_index: usize,
        total_layers: usize,
        layer: &Layer,
        predecessors: &HashMap<NodeId, Vec<NodeId>>,
        state: &mut RunState<E::Output>,
    ) {
        let clock = Instant::now();
        LayerStarted {
            layer: layer_index,
            total_layers,
            node_count: layer.len(),
        }
        .log();

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut pending_inputs: HashMap<NodeId, NodeInputs<E::Output>> = HashMap::new();
        let mut submitted: Vec<NodeId> = Vec::with_capacity(layer.len());

        for node in layer.iter() {
            let inputs = resolve_inputs(node, predecessors, state);

            if self.upstream_failure == UpstreamFailurePolicy::Skip {
                if let Some(failed_upstream) = first_missing(&inputs) {
                    NodeSkipped {
                        node_id: node.as_str(),
                        failed_upstream: failed_upstream.as_str(),
                    }
                    .log();
                    let failure = NodeFailure::skipped(format!(
                        "upstream '{}' produced no output",
                        failed_upstream
                    ));
                    state.record(node.clone(), layer_index, ExecutionOutcome::Failed(failure));
                    failed += 1;
                    continue;
                }
            }

            pending_inputs.insert(node.clone(), inputs);
            submitted.push(node.clone());
        }

        let executor = self.executor.clone();
        let settled = self
            .pool
            .run_all(submitted, |node| {
                let executor = executor.clone();
                let node = node.clone();
                let inputs = pending_inputs.remove(&node).unwrap_or_default();
                async move {
                    executor
                        .execute(&node, inputs)
                        .await
                        .map_err(|error| error.to_string())
                }
            })
            .await;

        for (node, result) in settled {
            let outcome = match result {
                Ok(value) => {
                    succeeded += 1;
                    ExecutionOutcome::Succeeded(value)
                }
                Err(task_failure) => {
                    failed += 1;
                    let failure = match task_failure {
                        TaskFailure::Failed(reason) => NodeFailure::error(reason),
                        TaskFailure::Panicked(reason) => NodeFailure::panicked(reason),
                    };
                    NodeFailed {
                        node_id: node.as_str(),
                        layer: layer_index,
                        reason: &failure.reason,
                    }
                    .log();
                    ExecutionOutcome::Failed(failure)
                }
            };
            state.record(node, layer_index, outcome);
        }

        LayerCompleted {
            layer: layer_index,
            succeeded,
            failed,
            duration: clock.elapsed(),
        }
        .log();
    }
}

/// Build a node's inputs from its direct predecessors' recorded outcomes.
///
/// Layering guarantees every predecessor already settled in an earlier layer;
/// a missing record still resolves to the no-output sentinel rather than
/// panicking.
fn resolve_inputs<T: Clone>(
    node: &NodeId,
    predecessors: &HashMap<NodeId, Vec<NodeId>>,
    state: &RunState<T>,
) -> NodeInputs<T> {
    predecessors
        .get(node)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|parent| {
            let upstream = match state.outcome(parent) {
                Some(outcome) => outcome.as_upstream(),
                None => UpstreamOutput::NoOutput {
                    reason: format!("'{}' has no recorded outcome", parent),
                },
            };
            (parent.clone(), upstream)
        })
        .collect()
}

fn first_missing<T>(inputs: &NodeInputs<T>) -> Option<&NodeId> {
    inputs
        .iter()
        .find(|(_, upstream)| upstream.is_missing())
        .map(|(parent, _)| parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::outcome::FailureKind;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    /// Test executor: echoes its node id plus sorted input summary, fails or
    /// panics for configured nodes, and checks that every predecessor has
    /// finished before a node starts.
    #[derive(Default)]
    struct ScriptedExecutor {
        failing: HashSet<String>,
        panicking: HashSet<String>,
        cancel_on: Option<(String, CancellationToken)>,
        delay: Duration,
        predecessors: HashMap<NodeId, Vec<NodeId>>,
        finished: Mutex<HashSet<NodeId>>,
        calls: Mutex<Vec<NodeId>>,
        inputs_seen: Mutex<HashMap<NodeId, NodeInputs<String>>>,
        order_violations: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl ScriptedExecutor {
        fn for_graph(graph: &Graph) -> Self {
            Self {
                predecessors: AdjacencyIndex::build(graph).predecessors(),
                ..Self::default()
            }
        }

        fn failing(mut self, nodes: &[&str]) -> Self {
            self.failing = nodes.iter().map(|n| n.to_string()).collect();
            self
        }

        fn panicking(mut self, nodes: &[&str]) -> Self {
            self.panicking = nodes.iter().map(|n| n.to_string()).collect();
            self
        }

        fn cancelling_on(mut self, node: &str, token: CancellationToken) -> Self {
            self.cancel_on = Some((node.to_string(), token));
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> Vec<NodeId> {
            self.calls.lock().unwrap().clone()
        }

        fn inputs_of(&self, node: &str) -> NodeInputs<String> {
            self.inputs_seen
                .lock()
                .unwrap()
                .get(&id(node))
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl NodeExecutor for ScriptedExecutor {
        type Output = String;
        type Error = String;

        async fn execute(&self, node: &NodeId, inputs: NodeInputs<String>) -> Result<String, String> {
            {
                let finished = self.finished.lock().unwrap();
                let parents = self.predecessors.get(node).cloned().unwrap_or_default();
                if parents.iter().any(|parent| !finished.contains(parent)) {
                    self.order_violations.fetch_add(1, Ordering::SeqCst);
                }
            }
            self.calls.lock().unwrap().push(node.clone());
            self.inputs_seen
                .lock()
                .unwrap()
                .insert(node.clone(), inputs.clone());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some((trigger, token)) = &self.cancel_on {
                if trigger == node.as_str() {
                    token.cancel();
                }
            }

            self.finished.lock().unwrap().insert(node.clone());

            if self.panicking.contains(node.as_str()) {
                panic!("executor blew up on {}", node);
            }
            if self.failing.contains(node.as_str()) {
                return Err(format!("{} failed", node));
            }

            let upstream: Vec<String> = inputs
                .iter()
                .map(|(parent, value)| match value {
                    UpstreamOutput::Value(v) => format!("{}={}", parent, v),
                    UpstreamOutput::NoOutput { .. } => format!("{}=<none>", parent),
                })
                .collect();
            Ok(format!("{}[{}]", node, upstream.join(",")))
        }
    }

    fn diamond() -> Graph {
        Graph::from_pairs(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        )
    }

    #[tokio::test]
    async fn test_diamond_runs_in_three_layers() {
        let graph = diamond();
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph));
        let orchestrator = RunOrchestrator::new(executor.clone(), 4);

        let report = orchestrator.run(&graph).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.layers.len(), 3);
        assert_eq!(report.layer_of(&id("a")), Some(0));
        assert_eq!(report.layer_of(&id("b")), Some(1));
        assert_eq!(report.layer_of(&id("c")), Some(1));
        assert_eq!(report.layer_of(&id("d")), Some(2));
        assert_eq!(
            report.outcome(&id("d")),
            Some(&ExecutionOutcome::Succeeded(
                "d[b=b[a=a[]],c=c[a=a[]]]".to_string()
            ))
        );
        assert_eq!(executor.order_violations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inputs_contain_only_direct_predecessors() {
        let graph = diamond();
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph));

        RunOrchestrator::new(executor.clone(), 2)
            .run(&graph)
            .await
            .unwrap();

        let inputs = executor.inputs_of("d");
        let parents: Vec<&NodeId> = inputs.keys().collect();
        assert_eq!(parents, vec![&id("b"), &id("c")]);
        assert!(executor.inputs_of("a").is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_siblings_or_dependents() {
        let graph = diamond();
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph).failing(&["b"]));

        let report = RunOrchestrator::new(executor.clone(), 2)
            .run(&graph)
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.records.len(), 4);
        assert!(report.outcome(&id("b")).unwrap().is_failure());
        assert!(report.outcome(&id("c")).unwrap().is_success());
        assert!(report.outcome(&id("d")).unwrap().is_success());
        assert_eq!(report.failed().collect::<Vec<_>>(), vec![&id("b")]);

        let inputs = executor.inputs_of("d");
        assert!(inputs[&id("b")].is_missing());
        assert_eq!(inputs[&id("c")].value(), Some(&"c[a=a[]]".to_string()));
    }

    #[tokio::test]
    async fn test_skip_policy_skips_transitive_dependents() {
        let graph = Graph::from_pairs(
            &["a", "b", "c", "side"],
            &[("a", "b"), ("b", "c")],
        );
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph).failing(&["a"]));

        let report = RunOrchestrator::new(executor.clone(), 2)
            .with_upstream_failure(UpstreamFailurePolicy::Skip)
            .run(&graph)
            .await
            .unwrap();

        let calls: HashSet<NodeId> = executor.calls().into_iter().collect();
        assert_eq!(calls, HashSet::from([id("a"), id("side")]));
        for skipped in ["b", "c"] {
            let failure = report.outcome(&id(skipped)).unwrap().failure().unwrap();
            assert_eq!(failure.kind, FailureKind::Skipped);
        }
        assert!(report.outcome(&id("side")).unwrap().is_success());
    }

    #[tokio::test]
    async fn test_panicking_node_is_recorded_as_failure() {
        let graph = Graph::from_pairs(&["a", "b", "c"], &[("a", "c"), ("b", "c")]);
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph).panicking(&["a"]));

        let report = RunOrchestrator::new(executor, 2).run(&graph).await.unwrap();

        let failure = report.outcome(&id("a")).unwrap().failure().unwrap().clone();
        assert_eq!(failure.kind, FailureKind::Panicked);
        assert!(failure.reason.contains("executor blew up on a"));
        assert!(report.outcome(&id("b")).unwrap().is_success());
        assert!(report.outcome(&id("c")).unwrap().is_success());
    }

    #[tokio::test]
    async fn test_cycle_fails_before_any_execution() {
        let graph = Graph::from_pairs(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
        );
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph));

        let error = RunOrchestrator::new(executor.clone(), 2)
            .run(&graph)
            .await
            .unwrap_err();

        assert_eq!(
            error,
            SchedulerError::CyclicGraph {
                nodes: [id("a"), id("b"), id("c")].into_iter().collect()
            }
        );
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_self_edge_is_reported_as_cycle() {
        let graph = Graph::from_pairs(&["a", "b"], &[("a", "a")]);
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph));

        let error = RunOrchestrator::new(executor, 1).run(&graph).await.unwrap_err();

        match error {
            SchedulerError::CyclicGraph { nodes } => {
                assert_eq!(nodes.into_iter().collect::<Vec<_>>(), vec![id("a")]);
            }
            other => panic!("expected CyclicGraph, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancellation_before_start_runs_nothing() {
        let graph = diamond();
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph));
        let token = CancellationToken::new();
        token.cancel();

        let report = RunOrchestrator::new(executor.clone(), 2)
            .run_with_cancellation(&graph, token)
            .await
            .unwrap();

        assert!(executor.calls().is_empty());
        assert!(report.records.is_empty());
        match &report.status {
            RunStatus::Cancelled {
                next_layer,
                total_layers,
                not_started,
            } => {
                assert_eq!(*next_layer, 0);
                assert_eq!(*total_layers, 3);
                assert_eq!(not_started.len(), 4);
            }
            other => panic!("expected Cancelled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancellation_lets_current_layer_settle() {
        let graph = Graph::from_pairs(
            &["a", "b", "c", "d"],
            &[("a", "c"), ("b", "c"), ("c", "d")],
        );
        let token = CancellationToken::new();
        let executor = Arc::new(
            ScriptedExecutor::for_graph(&graph)
                .cancelling_on("a", token.clone())
                .with_delay(Duration::from_millis(5)),
        );

        let report = RunOrchestrator::new(executor.clone(), 1)
            .run_with_cancellation(&graph, token)
            .await
            .unwrap();

        // layer 0 finished both nodes even though "a" cancelled mid-layer
        assert!(report.outcome(&id("a")).unwrap().is_success());
        assert!(report.outcome(&id("b")).unwrap().is_success());
        assert!(report.outcome(&id("c")).is_none());
        assert_eq!(executor.calls().len(), 2);

        match &report.status {
            RunStatus::Cancelled {
                next_layer,
                not_started,
                ..
            } => {
                assert_eq!(*next_layer, 1);
                assert_eq!(not_started, &vec![id("c"), id("d")]);
            }
            other => panic!("expected Cancelled, got {:?}", other),
        }
        assert_eq!(
            report.into_result().unwrap_err(),
            SchedulerError::Cancelled {
                layer: 1,
                total_layers: 3
            }
        );
    }

    #[tokio::test]
    async fn test_layer_respects_concurrency_limit() {
        let names: Vec<String> = (0..10).map(|i| format!("n{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let graph = Graph::from_pairs(&refs, &[]);
        let executor = Arc::new(
            ScriptedExecutor::for_graph(&graph)
                .failing(&["n3", "n7"])
                .with_delay(Duration::from_millis(10)),
        );

        let report = RunOrchestrator::new(executor.clone(), 3)
            .run(&graph)
            .await
            .unwrap();

        assert_eq!(report.records.len(), 10);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(executor.peak_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stray_edges_do_not_break_the_run() {
        let graph = Graph::from_pairs(&["a", "b"], &[("a", "b"), ("a", "missing"), ("ghost", "b")]);
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph));

        let report = RunOrchestrator::new(executor, 2).run(&graph).await.unwrap();

        assert_eq!(report.layers.len(), 2);
        assert_eq!(report.records.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_runs_of_same_graph_are_independent() {
        let graph = diamond();
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph).with_delay(Duration::from_millis(2)));
        let orchestrator = RunOrchestrator::new(executor.clone(), 2);

        let (first, second) = tokio::join!(orchestrator.run(&graph), orchestrator.run(&graph));
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(first.records.len(), 4);
        assert_eq!(second.records.len(), 4);
        assert_eq!(first.outcome(&id("d")), second.outcome(&id("d")));
        assert_eq!(executor.calls().len(), 8);
    }

    #[tokio::test]
    async fn test_empty_graph_completes_immediately() {
        let graph = Graph::default();
        let executor = Arc::new(ScriptedExecutor::for_graph(&graph));

        let report = RunOrchestrator::new(executor, 2).run(&graph).await.unwrap();

        assert!(report.is_complete());
        assert!(report.layers.is_empty());
        assert!(report.records.is_empty());
    }
}
