// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::{GraphConfig, SimulateConfig};
use crate::engine::outcome::{NodeInputs, UpstreamOutput};
use crate::graph::NodeId;
use crate::traits::NodeExecutor;

/// Why a simulated node failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("simulated failure for node '{0}'")]
    Injected(String),

    #[error("node '{node_id}' timed out after {timeout_ms}ms")]
    TimedOut { node_id: String, timeout_ms: u64 },
}

/// A node executor that stands in for real work, driven by each node's
/// `simulate` block.
///
/// Every node sleeps for `delay_ms`, then either fails (`fail: true`) or
/// returns a JSON document echoing its configured output and the values it
/// received from its predecessors:
///
/// ```json
/// { "node": "d", "output": null, "inputs": { "b": {...}, "c": null } }
/// ```
///
/// A predecessor that produced nothing shows up as `null` in `inputs`.
/// Nodes with no `simulate` block complete immediately.
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecutor {
    behaviours: HashMap<NodeId, SimulateConfig>,
    timeout: Option<Duration>,
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an executor from every node's `simulate` block and the
    /// scheduler's `node_timeout_ms`.
    pub fn from_config(cfg: &GraphConfig) -> Self {
        let behaviours = cfg
            .nodes
            .iter()
            .map(|node| (NodeId::from(node.id.as_str()), node.simulate.clone()))
            .collect();

        Self {
            behaviours,
            timeout: cfg.scheduler.node_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn with_node(mut self, id: impl Into<NodeId>, behaviour: SimulateConfig) -> Self {
        self.behaviours.insert(id.into(), behaviour);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn simulate(
        behaviour: SimulateConfig,
        node: &NodeId,
        inputs: NodeInputs<Value>,
    ) -> Result<Value, SimulationError> {
        if behaviour.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(behaviour.delay_ms)).await;
        }

        if behaviour.fail {
            return Err(SimulationError::Injected(node.to_string()));
        }

        let inputs: Map<String, Value> = inputs
            .into_iter()
            .map(|(predecessor, upstream)| {
                let value = match upstream {
                    UpstreamOutput::Value(value) => value,
                    UpstreamOutput::NoOutput { .. } => Value::Null,
                };
                (predecessor.to_string(), value)
            })
            .collect();

        Ok(json!({
            "node": node.as_str(),
            "output": behaviour.output.unwrap_or(Value::Null),
            "inputs": inputs,
        }))
    }
}

#[async_trait]
impl NodeExecutor for SimulatedExecutor {
    type Output = Value;
    type Error = SimulationError;

    async fn execute(
        &self,
        node: &NodeId,
        inputs: NodeInputs<Value>,
    ) -> Result<Value, SimulationError> {
        let behaviour = self.behaviours.get(node).cloned().unwrap_or_default();
        let work = Self::simulate(behaviour, node, inputs);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| SimulationError::TimedOut {
                    node_id: node.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                })?,
            None => work.await,
        }
    }
}
