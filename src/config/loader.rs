// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::{BoundedExecutor, UpstreamFailurePolicy};
use crate::errors::ConfigError;
use crate::graph::{Edge, Graph, NodeId};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure for a scheduler run.
///
/// This struct represents a complete graph definition: scheduler options plus
/// every node and the nodes it depends on. It is typically loaded from a YAML
/// or TOML file.
///
/// # Fields
/// * `scheduler` - Concurrency and failure-handling options (optional)
/// * `nodes` - Node definitions; each node lists the nodes it depends on
///
/// # Example
/// ```yaml
/// scheduler:
///   max_concurrency: 4
///   upstream_failure: execute
///   node_timeout_ms: 5000
/// nodes:
///   - id: fetch
///     simulate:
///       delay_ms: 20
///   - id: summarize
///     depends_on: [fetch]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub scheduler: SchedulerOptions,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

/// Scheduler options.
///
/// # Fields
/// * `max_concurrency` - Maximum in-flight node operations per layer (defaults to CPU count)
/// * `upstream_failure` - What to do with a node whose predecessor failed (defaults to `execute`)
/// * `node_timeout_ms` - Per-node time limit, enforced by the node executor (optional)
#[derive(Debug, Default, Deserialize)]
pub struct SchedulerOptions {
    pub max_concurrency: Option<usize>,
    #[serde(default)]
    pub upstream_failure: UpstreamFailurePolicy,
    pub node_timeout_ms: Option<u64>,
}

impl SchedulerOptions {
    /// Configured concurrency, or the number of available CPU cores.
    pub fn resolved_max_concurrency(&self) -> usize {
        self.max_concurrency
            .unwrap_or_else(|| BoundedExecutor::with_available_parallelism().max_concurrency())
    }
}

/// Configuration for a single node in the graph.
///
/// # Fields
/// * `id` - Unique identifier for this node
/// * `depends_on` - IDs of the nodes that must complete before this one starts
/// * `simulate` - Behaviour of the built-in simulated executor for this node
///
/// # Example
/// ```yaml
/// id: "summarize"
/// depends_on: ["fetch", "classify"]
/// simulate:
///   delay_ms: 150
///   output: "three bullet points"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    #[serde(default)]
    pub depends_on: Vec<String>, // defaults empty
    #[serde(default)]
    pub simulate: SimulateConfig,
}

/// How the simulated executor behaves for one node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulateConfig {
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub fail: bool,
    pub output: Option<serde_json::Value>,
}

impl GraphConfig {
    /// Build the scheduler's [`Graph`]: one edge per `depends_on` entry,
    /// pointing from the dependency to the dependent.
    pub fn to_graph(&self) -> Graph {
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeId::from(node.id.as_str()))
            .collect();
        let edges = self
            .nodes
            .iter()
            .flat_map(|node| {
                node.depends_on
                    .iter()
                    .map(move |dependency| Edge::new(dependency.as_str(), node.id.as_str()))
            })
            .collect();
        Graph::new(nodes, edges)
    }
}

/// Load a graph definition, choosing the parser by file extension
/// (`.yaml`/`.yml` or `.toml`).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GraphConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => parse_yaml(&content),
        "toml" => parse_toml(&content),
        _ => Err(ConfigError::UnsupportedFormat { extension }),
    }
}

pub fn parse_yaml(content: &str) -> Result<GraphConfig, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn parse_toml(content: &str) -> Result<GraphConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load and validate a graph definition.
///
/// Rejects duplicate node IDs, dependencies on undefined nodes and a zero
/// concurrency limit. Cycles are left to the scheduler, which reports the
/// exact set of nodes involved.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<GraphConfig, ConfigError> {
    let cfg = load_config(path)?;

    if let Err(validation_errors) = crate::config::validate_graph_config(&cfg) {
        return Err(ConfigError::Invalid(validation_errors));
    }

    Ok(cfg)
}
