// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph construction and configuration validation.
//!
//! This module contains message types for logging events related to:
//! * Edges dropped during adjacency construction
//! * Duplicate node ID detection
//! * Unresolved dependency detection

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Edge referencing a node outside the node list was dropped.
///
/// # Log Level
/// `debug!` - The caller owns graph consistency; this is diagnostic only
///
/// # Example
/// ```
/// use the_dag_scheduler::observability::messages::validation::StrayEdgeIgnored;
///
/// let msg = StrayEdgeIgnored {
///     source: "fetch",
///     target: "deleted_node",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct StrayEdgeIgnored<'a> {
    pub source: &'a str,
    pub target: &'a str,
}

impl Display for StrayEdgeIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring edge '{}' -> '{}': endpoint is not in the node list",
            self.source, self.target
        )
    }
}

impl StructuredLog for StrayEdgeIgnored<'_> {
    fn log(&self) {
        tracing::debug!(
            edge_source = self.source,
            edge_target = self.target,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stray_edge_ignored",
            span_name = name,
            edge_source = self.source,
            edge_target = self.target,
        )
    }
}

/// Duplicate node ID detected in a graph definition.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct DuplicateNodeId<'a> {
    pub node_id: &'a str,
}

impl Display for DuplicateNodeId<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Duplicate node ID: '{}'", self.node_id)
    }
}

impl StructuredLog for DuplicateNodeId<'_> {
    fn log(&self) {
        tracing::error!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "duplicate_node_id",
            span_name = name,
            node_id = self.node_id,
        )
    }
}

/// Unresolved dependency detected in a graph definition.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_dag_scheduler::observability::messages::validation::UnresolvedDependency;
///
/// let msg = UnresolvedDependency {
///     node_id: "summarize",
///     missing_dependency: "fetch",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct UnresolvedDependency<'a> {
    pub node_id: &'a str,
    pub missing_dependency: &'a str,
}

impl Display for UnresolvedDependency<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' depends on missing node '{}'",
            self.node_id, self.missing_dependency
        )
    }
}

impl StructuredLog for UnresolvedDependency<'_> {
    fn log(&self) {
        tracing::error!(
            node_id = self.node_id,
            missing_dependency = self.missing_dependency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "unresolved_dependency",
            span_name = name,
            node_id = self.node_id,
            missing_dependency = self.missing_dependency,
        )
    }
}
