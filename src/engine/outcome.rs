// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::graph::NodeId;

/// Why a node has no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The operation returned an error.
    Error,
    /// The operation panicked or its task was lost.
    Panicked,
    /// Not submitted because a predecessor failed (skip policy only).
    Skipped,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error => write!(f, "error"),
            FailureKind::Panicked => write!(f, "panicked"),
            FailureKind::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl NodeFailure {
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Error,
            reason: reason.into(),
        }
    }

    pub fn panicked(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Panicked,
            reason: reason.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Skipped,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

/// Terminal record of one node's execution within one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ExecutionOutcome<T> {
    Succeeded(T),
    Failed(NodeFailure),
}

impl<T> ExecutionOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Succeeded(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ExecutionOutcome::Succeeded(value) => Some(value),
            ExecutionOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&NodeFailure> {
        match self {
            ExecutionOutcome::Succeeded(_) => None,
            ExecutionOutcome::Failed(failure) => Some(failure),
        }
    }
}

impl<T: Clone> ExecutionOutcome<T> {
    /// What a dependent sees for this outcome.
    pub fn as_upstream(&self) -> UpstreamOutput<T> {
        match self {
            ExecutionOutcome::Succeeded(value) => UpstreamOutput::Value(value.clone()),
            ExecutionOutcome::Failed(failure) => UpstreamOutput::NoOutput {
                reason: failure.to_string(),
            },
        }
    }
}

/// A predecessor's contribution to a dependent's inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamOutput<T> {
    Value(T),
    /// Sentinel for a predecessor that produced nothing.
    NoOutput { reason: String },
}

impl<T> UpstreamOutput<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            UpstreamOutput::Value(value) => Some(value),
            UpstreamOutput::NoOutput { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, UpstreamOutput::NoOutput { .. })
    }
}

/// Resolved outputs of a node's direct predecessors, keyed by predecessor id.
pub type NodeInputs<T> = BTreeMap<NodeId, UpstreamOutput<T>>;
