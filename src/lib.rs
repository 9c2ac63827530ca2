// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // node executor backends
pub mod config;     // graph definitions + runtime wiring
pub mod engine;     // bounded executor + run orchestrator
pub mod errors;     // error handling
pub mod graph;      // adjacency, cycles, layering
pub mod observability;
pub mod traits;     // node executor seam

pub use engine::{RunOrchestrator, RunReport, UpstreamFailurePolicy};
pub use errors::SchedulerError;
pub use graph::{Edge, Graph, Layer, NodeId};
pub use traits::NodeExecutor;
