// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph structures and the structural passes run before any node executes:
//! adjacency construction, cycle detection and topological layering.

pub mod builder;
pub mod cycle;
pub mod layering;
pub mod model;

pub use builder::AdjacencyIndex;
pub use cycle::{detect_cycles, ensure_acyclic};
pub use layering::compute_layers;
pub use model::{Edge, Graph, Layer, NodeId};
