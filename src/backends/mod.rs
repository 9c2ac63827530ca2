// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Node executor backends.
//!
//! The scheduler only sees the [`NodeExecutor`](crate::traits::NodeExecutor) trait;
//! backends supply the actual per-node work.
//!
//! ## Stub Backend
//! [`SimulatedExecutor`](stub::SimulatedExecutor) drives each node from the
//! `simulate` block of a graph definition:
//! - **Delay**: sleeps `delay_ms` to stand in for slow or network-bound work
//! - **Failure injection**: `fail: true` makes the node fail
//! - **Timeout**: `scheduler.node_timeout_ms` bounds every node
//!
//! It backs the command-line runner and the crate's integration tests.
//!
//! # Examples
//!
//! ```rust
//! use the_dag_scheduler::backends::stub::SimulatedExecutor;
//! use the_dag_scheduler::config::SimulateConfig;
//!
//! let executor = SimulatedExecutor::new().with_node(
//!     "fetch",
//!     SimulateConfig { delay_ms: 10, ..Default::default() },
//! );
//! # let _ = executor;
//! ```

pub mod stub;
