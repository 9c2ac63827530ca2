// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout the scheduler. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep field names consistent between the human-readable text and structured fields
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - run lifecycle, layering and per-layer execution events
//! * `messages::validation` - graph construction and configuration validation events
//!
//! # Usage
//!
//! ```rust
//! use the_dag_scheduler::observability::messages::engine::NodeFailed;
//! use the_dag_scheduler::observability::messages::StructuredLog;
//!
//! let msg = NodeFailed {
//!     node_id: "summarize",
//!     layer: 1,
//!     reason: "upstream model timed out",
//! };
//!
//! msg.log();
//! ```

pub mod messages;

/// Install the default `tracing` subscriber: fmt output filtered by `RUST_LOG`,
/// falling back to `default_directive` when the variable is unset or invalid.
///
/// Log lines go to stderr so stdout carries only the run report. Colour codes
/// are emitted only when stderr is a terminal.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing(default_directive: &str) {
    use std::io::IsTerminal;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}
