// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] for emitting the same event with typed fields.
//!
//! # Organization
//!
//! * `engine` - run lifecycle, layering and per-layer execution events
//! * `validation` - graph construction and configuration validation events
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_dag_scheduler::observability::messages::engine::RunStarted;
//! use the_dag_scheduler::observability::messages::StructuredLog;
//!
//! let msg = RunStarted {
//!     node_count: 5,
//!     edge_count: 4,
//!     max_concurrency: 2,
//! };
//!
//! let span = msg.span("demo");
//! let _guard = span.enter();
//! msg.log();
//! ```

use tracing::Span;

pub mod engine;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog: std::fmt::Display {
    /// Emit the message as a `tracing` event at its designated level.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
