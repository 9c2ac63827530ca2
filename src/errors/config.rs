// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for loading and validating graph definition files.

use std::path::PathBuf;

use thiserror::Error;

/// Structural problems in a graph definition that make it unfit to load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Two nodes share the same id
    #[error("Duplicate node ID: '{node_id}'")]
    DuplicateNodeId { node_id: String },

    /// A node depends on an id that is not defined
    #[error("Node '{node_id}' depends on '{missing_dependency}' which does not exist")]
    UnresolvedDependency {
        node_id: String,
        missing_dependency: String,
    },

    /// `max_concurrency` must allow at least one operation in flight
    #[error("scheduler.max_concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Errors that can occur while reading a graph definition.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML graph definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML graph definition: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported graph definition format '{extension}' (expected yaml, yml or toml)")]
    UnsupportedFormat { extension: String },

    #[error("Configuration validation failed:\n{}", render(.0))]
    Invalid(Vec<ValidationError>),
}

fn render(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
