//! Configuration validation for graph definitions.
//!
//! Validation runs before a graph ever reaches the scheduler and rejects
//! definitions that cannot be turned into a meaningful [`Graph`](crate::graph::Graph):
//!
//! 1. **Uniqueness**: every node ID appears once
//! 2. **References**: every `depends_on` entry names a defined node
//! 3. **Scheduler options**: `max_concurrency`, when given, is at least 1
//!
//! All errors are accumulated so a definition can be fixed in one pass.
//!
//! Cycles are deliberately not checked here. The scheduler detects them as part of
//! every run and reports the full set of participating nodes, so there is a single
//! source of truth for acyclicity.
//!
//! # Examples
//!
//! ```rust
//! use the_dag_scheduler::config::{parse_yaml, validate_graph_config};
//! use the_dag_scheduler::errors::ValidationError;
//!
//! let config = parse_yaml(
//!     r#"
//! nodes:
//!   - id: summarize
//!     depends_on: [fetch]
//! "#,
//! )
//! .unwrap();
//!
//! let errors = validate_graph_config(&config).unwrap_err();
//! assert_eq!(
//!     errors,
//!     vec![ValidationError::UnresolvedDependency {
//!         node_id: "summarize".to_string(),
//!         missing_dependency: "fetch".to_string(),
//!     }]
//! );
//! ```

use std::collections::HashSet;

use crate::config::GraphConfig;
use crate::errors::ValidationError;
use crate::observability::messages::validation::{DuplicateNodeId, UnresolvedDependency};
use crate::observability::messages::StructuredLog;

/// Validates a graph definition for structural integrity.
///
/// # Returns
///
/// * `Ok(())` - The definition is ready to be scheduled
/// * `Err(Vec<ValidationError>)` - Every problem found, in discovery order
pub fn validate_graph_config(config: &GraphConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_node_ids(config) {
        errors.extend(duplicate_errors);
    }

    if let Err(unresolved_errors) = validate_dependency_references(config) {
        errors.extend(unresolved_errors);
    }

    if config.scheduler.max_concurrency == Some(0) {
        errors.push(ValidationError::ZeroConcurrency);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Node IDs key outputs and dependency references, so they must be unique.
fn validate_unique_node_ids(config: &GraphConfig) -> Result<(), Vec<ValidationError>> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for node in &config.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            DuplicateNodeId { node_id: &node.id }.log();
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Every `depends_on` entry must name a defined node.
///
/// The scheduler itself tolerates stray edges by dropping them; in a
/// definition file a dangling reference is almost always a typo.
fn validate_dependency_references(config: &GraphConfig) -> Result<(), Vec<ValidationError>> {
    let node_ids: HashSet<&str> = config.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut errors = Vec::new();

    for node in &config.nodes {
        for dependency in &node.depends_on {
            if !node_ids.contains(dependency.as_str()) {
                UnresolvedDependency {
                    node_id: &node.id,
                    missing_dependency: dependency,
                }
                .log();
                errors.push(ValidationError::UnresolvedDependency {
                    node_id: node.id.clone(),
                    missing_dependency: dependency.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
