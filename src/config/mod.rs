// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, parse_toml, parse_yaml, GraphConfig, NodeConfig,
    SchedulerOptions, SimulateConfig,
};
pub use runtime::RuntimeBuilder;
pub use validation::validate_graph_config;
