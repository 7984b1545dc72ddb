// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_graph;
mod entry_points;
mod loader;
mod node;
mod processor_map;
mod processor_registry;
mod runtime;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use dependency_graph::DependencyGraph;
pub use entry_points::EntryPoints;
pub use loader::{
    load_and_validate_config, load_config, OutputConfig, PipelineConfig, ProcessorStep, RunOptions,
};
pub use node::{NodeConfig, NodeRole};
pub use processor_map::ProcessorMap;
pub use processor_registry::{ProcessorFactory, ProcessorRegistry};
pub use runtime::{PipelineRuntime, RuntimeBuilder};
pub use validation::{validate_node_configs, ResolvedGraph};
