#[cfg(test)]
#[macro_use]
extern crate is_close;

pub mod backends;

pub mod branch;

pub mod config;

pub mod data_type;
pub use data_type::DataType;

pub mod descriptor;
pub mod graph;
pub mod model;
pub mod operators;
pub mod parameters;
pub mod trunk;

pub use config::{LossKind, ModelConfig, WeightsSource};
pub use descriptor::{ArchitectureDescriptor, Token};
pub use model::{CompiledModel, ModelBuildError, build_model};
