use thiserror::Error;

use crate::{
    config::ConfigError, descriptor::DescriptorError,
    graph::GraphConstructionError, parameters::ParameterLoaderError,
    trunk::TrunkError,
};

#[derive(Debug, Error)]
pub enum ModelBuildError {
    #[error("Invalid model configuration: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Invalid architecture descriptor: {0}")]
    DescriptorError(#[from] DescriptorError),
    #[error("Failed to build trunk: {0}")]
    TrunkError(#[from] TrunkError),
    #[error("Failed to build graph: {0}")]
    GraphConstructionError(#[from] GraphConstructionError),
    #[error("Failed to open weights: {0}")]
    ParameterLoaderError(#[from] ParameterLoaderError),
}
