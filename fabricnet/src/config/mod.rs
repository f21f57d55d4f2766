mod common;
mod error;
mod loss;
mod metric;
mod model;
mod optimizer;
mod weights;

pub use common::OutputActivation;
pub use error::ConfigError;
pub use loss::LossKind;
pub use metric::Metric;
pub use model::{
    DEFAULT_FLOWS, DEFAULT_LEARNING_RATE, DEFAULT_SEED, MAX_FLOWS, ModelConfig,
};
pub use optimizer::OptimizerConfig;
pub use weights::WeightsSource;
