//! Assembly of the complete multi-head classifier.

mod builder;
mod compile;
mod compiled;
mod error;
mod summary;

pub use builder::{INPUT_NAME, build_model};
pub use compile::CompileConfig;
pub use compiled::CompiledModel;
pub use error::ModelBuildError;
pub use summary::{ModelSummary, SummaryRow};
